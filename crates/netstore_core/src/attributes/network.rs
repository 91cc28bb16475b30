use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Aliases, Properties};
use crate::mapping::{TableMapping, identifiable_columns};
use crate::{INITIAL_VARIANT_ID, INITIAL_VARIANT_NUM, ResourceType, VariantNum};

/// Per-variant network row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkAttributes {
    pub uuid: Uuid,
    pub variant_id: String,
    /// Equal to the variant number for full variants.
    pub full_variant_num: VariantNum,
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub case_date: Option<String>,
    pub forecast_distance: i32,
    pub source_format: Option<String>,
}

impl Default for NetworkAttributes {
    fn default() -> Self {
        Self {
            uuid: Uuid::nil(),
            variant_id: INITIAL_VARIANT_ID.to_string(),
            full_variant_num: INITIAL_VARIANT_NUM,
            name: None,
            fictitious: false,
            properties: Properties::new(),
            aliases: Aliases::new(),
            case_date: None,
            forecast_distance: 0,
            source_format: None,
        }
    }
}

impl NetworkAttributes {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            ..Self::default()
        }
    }

    /// Inline columns of the network table. `uuid` and the variant number are key
    /// columns handled by the store.
    pub fn mapping() -> &'static TableMapping<NetworkAttributes> {
        static MAPPING: Lazy<TableMapping<NetworkAttributes>> = Lazy::new(|| {
            identifiable_columns!(TableMapping::<NetworkAttributes>::builder(
                "network",
                ResourceType::Network
            ))
            .str(
                "variant_id",
                |a| a.variant_id.as_str(),
                |a, v| a.variant_id = v,
            )
            .i32(
                "full_variant_num",
                |a| a.full_variant_num,
                |a, v| a.full_variant_num = v,
            )
            .opt_str(
                "case_date",
                |a| a.case_date.as_deref(),
                |a, v| a.case_date = v,
            )
            .i32(
                "forecast_distance",
                |a| a.forecast_distance,
                |a, v| a.forecast_distance = v,
            )
            .opt_str(
                "source_format",
                |a| a.source_format.as_deref(),
                |a, v| a.source_format = v,
            )
            .build()
        });
        &MAPPING
    }
}
