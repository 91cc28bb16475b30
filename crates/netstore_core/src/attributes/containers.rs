use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Aliases, IdentifiableAttributes, Properties, mapped_family};
use crate::external::{AreaBoundaryAttributes, ExternalAttributeKind, ExternalAttributes};
use crate::mapping::{TableMapping, identifiable_columns};
use crate::{NetstoreResult, ResourceType};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SubstationAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub country: Option<String>,
    pub tso: Option<String>,
    pub geographical_tags: BTreeSet<String>,
}

fn substation_mapping() -> TableMapping<SubstationAttributes> {
    identifiable_columns!(TableMapping::<SubstationAttributes>::builder(
        "substation",
        ResourceType::Substation
    ))
    .opt_str("country", |a| a.country.as_deref(), |a, v| a.country = v)
    .opt_str("tso", |a| a.tso.as_deref(), |a, v| a.tso = v)
    .json(
        "geographical_tags",
        |a| &a.geographical_tags,
        |a, v| a.geographical_tags = v,
    )
    .build()
}

impl IdentifiableAttributes for SubstationAttributes {
    mapped_family!(
        SubstationAttributes,
        ResourceType::Substation,
        substation_mapping
    );
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VoltageLevelAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub substation_id: Option<String>,
    pub nominal_v: f64,
    pub low_voltage_limit: f64,
    pub high_voltage_limit: f64,
    pub topology_kind: Option<String>,
}

fn voltage_level_mapping() -> TableMapping<VoltageLevelAttributes> {
    identifiable_columns!(TableMapping::<VoltageLevelAttributes>::builder(
        "voltage_level",
        ResourceType::VoltageLevel
    ))
    .container("substation_id")
    .opt_str(
        "substation_id",
        |a| a.substation_id.as_deref(),
        |a, v| a.substation_id = v,
    )
    .f64("nominal_v", |a| a.nominal_v, |a, v| a.nominal_v = v)
    .f64(
        "low_voltage_limit",
        |a| a.low_voltage_limit,
        |a, v| a.low_voltage_limit = v,
    )
    .f64(
        "high_voltage_limit",
        |a| a.high_voltage_limit,
        |a, v| a.high_voltage_limit = v,
    )
    .opt_str(
        "topology_kind",
        |a| a.topology_kind.as_deref(),
        |a, v| a.topology_kind = v,
    )
    .build()
}

impl IdentifiableAttributes for VoltageLevelAttributes {
    mapped_family!(
        VoltageLevelAttributes,
        ResourceType::VoltageLevel,
        voltage_level_mapping
    );
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub area_type: Option<String>,
    pub interchange_target: Option<f64>,
    pub voltage_level_ids: BTreeSet<String>,
    pub area_boundaries: Vec<AreaBoundaryAttributes>,
}

fn area_mapping() -> TableMapping<AreaAttributes> {
    identifiable_columns!(TableMapping::<AreaAttributes>::builder(
        "area",
        ResourceType::Area
    ))
    .opt_str(
        "area_type",
        |a| a.area_type.as_deref(),
        |a, v| a.area_type = v,
    )
    .opt_f64(
        "interchange_target",
        |a| a.interchange_target,
        |a, v| a.interchange_target = v,
    )
    .json(
        "voltage_level_ids",
        |a| &a.voltage_level_ids,
        |a, v| a.voltage_level_ids = v,
    )
    .build()
}

impl IdentifiableAttributes for AreaAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = &[ExternalAttributeKind::AreaBoundary];

    mapped_family!(AreaAttributes, ResourceType::Area, area_mapping);

    fn external_attributes(&self) -> ExternalAttributes {
        ExternalAttributes {
            area_boundaries: self.area_boundaries.clone(),
            ..ExternalAttributes::default()
        }
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        self.area_boundaries = external.area_boundaries;
        Ok(())
    }
}
