use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{ResourceType, VariantNum};

/// Named free-form payload attached to an equipment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExtensionResource {
    pub owner_id: String,
    pub owner_type: ResourceType,
    pub variant_num: VariantNum,
    pub name: String,
    pub attributes: JsonValue,
}

impl ExtensionResource {
    pub fn new(
        owner_id: impl Into<String>,
        owner_type: ResourceType,
        variant_num: VariantNum,
        name: impl Into<String>,
        attributes: JsonValue,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_type,
            variant_num,
            name: name.into(),
            attributes,
        }
    }
}
