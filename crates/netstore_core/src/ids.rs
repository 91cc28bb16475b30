use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{RegulatingTapChangerType, ResourceType};

pub type VariantNum = i32;

pub const INITIAL_VARIANT_NUM: VariantNum = 0;
pub const INITIAL_VARIANT_ID: &str = "InitialState";

/// Composite key of the equipment that owns a set of external attributes.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub network_uuid: Uuid,
    pub variant_num: VariantNum,
    pub equipment_id: String,
    pub equipment_type: ResourceType,
}

impl OwnerInfo {
    pub fn new(
        network_uuid: Uuid,
        variant_num: VariantNum,
        equipment_id: impl Into<String>,
        equipment_type: ResourceType,
    ) -> Self {
        Self {
            network_uuid,
            variant_num,
            equipment_id: equipment_id.into(),
            equipment_type,
        }
    }
}

/// Regulating points are keyed per owner and per tap changer of that owner.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegulatingOwnerInfo {
    pub owner: OwnerInfo,
    pub tap_changer_type: RegulatingTapChangerType,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExtensionOwnerInfo {
    pub owner: OwnerInfo,
    pub name: String,
}

/// Keys of rows that belong to an owning equipment, as seen by the variant engine.
///
/// `owner_id` is matched against tombstones, `shadow_key` decides which inherited
/// entries an entry of the variant itself replaces.
pub trait OwnerKeyed: Ord + Clone {
    fn owner_id(&self) -> &str;

    fn shadow_key(&self) -> String {
        self.owner_id().to_string()
    }

    fn with_variant(self, variant_num: VariantNum) -> Self;
}

impl OwnerKeyed for OwnerInfo {
    fn owner_id(&self) -> &str {
        &self.equipment_id
    }

    fn with_variant(mut self, variant_num: VariantNum) -> Self {
        self.variant_num = variant_num;
        self
    }
}

impl OwnerKeyed for RegulatingOwnerInfo {
    fn owner_id(&self) -> &str {
        &self.owner.equipment_id
    }

    fn with_variant(mut self, variant_num: VariantNum) -> Self {
        self.owner.variant_num = variant_num;
        self
    }
}

impl OwnerKeyed for ExtensionOwnerInfo {
    fn owner_id(&self) -> &str {
        &self.owner.equipment_id
    }

    fn shadow_key(&self) -> String {
        format!("{}\u{1f}{}", self.owner.equipment_id, self.name)
    }

    fn with_variant(mut self, variant_num: VariantNum) -> Self {
        self.owner.variant_num = variant_num;
        self
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{ExtensionOwnerInfo, OwnerInfo, OwnerKeyed};
    use crate::ResourceType;

    #[test]
    fn stamping_variant_keeps_owner() {
        let owner = OwnerInfo::new(Uuid::new_v4(), 0, "L1", ResourceType::Line);
        let stamped = owner.clone().with_variant(3);
        assert_eq!(stamped.variant_num, 3);
        assert_eq!(stamped.owner_id(), "L1");
        assert_eq!(stamped.network_uuid, owner.network_uuid);
    }

    #[test]
    fn extensions_shadow_per_name() {
        let owner = OwnerInfo::new(Uuid::new_v4(), 1, "G1", ResourceType::Generator);
        let a = ExtensionOwnerInfo {
            owner: owner.clone(),
            name: "activePowerControl".to_string(),
        };
        let b = ExtensionOwnerInfo {
            owner,
            name: "coordinatedReactiveControl".to_string(),
        };
        assert_eq!(a.owner_id(), b.owner_id());
        assert_ne!(a.shadow_key(), b.shadow_key());
    }
}
