use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{IdentifiableAttributes, VariantNum};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceType {
    Network,
    Substation,
    VoltageLevel,
    Generator,
    Battery,
    Load,
    ShuntCompensator,
    StaticVarCompensator,
    VscConverterStation,
    LccConverterStation,
    BusbarSection,
    Switch,
    Line,
    TwoWindingsTransformer,
    ThreeWindingsTransformer,
    DanglingLine,
    HvdcLine,
    TieLine,
    Ground,
    Area,
}

impl ResourceType {
    /// Every equipment family with its own table, in probing order.
    pub const EQUIPMENT: [ResourceType; 19] = [
        ResourceType::Substation,
        ResourceType::VoltageLevel,
        ResourceType::Generator,
        ResourceType::Battery,
        ResourceType::Load,
        ResourceType::ShuntCompensator,
        ResourceType::StaticVarCompensator,
        ResourceType::VscConverterStation,
        ResourceType::LccConverterStation,
        ResourceType::BusbarSection,
        ResourceType::Switch,
        ResourceType::Line,
        ResourceType::TwoWindingsTransformer,
        ResourceType::ThreeWindingsTransformer,
        ResourceType::DanglingLine,
        ResourceType::HvdcLine,
        ResourceType::TieLine,
        ResourceType::Ground,
        ResourceType::Area,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceType::Network => "NETWORK",
            ResourceType::Substation => "SUBSTATION",
            ResourceType::VoltageLevel => "VOLTAGE_LEVEL",
            ResourceType::Generator => "GENERATOR",
            ResourceType::Battery => "BATTERY",
            ResourceType::Load => "LOAD",
            ResourceType::ShuntCompensator => "SHUNT_COMPENSATOR",
            ResourceType::StaticVarCompensator => "STATIC_VAR_COMPENSATOR",
            ResourceType::VscConverterStation => "VSC_CONVERTER_STATION",
            ResourceType::LccConverterStation => "LCC_CONVERTER_STATION",
            ResourceType::BusbarSection => "BUSBAR_SECTION",
            ResourceType::Switch => "SWITCH",
            ResourceType::Line => "LINE",
            ResourceType::TwoWindingsTransformer => "TWO_WINDINGS_TRANSFORMER",
            ResourceType::ThreeWindingsTransformer => "THREE_WINDINGS_TRANSFORMER",
            ResourceType::DanglingLine => "DANGLING_LINE",
            ResourceType::HvdcLine => "HVDC_LINE",
            ResourceType::TieLine => "TIE_LINE",
            ResourceType::Ground => "GROUND",
            ResourceType::Area => "AREA",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        std::iter::once(ResourceType::Network)
            .chain(ResourceType::EQUIPMENT)
            .find(|candidate| candidate.as_str() == value)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Resource<T> {
    pub resource_type: ResourceType,
    pub id: String,
    pub variant_num: VariantNum,
    pub attributes: T,
}

impl<T: IdentifiableAttributes> Resource<T> {
    pub fn new(id: impl Into<String>, variant_num: VariantNum, attributes: T) -> Self {
        Self {
            resource_type: T::RESOURCE_TYPE,
            id: id.into(),
            variant_num,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceType;

    #[test]
    fn parse_matches_as_str() {
        for resource_type in ResourceType::EQUIPMENT {
            assert_eq!(ResourceType::parse(resource_type.as_str()), Some(resource_type));
        }
        assert_eq!(ResourceType::parse("NETWORK"), Some(ResourceType::Network));
        assert_eq!(ResourceType::parse("BRANCH"), None);
    }

    #[test]
    fn serde_uses_screaming_case() {
        let encoded = serde_json::to_string(&ResourceType::TwoWindingsTransformer).expect("encode");
        assert_eq!(encoded, "\"TWO_WINDINGS_TRANSFORMER\"");
    }
}
