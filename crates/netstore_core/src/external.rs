//! One-to-many sub-records of an equipment that live in side tables.
//!
//! List-shaped kinds are persisted as one serialized list per owner; regulating
//! points are persisted one row per owner and tap changer.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{NetstoreError, NetstoreResult, ResourceType};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExternalAttributeKind {
    TemporaryLimit,
    PermanentLimit,
    ReactiveCapabilityCurvePoint,
    RegulatingPoint,
    TapChangerStep,
    AreaBoundary,
}

impl ExternalAttributeKind {
    pub const ALL: [ExternalAttributeKind; 6] = [
        ExternalAttributeKind::TemporaryLimit,
        ExternalAttributeKind::PermanentLimit,
        ExternalAttributeKind::ReactiveCapabilityCurvePoint,
        ExternalAttributeKind::RegulatingPoint,
        ExternalAttributeKind::TapChangerStep,
        ExternalAttributeKind::AreaBoundary,
    ];

    pub const LIST_KINDS: [ExternalAttributeKind; 5] = [
        ExternalAttributeKind::TemporaryLimit,
        ExternalAttributeKind::PermanentLimit,
        ExternalAttributeKind::ReactiveCapabilityCurvePoint,
        ExternalAttributeKind::TapChangerStep,
        ExternalAttributeKind::AreaBoundary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExternalAttributeKind::TemporaryLimit => "TEMPORARY_LIMIT",
            ExternalAttributeKind::PermanentLimit => "PERMANENT_LIMIT",
            ExternalAttributeKind::ReactiveCapabilityCurvePoint => {
                "REACTIVE_CAPABILITY_CURVE_POINT"
            }
            ExternalAttributeKind::RegulatingPoint => "REGULATING_POINT",
            ExternalAttributeKind::TapChangerStep => "TAP_CHANGER_STEP",
            ExternalAttributeKind::AreaBoundary => "AREA_BOUNDARY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    pub fn table_name(self) -> &'static str {
        match self {
            ExternalAttributeKind::TemporaryLimit => "temporary_limits",
            ExternalAttributeKind::PermanentLimit => "permanent_limits",
            ExternalAttributeKind::ReactiveCapabilityCurvePoint => {
                "reactive_capability_curve_points"
            }
            ExternalAttributeKind::RegulatingPoint => "regulating_points",
            ExternalAttributeKind::TapChangerStep => "tap_changer_steps",
            ExternalAttributeKind::AreaBoundary => "area_boundaries",
        }
    }

}

impl fmt::Display for ExternalAttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitType {
    Current,
    ActivePower,
    ApparentPower,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PermanentLimitAttributes {
    pub operational_limits_group_id: String,
    pub side: i32,
    pub limit_type: LimitType,
    pub value: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemporaryLimitAttributes {
    pub operational_limits_group_id: String,
    pub side: i32,
    pub limit_type: LimitType,
    pub name: String,
    pub value: Option<f64>,
    pub acceptable_duration: i32,
    #[serde(default)]
    pub fictitious: bool,
}

/// Payload doubles use the same convention as inline columns: NaN is written
/// as `null` and `null` reads back as NaN.
mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_nan() {
            serializer.serialize_none()
        } else {
            serializer.serialize_f64(*value)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReactiveCapabilityCurvePointAttributes {
    #[serde(with = "nan_as_null")]
    pub p: f64,
    #[serde(with = "nan_as_null")]
    pub min_q: f64,
    #[serde(with = "nan_as_null")]
    pub max_q: f64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TapChangerType {
    Ratio,
    Phase,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TapChangerStepAttributes {
    pub index: i32,
    /// 0 for two-winding transformers, the leg number for three-winding ones.
    pub side: i32,
    pub tap_changer_type: TapChangerType,
    #[serde(with = "nan_as_null")]
    pub rho: f64,
    #[serde(with = "nan_as_null")]
    pub r: f64,
    #[serde(with = "nan_as_null")]
    pub x: f64,
    #[serde(with = "nan_as_null")]
    pub g: f64,
    #[serde(with = "nan_as_null")]
    pub b: f64,
    pub alpha: Option<f64>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TerminalRefAttributes {
    pub connectable_id: String,
    pub side: Option<i32>,
}

impl TerminalRefAttributes {
    pub fn new(connectable_id: impl Into<String>, side: Option<i32>) -> Self {
        Self {
            connectable_id: connectable_id.into(),
            side,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegulatingTapChangerType {
    None,
    RatioTapChanger,
    PhaseTapChanger,
    RatioTapChangerSide1,
    PhaseTapChangerSide1,
    RatioTapChangerSide2,
    PhaseTapChangerSide2,
    RatioTapChangerSide3,
    PhaseTapChangerSide3,
}

impl RegulatingTapChangerType {
    const ALL: [RegulatingTapChangerType; 9] = [
        RegulatingTapChangerType::None,
        RegulatingTapChangerType::RatioTapChanger,
        RegulatingTapChangerType::PhaseTapChanger,
        RegulatingTapChangerType::RatioTapChangerSide1,
        RegulatingTapChangerType::PhaseTapChangerSide1,
        RegulatingTapChangerType::RatioTapChangerSide2,
        RegulatingTapChangerType::PhaseTapChangerSide2,
        RegulatingTapChangerType::RatioTapChangerSide3,
        RegulatingTapChangerType::PhaseTapChangerSide3,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RegulatingTapChangerType::None => "NONE",
            RegulatingTapChangerType::RatioTapChanger => "RATIO_TAP_CHANGER",
            RegulatingTapChangerType::PhaseTapChanger => "PHASE_TAP_CHANGER",
            RegulatingTapChangerType::RatioTapChangerSide1 => "RATIO_TAP_CHANGER_SIDE_1",
            RegulatingTapChangerType::PhaseTapChangerSide1 => "PHASE_TAP_CHANGER_SIDE_1",
            RegulatingTapChangerType::RatioTapChangerSide2 => "RATIO_TAP_CHANGER_SIDE_2",
            RegulatingTapChangerType::PhaseTapChangerSide2 => "PHASE_TAP_CHANGER_SIDE_2",
            RegulatingTapChangerType::RatioTapChangerSide3 => "RATIO_TAP_CHANGER_SIDE_3",
            RegulatingTapChangerType::PhaseTapChangerSide3 => "PHASE_TAP_CHANGER_SIDE_3",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Discriminator of the tap changer of a given type on a given side
    /// (0 for two-winding transformers).
    pub fn for_tap_changer(tap_changer_type: TapChangerType, side: i32) -> Self {
        match (tap_changer_type, side) {
            (TapChangerType::Ratio, 1) => RegulatingTapChangerType::RatioTapChangerSide1,
            (TapChangerType::Ratio, 2) => RegulatingTapChangerType::RatioTapChangerSide2,
            (TapChangerType::Ratio, 3) => RegulatingTapChangerType::RatioTapChangerSide3,
            (TapChangerType::Ratio, _) => RegulatingTapChangerType::RatioTapChanger,
            (TapChangerType::Phase, 1) => RegulatingTapChangerType::PhaseTapChangerSide1,
            (TapChangerType::Phase, 2) => RegulatingTapChangerType::PhaseTapChangerSide2,
            (TapChangerType::Phase, 3) => RegulatingTapChangerType::PhaseTapChangerSide3,
            (TapChangerType::Phase, _) => RegulatingTapChangerType::PhaseTapChanger,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct RegulatingPointAttributes {
    pub regulation_mode: Option<String>,
    pub local_terminal: Option<TerminalRefAttributes>,
    pub regulating_terminal: Option<TerminalRefAttributes>,
    pub regulated_resource_type: Option<ResourceType>,
    pub regulating: bool,
}

/// Back-reference from a regulated equipment to the equipment regulating it.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegulatingEquipmentIdentifier {
    pub equipment_id: String,
    pub resource_type: ResourceType,
    pub tap_changer_type: RegulatingTapChangerType,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaBoundaryAttributes {
    pub boundary_dangling_line_id: Option<String>,
    pub terminal: Option<TerminalRefAttributes>,
    pub ac: bool,
}

/// External attributes of one owner, split by kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalAttributes {
    pub permanent_limits: Vec<PermanentLimitAttributes>,
    pub temporary_limits: Vec<TemporaryLimitAttributes>,
    pub reactive_capability_curve_points: Vec<ReactiveCapabilityCurvePointAttributes>,
    pub tap_changer_steps: Vec<TapChangerStepAttributes>,
    pub area_boundaries: Vec<AreaBoundaryAttributes>,
    pub regulating_points: BTreeMap<RegulatingTapChangerType, RegulatingPointAttributes>,
}

impl ExternalAttributes {
    pub fn is_empty(&self, kind: ExternalAttributeKind) -> bool {
        match kind {
            ExternalAttributeKind::TemporaryLimit => self.temporary_limits.is_empty(),
            ExternalAttributeKind::PermanentLimit => self.permanent_limits.is_empty(),
            ExternalAttributeKind::ReactiveCapabilityCurvePoint => {
                self.reactive_capability_curve_points.is_empty()
            }
            ExternalAttributeKind::RegulatingPoint => self.regulating_points.is_empty(),
            ExternalAttributeKind::TapChangerStep => self.tap_changer_steps.is_empty(),
            ExternalAttributeKind::AreaBoundary => self.area_boundaries.is_empty(),
        }
    }

    /// Serializes the payload list of a list-shaped kind.
    pub fn encode_list(&self, kind: ExternalAttributeKind) -> NetstoreResult<String> {
        let encoded = match kind {
            ExternalAttributeKind::TemporaryLimit => serde_json::to_string(&self.temporary_limits),
            ExternalAttributeKind::PermanentLimit => serde_json::to_string(&self.permanent_limits),
            ExternalAttributeKind::ReactiveCapabilityCurvePoint => {
                serde_json::to_string(&self.reactive_capability_curve_points)
            }
            ExternalAttributeKind::TapChangerStep => {
                serde_json::to_string(&self.tap_changer_steps)
            }
            ExternalAttributeKind::AreaBoundary => serde_json::to_string(&self.area_boundaries),
            ExternalAttributeKind::RegulatingPoint => {
                return Err(NetstoreError::invalid(
                    "regulating points are not stored as a list",
                ));
            }
        };
        encoded.map_err(NetstoreError::codec)
    }

    /// Appends a serialized payload list of a list-shaped kind.
    pub fn decode_list(&mut self, kind: ExternalAttributeKind, payload: &str) -> NetstoreResult<()> {
        match kind {
            ExternalAttributeKind::TemporaryLimit => self
                .temporary_limits
                .extend(decode::<TemporaryLimitAttributes>(payload)?),
            ExternalAttributeKind::PermanentLimit => self
                .permanent_limits
                .extend(decode::<PermanentLimitAttributes>(payload)?),
            ExternalAttributeKind::ReactiveCapabilityCurvePoint => self
                .reactive_capability_curve_points
                .extend(decode::<ReactiveCapabilityCurvePointAttributes>(payload)?),
            ExternalAttributeKind::TapChangerStep => self
                .tap_changer_steps
                .extend(decode::<TapChangerStepAttributes>(payload)?),
            ExternalAttributeKind::AreaBoundary => self
                .area_boundaries
                .extend(decode::<AreaBoundaryAttributes>(payload)?),
            ExternalAttributeKind::RegulatingPoint => {
                return Err(NetstoreError::invalid(
                    "regulating points are not stored as a list",
                ));
            }
        }
        Ok(())
    }
}

fn decode<T: serde::de::DeserializeOwned>(payload: &str) -> NetstoreResult<Vec<T>> {
    serde_json::from_str(payload).map_err(NetstoreError::codec)
}
