use serde::{Deserialize, Serialize};

use crate::external::{
    ExternalAttributes, RegulatingPointAttributes, RegulatingTapChangerType,
    TapChangerStepAttributes, TapChangerType,
};
use crate::mapping::{ColumnMapping, TableMappingBuilder, f64_value, to_bool, to_f64, to_i32};
use crate::{NetstoreResult, Value, ValueType};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TapChangerStepValue {
    pub rho: f64,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    /// Phase shift, only set on phase tap changer steps.
    pub alpha: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioTapChangerAttributes {
    pub low_tap_position: i32,
    pub tap_position: i32,
    pub solved_tap_position: Option<i32>,
    pub load_tap_changing_capabilities: bool,
    pub regulating: bool,
    pub target_v: f64,
    pub target_deadband: f64,
    pub steps: Vec<TapChangerStepValue>,
    pub regulating_point: Option<RegulatingPointAttributes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseTapChangerAttributes {
    pub low_tap_position: i32,
    pub tap_position: i32,
    pub solved_tap_position: Option<i32>,
    pub regulating: bool,
    pub regulation_value: f64,
    pub target_deadband: f64,
    pub steps: Vec<TapChangerStepValue>,
    pub regulating_point: Option<RegulatingPointAttributes>,
}

/// Shared scalar fields of both tap changer kinds, so columns can be declared once.
pub trait TapChangerFields: Default + 'static {
    const TYPE: TapChangerType;

    fn fields() -> Vec<TapChangerField<Self>>;
    fn steps(&self) -> &[TapChangerStepValue];
    fn steps_mut(&mut self) -> &mut Vec<TapChangerStepValue>;
    fn regulating_point(&self) -> Option<&RegulatingPointAttributes>;
    fn regulating_point_mut(&mut self) -> &mut Option<RegulatingPointAttributes>;
}

pub struct TapChangerField<TC> {
    name: &'static str,
    value_type: ValueType,
    read: fn(&TC) -> Value,
    write: fn(&mut TC, Value) -> NetstoreResult<()>,
}

impl<TC> TapChangerField<TC> {
    fn new(
        name: &'static str,
        value_type: ValueType,
        read: fn(&TC) -> Value,
        write: fn(&mut TC, Value) -> NetstoreResult<()>,
    ) -> Self {
        Self {
            name,
            value_type,
            read,
            write,
        }
    }
}

impl TapChangerFields for RatioTapChangerAttributes {
    const TYPE: TapChangerType = TapChangerType::Ratio;

    fn fields() -> Vec<TapChangerField<Self>> {
        vec![
            TapChangerField::new(
                "low_tap_position",
                ValueType::I64,
                |tc| tc.low_tap_position.into(),
                |tc, v| {
                    tc.low_tap_position = to_i32(v)?.unwrap_or_default();
                    Ok(())
                },
            ),
            TapChangerField::new(
                "tap_position",
                ValueType::I64,
                |tc| tc.tap_position.into(),
                |tc, v| {
                    tc.tap_position = to_i32(v)?.unwrap_or_default();
                    Ok(())
                },
            ),
            TapChangerField::new(
                "solved_tap_position",
                ValueType::I64,
                |tc| tc.solved_tap_position.into(),
                |tc, v| {
                    tc.solved_tap_position = to_i32(v)?;
                    Ok(())
                },
            ),
            TapChangerField::new(
                "load_tap_changing_capabilities",
                ValueType::Bool,
                |tc| tc.load_tap_changing_capabilities.into(),
                |tc, v| {
                    tc.load_tap_changing_capabilities = to_bool(v)?.unwrap_or(false);
                    Ok(())
                },
            ),
            TapChangerField::new(
                "regulating",
                ValueType::Bool,
                |tc| tc.regulating.into(),
                |tc, v| {
                    tc.regulating = to_bool(v)?.unwrap_or(false);
                    Ok(())
                },
            ),
            TapChangerField::new(
                "target_v",
                ValueType::F64,
                |tc| f64_value(tc.target_v),
                |tc, v| {
                    tc.target_v = to_f64(v)?.unwrap_or(f64::NAN);
                    Ok(())
                },
            ),
            TapChangerField::new(
                "target_deadband",
                ValueType::F64,
                |tc| f64_value(tc.target_deadband),
                |tc, v| {
                    tc.target_deadband = to_f64(v)?.unwrap_or(f64::NAN);
                    Ok(())
                },
            ),
        ]
    }

    fn steps(&self) -> &[TapChangerStepValue] {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut Vec<TapChangerStepValue> {
        &mut self.steps
    }

    fn regulating_point(&self) -> Option<&RegulatingPointAttributes> {
        self.regulating_point.as_ref()
    }

    fn regulating_point_mut(&mut self) -> &mut Option<RegulatingPointAttributes> {
        &mut self.regulating_point
    }
}

impl TapChangerFields for PhaseTapChangerAttributes {
    const TYPE: TapChangerType = TapChangerType::Phase;

    fn fields() -> Vec<TapChangerField<Self>> {
        vec![
            TapChangerField::new(
                "low_tap_position",
                ValueType::I64,
                |tc| tc.low_tap_position.into(),
                |tc, v| {
                    tc.low_tap_position = to_i32(v)?.unwrap_or_default();
                    Ok(())
                },
            ),
            TapChangerField::new(
                "tap_position",
                ValueType::I64,
                |tc| tc.tap_position.into(),
                |tc, v| {
                    tc.tap_position = to_i32(v)?.unwrap_or_default();
                    Ok(())
                },
            ),
            TapChangerField::new(
                "solved_tap_position",
                ValueType::I64,
                |tc| tc.solved_tap_position.into(),
                |tc, v| {
                    tc.solved_tap_position = to_i32(v)?;
                    Ok(())
                },
            ),
            TapChangerField::new(
                "regulating",
                ValueType::Bool,
                |tc| tc.regulating.into(),
                |tc, v| {
                    tc.regulating = to_bool(v)?.unwrap_or(false);
                    Ok(())
                },
            ),
            TapChangerField::new(
                "regulation_value",
                ValueType::F64,
                |tc| f64_value(tc.regulation_value),
                |tc, v| {
                    tc.regulation_value = to_f64(v)?.unwrap_or(f64::NAN);
                    Ok(())
                },
            ),
            TapChangerField::new(
                "target_deadband",
                ValueType::F64,
                |tc| f64_value(tc.target_deadband),
                |tc, v| {
                    tc.target_deadband = to_f64(v)?.unwrap_or(f64::NAN);
                    Ok(())
                },
            ),
        ]
    }

    fn steps(&self) -> &[TapChangerStepValue] {
        &self.steps
    }

    fn steps_mut(&mut self) -> &mut Vec<TapChangerStepValue> {
        &mut self.steps
    }

    fn regulating_point(&self) -> Option<&RegulatingPointAttributes> {
        self.regulating_point.as_ref()
    }

    fn regulating_point_mut(&mut self) -> &mut Option<RegulatingPointAttributes> {
        &mut self.regulating_point
    }
}

/// Adds one `<prefix>_<field><suffix>` column per tap changer scalar.
///
/// Reading a tap changer that is absent yields NULL on every column; writing a
/// non-NULL value allocates the tap changer.
pub(crate) fn tap_changer_columns<T, TC, G, M>(
    mut builder: TableMappingBuilder<T>,
    prefix: &str,
    suffix: &str,
    get: G,
    get_mut: M,
) -> TableMappingBuilder<T>
where
    T: 'static,
    TC: TapChangerFields,
    G: Fn(&T) -> Option<&TC> + Clone + Send + Sync + 'static,
    M: Fn(&mut T) -> &mut Option<TC> + Clone + Send + Sync + 'static,
{
    for field in TC::fields() {
        let get = get.clone();
        let get_mut = get_mut.clone();
        let TapChangerField {
            name,
            value_type,
            read,
            write,
        } = field;
        builder = builder.column(ColumnMapping::<T>::new(
            format!("{prefix}_{name}{suffix}"),
            value_type,
            move |attrs| get(attrs).map(read).unwrap_or(Value::Null),
            move |attrs, value| {
                let tap_changer = get_mut(attrs);
                if value.is_null() && tap_changer.is_none() {
                    return Ok(());
                }
                write(tap_changer.get_or_insert_with(TC::default), value)
            },
        ));
    }
    builder
}

/// Steps of a tap changer as external rows.
pub fn flatten_steps<TC: TapChangerFields>(
    side: i32,
    tap_changer: Option<&TC>,
    out: &mut ExternalAttributes,
) {
    let Some(tap_changer) = tap_changer else {
        return;
    };
    out.tap_changer_steps
        .extend(
            tap_changer
                .steps()
                .iter()
                .enumerate()
                .map(|(index, step)| TapChangerStepAttributes {
                    index: index as i32,
                    side,
                    tap_changer_type: TC::TYPE,
                    rho: step.rho,
                    r: step.r,
                    x: step.x,
                    g: step.g,
                    b: step.b,
                    alpha: step.alpha,
                }),
        );
    if let Some(point) = tap_changer.regulating_point() {
        out.regulating_points.insert(
            RegulatingTapChangerType::for_tap_changer(TC::TYPE, side),
            point.clone(),
        );
    }
}

/// Restores steps and the regulating point of a tap changer from external rows.
///
/// Rows are only attached to a tap changer that was read from the inline columns.
pub fn attach_steps<TC: TapChangerFields>(
    side: i32,
    tap_changer: Option<&mut TC>,
    external: &ExternalAttributes,
) {
    let Some(tap_changer) = tap_changer else {
        return;
    };
    let mut steps: Vec<&TapChangerStepAttributes> = external
        .tap_changer_steps
        .iter()
        .filter(|step| step.side == side && step.tap_changer_type == TC::TYPE)
        .collect();
    steps.sort_by_key(|step| step.index);
    *tap_changer.steps_mut() = steps
        .into_iter()
        .map(|step| TapChangerStepValue {
            rho: step.rho,
            r: step.r,
            x: step.x,
            g: step.g,
            b: step.b,
            alpha: step.alpha,
        })
        .collect();
    let key = RegulatingTapChangerType::for_tap_changer(TC::TYPE, side);
    if let Some(point) = external.regulating_points.get(&key) {
        *tap_changer.regulating_point_mut() = Some(point.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PhaseTapChangerAttributes, RatioTapChangerAttributes, TapChangerStepValue, attach_steps,
        flatten_steps,
    };
    use crate::external::{
        ExternalAttributes, RegulatingPointAttributes, RegulatingTapChangerType,
    };

    fn step(rho: f64) -> TapChangerStepValue {
        TapChangerStepValue {
            rho,
            ..TapChangerStepValue::default()
        }
    }

    #[test]
    fn steps_flatten_with_sides_and_types() {
        let ratio = RatioTapChangerAttributes {
            steps: vec![step(0.9), step(1.0), step(1.1)],
            regulating_point: Some(RegulatingPointAttributes::default()),
            ..RatioTapChangerAttributes::default()
        };
        let phase = PhaseTapChangerAttributes {
            steps: vec![step(1.0)],
            ..PhaseTapChangerAttributes::default()
        };
        let mut external = ExternalAttributes::default();
        flatten_steps(2, Some(&ratio), &mut external);
        flatten_steps(2, Some(&phase), &mut external);
        assert_eq!(external.tap_changer_steps.len(), 4);
        assert!(
            external
                .regulating_points
                .contains_key(&RegulatingTapChangerType::RatioTapChangerSide2)
        );

        let mut rebuilt = RatioTapChangerAttributes::default();
        attach_steps(2, Some(&mut rebuilt), &external);
        assert_eq!(rebuilt.steps, ratio.steps);
        assert!(rebuilt.regulating_point.is_some());

        let mut other_side = RatioTapChangerAttributes::default();
        attach_steps(1, Some(&mut other_side), &external);
        assert!(other_side.steps.is_empty());
    }
}
