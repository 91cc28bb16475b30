use serde::{Deserialize, Serialize};

use crate::external::{ExternalAttributes, ReactiveCapabilityCurvePointAttributes};
use crate::mapping::{ColumnMapping, TableMappingBuilder, f64_value, to_f64, to_string};
use crate::{NetstoreError, Value, ValueType};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinMaxReactiveLimitsAttributes {
    pub min_q: f64,
    pub max_q: f64,
}

impl Default for MinMaxReactiveLimitsAttributes {
    fn default() -> Self {
        Self {
            min_q: -f64::MAX,
            max_q: f64::MAX,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactiveCapabilityCurveAttributes {
    /// Sorted by increasing active power.
    pub points: Vec<ReactiveCapabilityCurvePointAttributes>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ReactiveLimitsAttributes {
    MinMax(MinMaxReactiveLimitsAttributes),
    Curve(ReactiveCapabilityCurveAttributes),
}

impl ReactiveLimitsAttributes {
    const MIN_MAX: &'static str = "MIN_MAX";
    const CURVE: &'static str = "CURVE";

    pub fn kind(&self) -> &'static str {
        match self {
            ReactiveLimitsAttributes::MinMax(_) => Self::MIN_MAX,
            ReactiveLimitsAttributes::Curve(_) => Self::CURVE,
        }
    }

    pub fn min_max(&self) -> Option<&MinMaxReactiveLimitsAttributes> {
        match self {
            ReactiveLimitsAttributes::MinMax(limits) => Some(limits),
            ReactiveLimitsAttributes::Curve(_) => None,
        }
    }
}

/// Applies `update` to the min/max limits, allocating them first when the holder
/// has none or holds a curve.
pub fn update_min_max(
    limits: &mut Option<ReactiveLimitsAttributes>,
    update: impl FnOnce(&mut MinMaxReactiveLimitsAttributes),
) {
    if let Some(ReactiveLimitsAttributes::MinMax(min_max)) = limits {
        update(min_max);
        return;
    }
    let mut min_max = MinMaxReactiveLimitsAttributes::default();
    update(&mut min_max);
    *limits = Some(ReactiveLimitsAttributes::MinMax(min_max));
}

/// Curve points of a reactive limits holder, as external rows.
pub fn flatten_curve(limits: &Option<ReactiveLimitsAttributes>, out: &mut ExternalAttributes) {
    if let Some(ReactiveLimitsAttributes::Curve(curve)) = limits {
        out.reactive_capability_curve_points
            .extend(curve.points.iter().cloned());
    }
}

/// Replaces the limits with a curve when curve point rows exist.
pub fn attach_curve(limits: &mut Option<ReactiveLimitsAttributes>, external: &ExternalAttributes) {
    if external.reactive_capability_curve_points.is_empty() {
        return;
    }
    let mut points = external.reactive_capability_curve_points.clone();
    points.sort_by(|a, b| a.p.total_cmp(&b.p));
    *limits = Some(ReactiveLimitsAttributes::Curve(
        ReactiveCapabilityCurveAttributes { points },
    ));
}

/// Adds `reactive_limits_kind`, `min_q` and `max_q` columns over the holder's
/// `Option<ReactiveLimitsAttributes>`.
pub(crate) fn reactive_limits_columns<T: 'static>(
    builder: TableMappingBuilder<T>,
    get: fn(&T) -> &Option<ReactiveLimitsAttributes>,
    get_mut: fn(&mut T) -> &mut Option<ReactiveLimitsAttributes>,
) -> TableMappingBuilder<T> {
    builder
        .column(ColumnMapping::<T>::new(
            "reactive_limits_kind",
            ValueType::Str,
            move |attrs| {
                get(attrs)
                    .as_ref()
                    .map(|limits| Value::from(limits.kind()))
                    .unwrap_or(Value::Null)
            },
            move |attrs, value| {
                let limits = get_mut(attrs);
                match to_string(value)?.as_deref() {
                    None => *limits = None,
                    Some(ReactiveLimitsAttributes::MIN_MAX) => update_min_max(limits, |_| {}),
                    Some(ReactiveLimitsAttributes::CURVE) => {
                        *limits = Some(ReactiveLimitsAttributes::Curve(
                            ReactiveCapabilityCurveAttributes::default(),
                        ))
                    }
                    Some(other) => {
                        return Err(NetstoreError::storage(format!(
                            "unknown reactive limits kind {other}"
                        )));
                    }
                }
                Ok(())
            },
        ))
        .column(ColumnMapping::<T>::new(
            "min_q",
            ValueType::F64,
            move |attrs| {
                get(attrs)
                    .as_ref()
                    .and_then(ReactiveLimitsAttributes::min_max)
                    .map(|limits| f64_value(limits.min_q))
                    .unwrap_or(Value::Null)
            },
            move |attrs, value| {
                if let Some(min_q) = to_f64(value)? {
                    update_min_max(get_mut(attrs), |limits| limits.min_q = min_q);
                }
                Ok(())
            },
        ))
        .column(ColumnMapping::<T>::new(
            "max_q",
            ValueType::F64,
            move |attrs| {
                get(attrs)
                    .as_ref()
                    .and_then(ReactiveLimitsAttributes::min_max)
                    .map(|limits| f64_value(limits.max_q))
                    .unwrap_or(Value::Null)
            },
            move |attrs, value| {
                if let Some(max_q) = to_f64(value)? {
                    update_min_max(get_mut(attrs), |limits| limits.max_q = max_q);
                }
                Ok(())
            },
        ))
}

#[cfg(test)]
mod tests {
    use super::{ReactiveLimitsAttributes, attach_curve, flatten_curve, update_min_max};
    use crate::external::{ExternalAttributes, ReactiveCapabilityCurvePointAttributes};

    #[test]
    fn min_max_is_allocated_on_first_write() {
        let mut limits = None;
        update_min_max(&mut limits, |l| l.min_q = -10.0);
        update_min_max(&mut limits, |l| l.max_q = 10.0);
        let min_max = limits.as_ref().and_then(ReactiveLimitsAttributes::min_max);
        assert_eq!(min_max.map(|l| (l.min_q, l.max_q)), Some((-10.0, 10.0)));
    }

    #[test]
    fn curve_points_roundtrip_sorted() {
        let mut external = ExternalAttributes::default();
        for p in [50.0, 0.0] {
            external
                .reactive_capability_curve_points
                .push(ReactiveCapabilityCurvePointAttributes {
                    p,
                    min_q: -p,
                    max_q: p,
                });
        }
        let mut limits = None;
        attach_curve(&mut limits, &external);
        let Some(ReactiveLimitsAttributes::Curve(curve)) = &limits else {
            panic!("expected curve");
        };
        assert_eq!(curve.points[0].p, 0.0);

        let mut out = ExternalAttributes::default();
        flatten_curve(&limits, &mut out);
        assert_eq!(out.reactive_capability_curve_points.len(), 2);
    }

    #[test]
    fn no_points_keeps_existing_limits() {
        let mut limits = None;
        update_min_max(&mut limits, |l| l.min_q = 1.0);
        attach_curve(&mut limits, &ExternalAttributes::default());
        assert_eq!(limits.as_ref().map(ReactiveLimitsAttributes::kind), Some("MIN_MAX"));
    }
}
