use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::external::{
    ExternalAttributes, LimitType, PermanentLimitAttributes, TemporaryLimitAttributes,
};
use crate::{NetstoreError, NetstoreResult};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporaryLimitValue {
    pub name: String,
    pub value: Option<f64>,
    pub fictitious: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LimitsAttributes {
    pub permanent_limit: Option<f64>,
    /// Keyed by acceptable duration in seconds.
    pub temporary_limits: BTreeMap<i32, TemporaryLimitValue>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationalLimitsGroupAttributes {
    pub id: String,
    pub current_limits: Option<LimitsAttributes>,
    pub active_power_limits: Option<LimitsAttributes>,
    pub apparent_power_limits: Option<LimitsAttributes>,
}

impl OperationalLimitsGroupAttributes {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn limits(&self, limit_type: LimitType) -> Option<&LimitsAttributes> {
        match limit_type {
            LimitType::Current => self.current_limits.as_ref(),
            LimitType::ActivePower => self.active_power_limits.as_ref(),
            LimitType::ApparentPower => self.apparent_power_limits.as_ref(),
        }
    }

    pub fn limits_mut(&mut self, limit_type: LimitType) -> &mut Option<LimitsAttributes> {
        match limit_type {
            LimitType::Current => &mut self.current_limits,
            LimitType::ActivePower => &mut self.active_power_limits,
            LimitType::ApparentPower => &mut self.apparent_power_limits,
        }
    }
}

/// Operational limits groups of one side, keyed by group id.
pub type OperationalLimitsGroups = BTreeMap<String, OperationalLimitsGroupAttributes>;

const LIMIT_TYPES: [LimitType; 3] = [
    LimitType::Current,
    LimitType::ActivePower,
    LimitType::ApparentPower,
];

/// Splits the limits of one side into permanent and temporary limit rows.
pub fn flatten_limits(side: i32, groups: &OperationalLimitsGroups, out: &mut ExternalAttributes) {
    for (group_id, group) in groups {
        for limit_type in LIMIT_TYPES {
            let Some(limits) = group.limits(limit_type) else {
                continue;
            };
            out.permanent_limits.push(PermanentLimitAttributes {
                operational_limits_group_id: group_id.clone(),
                side,
                limit_type,
                value: limits.permanent_limit,
            });
            for (duration, temporary) in &limits.temporary_limits {
                out.temporary_limits.push(TemporaryLimitAttributes {
                    operational_limits_group_id: group_id.clone(),
                    side,
                    limit_type,
                    name: temporary.name.clone(),
                    value: temporary.value,
                    acceptable_duration: *duration,
                    fictitious: temporary.fictitious,
                });
            }
        }
    }
}

/// Rebuilds the limits groups of one side from permanent and temporary limit rows.
///
/// Permanent limits are applied first; a temporary limit whose group and limit
/// type have no permanent limit row is rejected. Rows for other sides are ignored.
pub fn attach_limits(
    side: i32,
    external: &ExternalAttributes,
    groups: &mut OperationalLimitsGroups,
) -> NetstoreResult<()> {
    for permanent in external.permanent_limits.iter().filter(|l| l.side == side) {
        let group = groups
            .entry(permanent.operational_limits_group_id.clone())
            .or_insert_with(|| {
                OperationalLimitsGroupAttributes::new(&permanent.operational_limits_group_id)
            });
        group
            .limits_mut(permanent.limit_type)
            .get_or_insert_with(LimitsAttributes::default)
            .permanent_limit = permanent.value;
    }
    for temporary in external.temporary_limits.iter().filter(|l| l.side == side) {
        let limits = groups
            .get_mut(&temporary.operational_limits_group_id)
            .and_then(|group| group.limits_mut(temporary.limit_type).as_mut())
            .ok_or_else(|| {
                NetstoreError::invariant(format!(
                    "temporary limit {} of group {} side {side} has no permanent limit",
                    temporary.name, temporary.operational_limits_group_id
                ))
            })?;
        limits.temporary_limits.insert(
            temporary.acceptable_duration,
            TemporaryLimitValue {
                name: temporary.name.clone(),
                value: temporary.value,
                fictitious: temporary.fictitious,
            },
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        LimitsAttributes, OperationalLimitsGroupAttributes, OperationalLimitsGroups,
        TemporaryLimitValue, attach_limits, flatten_limits,
    };
    use crate::NetstoreError;
    use crate::external::{ExternalAttributes, LimitType, TemporaryLimitAttributes};

    fn groups() -> OperationalLimitsGroups {
        let mut group = OperationalLimitsGroupAttributes::new("DEFAULT");
        let mut current = LimitsAttributes {
            permanent_limit: Some(500.0),
            ..LimitsAttributes::default()
        };
        current.temporary_limits.insert(
            600,
            TemporaryLimitValue {
                name: "IT10".to_string(),
                value: Some(700.0),
                fictitious: false,
            },
        );
        group.current_limits = Some(current);
        group.apparent_power_limits = Some(LimitsAttributes {
            permanent_limit: None,
            ..LimitsAttributes::default()
        });
        OperationalLimitsGroups::from([("DEFAULT".to_string(), group)])
    }

    #[test]
    fn flatten_then_attach_rebuilds_groups_per_side() {
        let mut external = ExternalAttributes::default();
        flatten_limits(1, &groups(), &mut external);
        flatten_limits(2, &OperationalLimitsGroups::new(), &mut external);
        assert_eq!(external.permanent_limits.len(), 2);
        assert_eq!(external.temporary_limits.len(), 1);

        let mut side1 = OperationalLimitsGroups::new();
        attach_limits(1, &external, &mut side1).expect("attach");
        assert_eq!(side1, groups());

        let mut side2 = OperationalLimitsGroups::new();
        attach_limits(2, &external, &mut side2).expect("attach");
        assert!(side2.is_empty());
    }

    #[test]
    fn duplicate_durations_keep_the_last_row() {
        let mut external = ExternalAttributes::default();
        flatten_limits(1, &groups(), &mut external);
        let mut duplicate = external.temporary_limits[0].clone();
        duplicate.name = "IT10bis".to_string();
        external.temporary_limits.push(duplicate);

        let mut rebuilt = OperationalLimitsGroups::new();
        attach_limits(1, &external, &mut rebuilt).expect("attach");
        let current = rebuilt["DEFAULT"].current_limits.as_ref().expect("current");
        assert_eq!(current.temporary_limits.len(), 1);
        assert_eq!(current.temporary_limits[&600].name, "IT10bis");
    }

    #[test]
    fn temporary_without_permanent_is_an_invariant_violation() {
        let mut external = ExternalAttributes::default();
        external.temporary_limits.push(TemporaryLimitAttributes {
            operational_limits_group_id: "DEFAULT".to_string(),
            side: 1,
            limit_type: LimitType::ActivePower,
            name: "IT5".to_string(),
            value: Some(10.0),
            acceptable_duration: 300,
            fictitious: false,
        });
        let mut rebuilt = OperationalLimitsGroups::new();
        let err = attach_limits(1, &external, &mut rebuilt).expect_err("missing permanent");
        assert!(matches!(err, NetstoreError::Invariant { .. }));
    }
}
