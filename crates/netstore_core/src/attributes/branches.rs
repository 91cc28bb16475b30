use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::limits::{OperationalLimitsGroups, attach_limits, flatten_limits};
use super::{Aliases, IdentifiableAttributes, Properties, mapped_family};
use crate::external::{ExternalAttributeKind, ExternalAttributes, RegulatingEquipmentIdentifier};
use crate::mapping::{
    ColumnMapping, TableMapping, TableMappingBuilder, branch_columns, identifiable_columns,
    injection_columns, to_bool,
};
use crate::{NetstoreResult, ResourceType, Value, ValueType};

pub(crate) const LIMIT_KINDS: &[ExternalAttributeKind] = &[
    ExternalAttributeKind::PermanentLimit,
    ExternalAttributeKind::TemporaryLimit,
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LineAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub voltage_level_id1: String,
    pub voltage_level_id2: String,
    pub node1: Option<i32>,
    pub node2: Option<i32>,
    pub bus1: Option<String>,
    pub bus2: Option<String>,
    pub connectable_bus1: Option<String>,
    pub connectable_bus2: Option<String>,
    pub p1: f64,
    pub q1: f64,
    pub p2: f64,
    pub q2: f64,
    pub r: f64,
    pub x: f64,
    pub g1: f64,
    pub b1: f64,
    pub g2: f64,
    pub b2: f64,
    pub selected_operational_limits_group_id1: Option<String>,
    pub selected_operational_limits_group_id2: Option<String>,
    pub operational_limits_groups1: OperationalLimitsGroups,
    pub operational_limits_groups2: OperationalLimitsGroups,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn line_mapping() -> TableMapping<LineAttributes> {
    branch_columns!(identifiable_columns!(
        TableMapping::<LineAttributes>::builder("line", ResourceType::Line)
    ))
    .f64("r", |a| a.r, |a, v| a.r = v)
    .f64("x", |a| a.x, |a, v| a.x = v)
    .f64("g1", |a| a.g1, |a, v| a.g1 = v)
    .f64("b1", |a| a.b1, |a, v| a.b1 = v)
    .f64("g2", |a| a.g2, |a, v| a.g2 = v)
    .f64("b2", |a| a.b2, |a, v| a.b2 = v)
    .build()
}

impl IdentifiableAttributes for LineAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = LIMIT_KINDS;

    mapped_family!(LineAttributes, ResourceType::Line, line_mapping);

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_limits(1, &self.operational_limits_groups1, &mut external);
        flatten_limits(2, &self.operational_limits_groups2, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        self.operational_limits_groups1.clear();
        self.operational_limits_groups2.clear();
        attach_limits(1, &external, &mut self.operational_limits_groups1)?;
        attach_limits(2, &external, &mut self.operational_limits_groups2)
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DanglingLineGenerationAttributes {
    pub min_p: f64,
    pub max_p: f64,
    pub target_p: f64,
    pub target_q: f64,
    pub target_v: f64,
    pub voltage_regulation_on: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DanglingLineAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub voltage_level_id: String,
    pub node: Option<i32>,
    pub bus: Option<String>,
    pub connectable_bus: Option<String>,
    pub p: f64,
    pub q: f64,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    pub p0: f64,
    pub q0: f64,
    pub pairing_key: Option<String>,
    pub tie_line_id: Option<String>,
    pub generation: Option<DanglingLineGenerationAttributes>,
    pub selected_operational_limits_group_id: Option<String>,
    pub operational_limits_groups: OperationalLimitsGroups,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

/// `generation_*` columns; a non-NULL write allocates the generation part.
fn generation_columns(
    mut builder: TableMappingBuilder<DanglingLineAttributes>,
) -> TableMappingBuilder<DanglingLineAttributes> {
    fn generation(a: &mut DanglingLineAttributes) -> &mut DanglingLineGenerationAttributes {
        a.generation.get_or_insert_with(Default::default)
    }

    let f64_fields: [(
        &str,
        fn(&DanglingLineGenerationAttributes) -> f64,
        fn(&mut DanglingLineGenerationAttributes, f64),
    ); 5] = [
        ("generation_min_p", |g| g.min_p, |g, v| g.min_p = v),
        ("generation_max_p", |g| g.max_p, |g, v| g.max_p = v),
        ("generation_target_p", |g| g.target_p, |g, v| g.target_p = v),
        ("generation_target_q", |g| g.target_q, |g, v| g.target_q = v),
        ("generation_target_v", |g| g.target_v, |g, v| g.target_v = v),
    ];
    for (name, get, set) in f64_fields {
        builder = builder.opt_f64(
            name,
            move |a| a.generation.as_ref().map(get).filter(|v| !v.is_nan()),
            move |a, v| {
                if let Some(v) = v {
                    set(generation(a), v);
                }
            },
        );
    }
    builder.column(ColumnMapping::new(
        "generation_voltage_regulation_on",
        ValueType::Bool,
        |a: &DanglingLineAttributes| {
            Value::from(a.generation.as_ref().map(|g| g.voltage_regulation_on))
        },
        |a: &mut DanglingLineAttributes, value| {
            if let Some(on) = to_bool(value)? {
                generation(a).voltage_regulation_on = on;
            }
            Ok(())
        },
    ))
}

fn dangling_line_mapping() -> TableMapping<DanglingLineAttributes> {
    let builder = injection_columns!(identifiable_columns!(
        TableMapping::<DanglingLineAttributes>::builder(
            "dangling_line",
            ResourceType::DanglingLine
        )
    ))
    .f64("r", |a| a.r, |a, v| a.r = v)
    .f64("x", |a| a.x, |a, v| a.x = v)
    .f64("g", |a| a.g, |a, v| a.g = v)
    .f64("b", |a| a.b, |a, v| a.b = v)
    .f64("p0", |a| a.p0, |a, v| a.p0 = v)
    .f64("q0", |a| a.q0, |a, v| a.q0 = v)
    .opt_str(
        "pairing_key",
        |a| a.pairing_key.as_deref(),
        |a, v| a.pairing_key = v,
    )
    .opt_str(
        "tie_line_id",
        |a| a.tie_line_id.as_deref(),
        |a, v| a.tie_line_id = v,
    )
    .opt_str(
        "selected_operational_limits_group_id",
        |a| a.selected_operational_limits_group_id.as_deref(),
        |a, v| a.selected_operational_limits_group_id = v,
    );
    generation_columns(builder).build()
}

impl IdentifiableAttributes for DanglingLineAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = LIMIT_KINDS;

    mapped_family!(
        DanglingLineAttributes,
        ResourceType::DanglingLine,
        dangling_line_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_limits(1, &self.operational_limits_groups, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        self.operational_limits_groups.clear();
        attach_limits(1, &external, &mut self.operational_limits_groups)
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HvdcLineAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub converter_station_id1: String,
    pub converter_station_id2: String,
    pub r: f64,
    pub nominal_v: f64,
    pub active_power_setpoint: f64,
    pub max_p: f64,
    pub converters_mode: Option<String>,
}

fn hvdc_line_mapping() -> TableMapping<HvdcLineAttributes> {
    identifiable_columns!(TableMapping::<HvdcLineAttributes>::builder(
        "hvdc_line",
        ResourceType::HvdcLine
    ))
    .str(
        "converter_station_id1",
        |a| a.converter_station_id1.as_str(),
        |a, v| a.converter_station_id1 = v,
    )
    .str(
        "converter_station_id2",
        |a| a.converter_station_id2.as_str(),
        |a, v| a.converter_station_id2 = v,
    )
    .f64("r", |a| a.r, |a, v| a.r = v)
    .f64("nominal_v", |a| a.nominal_v, |a, v| a.nominal_v = v)
    .f64(
        "active_power_setpoint",
        |a| a.active_power_setpoint,
        |a, v| a.active_power_setpoint = v,
    )
    .f64("max_p", |a| a.max_p, |a, v| a.max_p = v)
    .opt_str(
        "converters_mode",
        |a| a.converters_mode.as_deref(),
        |a, v| a.converters_mode = v,
    )
    .build()
}

impl IdentifiableAttributes for HvdcLineAttributes {
    mapped_family!(HvdcLineAttributes, ResourceType::HvdcLine, hvdc_line_mapping);
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TieLineAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub dangling_line1_id: String,
    pub dangling_line2_id: String,
}

fn tie_line_mapping() -> TableMapping<TieLineAttributes> {
    identifiable_columns!(TableMapping::<TieLineAttributes>::builder(
        "tie_line",
        ResourceType::TieLine
    ))
    .str(
        "dangling_line1_id",
        |a| a.dangling_line1_id.as_str(),
        |a, v| a.dangling_line1_id = v,
    )
    .str(
        "dangling_line2_id",
        |a| a.dangling_line2_id.as_str(),
        |a, v| a.dangling_line2_id = v,
    )
    .build()
}

impl IdentifiableAttributes for TieLineAttributes {
    mapped_family!(TieLineAttributes, ResourceType::TieLine, tie_line_mapping);
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SwitchAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub voltage_level_id: String,
    pub kind: Option<String>,
    pub node1: Option<i32>,
    pub node2: Option<i32>,
    pub bus1: Option<String>,
    pub bus2: Option<String>,
    pub open: bool,
    pub retained: bool,
}

fn switch_mapping() -> TableMapping<SwitchAttributes> {
    identifiable_columns!(TableMapping::<SwitchAttributes>::builder(
        "switch",
        ResourceType::Switch
    ))
    .container("voltage_level_id")
    .str(
        "voltage_level_id",
        |a| a.voltage_level_id.as_str(),
        |a, v| a.voltage_level_id = v,
    )
    .opt_str("kind", |a| a.kind.as_deref(), |a, v| a.kind = v)
    .opt_i32("node1", |a| a.node1, |a, v| a.node1 = v)
    .opt_i32("node2", |a| a.node2, |a, v| a.node2 = v)
    .opt_str("bus1", |a| a.bus1.as_deref(), |a, v| a.bus1 = v)
    .opt_str("bus2", |a| a.bus2.as_deref(), |a, v| a.bus2 = v)
    .bool("open", |a| a.open, |a, v| a.open = v)
    .bool("retained", |a| a.retained, |a, v| a.retained = v)
    .build()
}

impl IdentifiableAttributes for SwitchAttributes {
    mapped_family!(SwitchAttributes, ResourceType::Switch, switch_mapping);
}

#[cfg(test)]
mod tests {
    use super::{DanglingLineAttributes, LineAttributes};
    use crate::attributes::{LimitsAttributes, OperationalLimitsGroupAttributes};
    use crate::{IdentifiableAttributes, Value};

    #[test]
    fn generation_columns_allocate_lazily() {
        let mapping = DanglingLineAttributes::mapping();
        let mut line = mapping.new_attributes();
        mapping
            .write(&mut line, "generation_target_p", Value::Null)
            .expect("write");
        assert!(line.generation.is_none());
        assert_eq!(
            mapping.read(&line, "generation_target_p").expect("read"),
            Value::Null
        );
        mapping
            .write(&mut line, "generation_target_p", Value::F64(42.0))
            .expect("write");
        assert_eq!(line.generation.as_ref().map(|g| g.target_p), Some(42.0));
    }

    #[test]
    fn line_limits_split_by_side() {
        let mut group = OperationalLimitsGroupAttributes::new("DEFAULT");
        group.current_limits = Some(LimitsAttributes {
            permanent_limit: Some(400.0),
            ..LimitsAttributes::default()
        });
        let mut line = LineAttributes::default();
        line.operational_limits_groups2
            .insert("DEFAULT".to_string(), group);
        let external = line.external_attributes();
        assert_eq!(external.permanent_limits.len(), 1);
        assert_eq!(external.permanent_limits[0].side, 2);

        let mut rebuilt = LineAttributes::default();
        rebuilt
            .attach_external_attributes(external)
            .expect("attach");
        assert!(rebuilt.operational_limits_groups1.is_empty());
        assert_eq!(
            rebuilt.operational_limits_groups2,
            line.operational_limits_groups2
        );
    }
}
