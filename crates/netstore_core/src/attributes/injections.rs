use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::reactive::{attach_curve, flatten_curve, reactive_limits_columns};
use super::{Aliases, IdentifiableAttributes, Properties, ReactiveLimitsAttributes, mapped_family};
use crate::external::{
    ExternalAttributeKind, ExternalAttributes, RegulatingEquipmentIdentifier,
    RegulatingPointAttributes, RegulatingTapChangerType,
};
use crate::mapping::{TableMapping, identifiable_columns, injection_columns};
use crate::{NetstoreResult, ResourceType};

const REACTIVE_REGULATING_KINDS: &[ExternalAttributeKind] = &[
    ExternalAttributeKind::ReactiveCapabilityCurvePoint,
    ExternalAttributeKind::RegulatingPoint,
];

fn flatten_regulating_point(point: &Option<RegulatingPointAttributes>, out: &mut ExternalAttributes) {
    if let Some(point) = point {
        out.regulating_points
            .insert(RegulatingTapChangerType::None, point.clone());
    }
}

fn attach_regulating_point(external: &mut ExternalAttributes) -> Option<RegulatingPointAttributes> {
    external
        .regulating_points
        .remove(&RegulatingTapChangerType::None)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratorAttributes {
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
    pub energy_source: Option<String>,
    pub min_p: f64,
    pub max_p: f64,
    pub target_p: f64,
    pub target_q: f64,
    pub target_v: f64,
    pub rated_s: f64,
    pub voltage_regulator_on: bool,
    pub reactive_limits: Option<ReactiveLimitsAttributes>,
    pub regulating_point: Option<RegulatingPointAttributes>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn generator_mapping() -> TableMapping<GeneratorAttributes> {
    let builder = injection_columns!(identifiable_columns!(
        TableMapping::<GeneratorAttributes>::builder("generator", ResourceType::Generator)
    ))
    .opt_str(
        "energy_source",
        |a| a.energy_source.as_deref(),
        |a, v| a.energy_source = v,
    )
    .f64("min_p", |a| a.min_p, |a, v| a.min_p = v)
    .f64("max_p", |a| a.max_p, |a, v| a.max_p = v)
    .f64("target_p", |a| a.target_p, |a, v| a.target_p = v)
    .f64("target_q", |a| a.target_q, |a, v| a.target_q = v)
    .f64("target_v", |a| a.target_v, |a, v| a.target_v = v)
    .f64("rated_s", |a| a.rated_s, |a, v| a.rated_s = v)
    .bool(
        "voltage_regulator_on",
        |a| a.voltage_regulator_on,
        |a, v| a.voltage_regulator_on = v,
    );
    reactive_limits_columns(builder, |a| &a.reactive_limits, |a| &mut a.reactive_limits).build()
}

impl IdentifiableAttributes for GeneratorAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = REACTIVE_REGULATING_KINDS;

    mapped_family!(GeneratorAttributes, ResourceType::Generator, generator_mapping);

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_curve(&self.reactive_limits, &mut external);
        flatten_regulating_point(&self.regulating_point, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, mut external: ExternalAttributes) -> NetstoreResult<()> {
        attach_curve(&mut self.reactive_limits, &external);
        self.regulating_point = attach_regulating_point(&mut external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatteryAttributes {
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
    pub min_p: f64,
    pub max_p: f64,
    pub target_p: f64,
    pub target_q: f64,
    pub reactive_limits: Option<ReactiveLimitsAttributes>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn battery_mapping() -> TableMapping<BatteryAttributes> {
    let builder = injection_columns!(identifiable_columns!(
        TableMapping::<BatteryAttributes>::builder("battery", ResourceType::Battery)
    ))
    .f64("min_p", |a| a.min_p, |a, v| a.min_p = v)
    .f64("max_p", |a| a.max_p, |a, v| a.max_p = v)
    .f64("target_p", |a| a.target_p, |a, v| a.target_p = v)
    .f64("target_q", |a| a.target_q, |a, v| a.target_q = v);
    reactive_limits_columns(builder, |a| &a.reactive_limits, |a| &mut a.reactive_limits).build()
}

impl IdentifiableAttributes for BatteryAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] =
        &[ExternalAttributeKind::ReactiveCapabilityCurvePoint];

    mapped_family!(BatteryAttributes, ResourceType::Battery, battery_mapping);

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_curve(&self.reactive_limits, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        attach_curve(&mut self.reactive_limits, &external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadAttributes {
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
    pub load_type: Option<String>,
    pub p0: f64,
    pub q0: f64,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn load_mapping() -> TableMapping<LoadAttributes> {
    injection_columns!(identifiable_columns!(
        TableMapping::<LoadAttributes>::builder("load", ResourceType::Load)
    ))
    .opt_str(
        "load_type",
        |a| a.load_type.as_deref(),
        |a, v| a.load_type = v,
    )
    .f64("p0", |a| a.p0, |a, v| a.p0 = v)
    .f64("q0", |a| a.q0, |a, v| a.q0 = v)
    .build()
}

impl IdentifiableAttributes for LoadAttributes {
    mapped_family!(LoadAttributes, ResourceType::Load, load_mapping);

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShuntCompensatorAttributes {
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
    pub section_count: i32,
    pub maximum_section_count: i32,
    pub b_per_section: f64,
    pub g_per_section: f64,
    pub target_v: f64,
    pub target_deadband: f64,
    pub voltage_regulator_on: bool,
    pub regulating_point: Option<RegulatingPointAttributes>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn shunt_compensator_mapping() -> TableMapping<ShuntCompensatorAttributes> {
    injection_columns!(identifiable_columns!(
        TableMapping::<ShuntCompensatorAttributes>::builder(
            "shunt_compensator",
            ResourceType::ShuntCompensator
        )
    ))
    .i32(
        "section_count",
        |a| a.section_count,
        |a, v| a.section_count = v,
    )
    .i32(
        "maximum_section_count",
        |a| a.maximum_section_count,
        |a, v| a.maximum_section_count = v,
    )
    .f64(
        "b_per_section",
        |a| a.b_per_section,
        |a, v| a.b_per_section = v,
    )
    .f64(
        "g_per_section",
        |a| a.g_per_section,
        |a, v| a.g_per_section = v,
    )
    .f64("target_v", |a| a.target_v, |a, v| a.target_v = v)
    .f64(
        "target_deadband",
        |a| a.target_deadband,
        |a, v| a.target_deadband = v,
    )
    .bool(
        "voltage_regulator_on",
        |a| a.voltage_regulator_on,
        |a, v| a.voltage_regulator_on = v,
    )
    .build()
}

impl IdentifiableAttributes for ShuntCompensatorAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] =
        &[ExternalAttributeKind::RegulatingPoint];

    mapped_family!(
        ShuntCompensatorAttributes,
        ResourceType::ShuntCompensator,
        shunt_compensator_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_regulating_point(&self.regulating_point, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, mut external: ExternalAttributes) -> NetstoreResult<()> {
        self.regulating_point = attach_regulating_point(&mut external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticVarCompensatorAttributes {
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
    pub b_min: f64,
    pub b_max: f64,
    pub voltage_set_point: f64,
    pub reactive_power_set_point: f64,
    pub regulating_point: Option<RegulatingPointAttributes>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn static_var_compensator_mapping() -> TableMapping<StaticVarCompensatorAttributes> {
    injection_columns!(identifiable_columns!(
        TableMapping::<StaticVarCompensatorAttributes>::builder(
            "static_var_compensator",
            ResourceType::StaticVarCompensator
        )
    ))
    .f64("b_min", |a| a.b_min, |a, v| a.b_min = v)
    .f64("b_max", |a| a.b_max, |a, v| a.b_max = v)
    .f64(
        "voltage_set_point",
        |a| a.voltage_set_point,
        |a, v| a.voltage_set_point = v,
    )
    .f64(
        "reactive_power_set_point",
        |a| a.reactive_power_set_point,
        |a, v| a.reactive_power_set_point = v,
    )
    .build()
}

impl IdentifiableAttributes for StaticVarCompensatorAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] =
        &[ExternalAttributeKind::RegulatingPoint];

    mapped_family!(
        StaticVarCompensatorAttributes,
        ResourceType::StaticVarCompensator,
        static_var_compensator_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_regulating_point(&self.regulating_point, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, mut external: ExternalAttributes) -> NetstoreResult<()> {
        self.regulating_point = attach_regulating_point(&mut external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VscConverterStationAttributes {
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
    pub loss_factor: f64,
    pub voltage_regulator_on: bool,
    pub voltage_set_point: f64,
    pub reactive_power_set_point: f64,
    pub reactive_limits: Option<ReactiveLimitsAttributes>,
    pub regulating_point: Option<RegulatingPointAttributes>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn vsc_converter_station_mapping() -> TableMapping<VscConverterStationAttributes> {
    let builder = injection_columns!(identifiable_columns!(
        TableMapping::<VscConverterStationAttributes>::builder(
            "vsc_converter_station",
            ResourceType::VscConverterStation
        )
    ))
    .f64("loss_factor", |a| a.loss_factor, |a, v| a.loss_factor = v)
    .bool(
        "voltage_regulator_on",
        |a| a.voltage_regulator_on,
        |a, v| a.voltage_regulator_on = v,
    )
    .f64(
        "voltage_set_point",
        |a| a.voltage_set_point,
        |a, v| a.voltage_set_point = v,
    )
    .f64(
        "reactive_power_set_point",
        |a| a.reactive_power_set_point,
        |a, v| a.reactive_power_set_point = v,
    );
    reactive_limits_columns(builder, |a| &a.reactive_limits, |a| &mut a.reactive_limits).build()
}

impl IdentifiableAttributes for VscConverterStationAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = REACTIVE_REGULATING_KINDS;

    mapped_family!(
        VscConverterStationAttributes,
        ResourceType::VscConverterStation,
        vsc_converter_station_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_curve(&self.reactive_limits, &mut external);
        flatten_regulating_point(&self.regulating_point, &mut external);
        external
    }

    fn attach_external_attributes(&mut self, mut external: ExternalAttributes) -> NetstoreResult<()> {
        attach_curve(&mut self.reactive_limits, &external);
        self.regulating_point = attach_regulating_point(&mut external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LccConverterStationAttributes {
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
    pub loss_factor: f64,
    pub power_factor: f64,
}

fn lcc_converter_station_mapping() -> TableMapping<LccConverterStationAttributes> {
    injection_columns!(identifiable_columns!(
        TableMapping::<LccConverterStationAttributes>::builder(
            "lcc_converter_station",
            ResourceType::LccConverterStation
        )
    ))
    .f64("loss_factor", |a| a.loss_factor, |a, v| a.loss_factor = v)
    .f64(
        "power_factor",
        |a| a.power_factor,
        |a, v| a.power_factor = v,
    )
    .build()
}

impl IdentifiableAttributes for LccConverterStationAttributes {
    mapped_family!(
        LccConverterStationAttributes,
        ResourceType::LccConverterStation,
        lcc_converter_station_mapping
    );
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BusbarSectionAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub voltage_level_id: String,
    pub node: Option<i32>,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn busbar_section_mapping() -> TableMapping<BusbarSectionAttributes> {
    identifiable_columns!(TableMapping::<BusbarSectionAttributes>::builder(
        "busbar_section",
        ResourceType::BusbarSection
    ))
    .container("voltage_level_id")
    .str(
        "voltage_level_id",
        |a| a.voltage_level_id.as_str(),
        |a, v| a.voltage_level_id = v,
    )
    .opt_i32("node", |a| a.node, |a, v| a.node = v)
    .build()
}

impl IdentifiableAttributes for BusbarSectionAttributes {
    mapped_family!(
        BusbarSectionAttributes,
        ResourceType::BusbarSection,
        busbar_section_mapping
    );

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundAttributes {
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
}

fn ground_mapping() -> TableMapping<GroundAttributes> {
    injection_columns!(identifiable_columns!(
        TableMapping::<GroundAttributes>::builder("ground", ResourceType::Ground)
    ))
    .build()
}

impl IdentifiableAttributes for GroundAttributes {
    mapped_family!(GroundAttributes, ResourceType::Ground, ground_mapping);
}

#[cfg(test)]
mod tests {
    use super::GeneratorAttributes;
    use crate::external::{
        ExternalAttributeKind, RegulatingPointAttributes, RegulatingTapChangerType,
        TerminalRefAttributes,
    };
    use crate::{IdentifiableAttributes, ReactiveLimitsAttributes, Value};

    #[test]
    fn min_q_column_allocates_reactive_limits() {
        let mapping = GeneratorAttributes::mapping();
        let mut generator = mapping.new_attributes();
        assert!(generator.reactive_limits.is_none());
        mapping
            .write(&mut generator, "min_q", Value::F64(-10.0))
            .expect("write");
        mapping
            .write(&mut generator, "max_q", Value::F64(10.0))
            .expect("write");
        let limits = generator
            .reactive_limits
            .as_ref()
            .and_then(ReactiveLimitsAttributes::min_max)
            .expect("min max");
        assert_eq!((limits.min_q, limits.max_q), (-10.0, 10.0));
        assert_eq!(
            mapping.read(&generator, "reactive_limits_kind").expect("read"),
            Value::from("MIN_MAX")
        );
    }

    #[test]
    fn null_min_q_leaves_limits_unset() {
        let mapping = GeneratorAttributes::mapping();
        let mut generator = mapping.new_attributes();
        mapping
            .write(&mut generator, "min_q", Value::Null)
            .expect("write");
        assert!(generator.reactive_limits.is_none());
    }

    #[test]
    fn regulating_point_moves_through_external_attributes() {
        let point = RegulatingPointAttributes {
            regulation_mode: Some("VOLTAGE".to_string()),
            local_terminal: Some(TerminalRefAttributes::new("G1", None)),
            regulating_terminal: Some(TerminalRefAttributes::new("BBS1", None)),
            regulated_resource_type: None,
            regulating: true,
        };
        let generator = GeneratorAttributes {
            regulating_point: Some(point.clone()),
            ..GeneratorAttributes::default()
        };
        let external = generator.external_attributes();
        assert_eq!(
            external.regulating_points.get(&RegulatingTapChangerType::None),
            Some(&point)
        );
        assert!(external.is_empty(ExternalAttributeKind::ReactiveCapabilityCurvePoint));

        let mut rebuilt = GeneratorAttributes::default();
        rebuilt
            .attach_external_attributes(external)
            .expect("attach");
        assert_eq!(rebuilt.regulating_point, Some(point));
    }
}
