use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::branches::LIMIT_KINDS;
use super::limits::{OperationalLimitsGroups, attach_limits, flatten_limits};
use super::tap_changer::{attach_steps, flatten_steps, tap_changer_columns};
use super::{
    Aliases, IdentifiableAttributes, PhaseTapChangerAttributes, Properties,
    RatioTapChangerAttributes, mapped_family,
};
use crate::external::{ExternalAttributeKind, ExternalAttributes, RegulatingEquipmentIdentifier};
use crate::mapping::{TableMapping, TableMappingBuilder, branch_columns, identifiable_columns};
use crate::{NetstoreError, NetstoreResult, ResourceType};

const TRANSFORMER_KINDS: &[ExternalAttributeKind] = &[
    ExternalAttributeKind::PermanentLimit,
    ExternalAttributeKind::TemporaryLimit,
    ExternalAttributeKind::TapChangerStep,
    ExternalAttributeKind::RegulatingPoint,
];

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TwoWindingsTransformerAttributes {
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
    pub g: f64,
    pub b: f64,
    pub rated_u1: f64,
    pub rated_u2: f64,
    pub rated_s: f64,
    pub ratio_tap_changer: Option<RatioTapChangerAttributes>,
    pub phase_tap_changer: Option<PhaseTapChangerAttributes>,
    pub selected_operational_limits_group_id1: Option<String>,
    pub selected_operational_limits_group_id2: Option<String>,
    pub operational_limits_groups1: OperationalLimitsGroups,
    pub operational_limits_groups2: OperationalLimitsGroups,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

fn two_windings_transformer_mapping() -> TableMapping<TwoWindingsTransformerAttributes> {
    let builder = branch_columns!(identifiable_columns!(TableMapping::<
        TwoWindingsTransformerAttributes,
    >::builder(
        "two_windings_transformer",
        ResourceType::TwoWindingsTransformer
    )))
    .f64("r", |a| a.r, |a, v| a.r = v)
    .f64("x", |a| a.x, |a, v| a.x = v)
    .f64("g", |a| a.g, |a, v| a.g = v)
    .f64("b", |a| a.b, |a, v| a.b = v)
    .f64("rated_u1", |a| a.rated_u1, |a, v| a.rated_u1 = v)
    .f64("rated_u2", |a| a.rated_u2, |a, v| a.rated_u2 = v)
    .f64("rated_s", |a| a.rated_s, |a, v| a.rated_s = v);
    let builder = tap_changer_columns(
        builder,
        "ratio_tap_changer",
        "",
        |a: &TwoWindingsTransformerAttributes| a.ratio_tap_changer.as_ref(),
        |a: &mut TwoWindingsTransformerAttributes| &mut a.ratio_tap_changer,
    );
    tap_changer_columns(
        builder,
        "phase_tap_changer",
        "",
        |a: &TwoWindingsTransformerAttributes| a.phase_tap_changer.as_ref(),
        |a: &mut TwoWindingsTransformerAttributes| &mut a.phase_tap_changer,
    )
    .build()
}

impl IdentifiableAttributes for TwoWindingsTransformerAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = TRANSFORMER_KINDS;

    mapped_family!(
        TwoWindingsTransformerAttributes,
        ResourceType::TwoWindingsTransformer,
        two_windings_transformer_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        flatten_limits(1, &self.operational_limits_groups1, &mut external);
        flatten_limits(2, &self.operational_limits_groups2, &mut external);
        flatten_steps(0, self.ratio_tap_changer.as_ref(), &mut external);
        flatten_steps(0, self.phase_tap_changer.as_ref(), &mut external);
        external
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        self.operational_limits_groups1.clear();
        self.operational_limits_groups2.clear();
        attach_limits(1, &external, &mut self.operational_limits_groups1)?;
        attach_limits(2, &external, &mut self.operational_limits_groups2)?;
        attach_steps(0, self.ratio_tap_changer.as_mut(), &external);
        attach_steps(0, self.phase_tap_changer.as_mut(), &external);
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingsTransformerLeg {
    pub voltage_level_id: String,
    pub node: Option<i32>,
    pub bus: Option<String>,
    pub connectable_bus: Option<String>,
    pub r: f64,
    pub x: f64,
    pub g: f64,
    pub b: f64,
    pub rated_u: f64,
    pub rated_s: f64,
    pub p: f64,
    pub q: f64,
    pub ratio_tap_changer: Option<RatioTapChangerAttributes>,
    pub phase_tap_changer: Option<PhaseTapChangerAttributes>,
    pub selected_operational_limits_group_id: Option<String>,
    pub operational_limits_groups: OperationalLimitsGroups,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreeWindingsTransformerAttributes {
    pub name: Option<String>,
    pub fictitious: bool,
    pub properties: Properties,
    pub aliases: Aliases,
    pub rated_u0: f64,
    pub leg1: ThreeWindingsTransformerLeg,
    pub leg2: ThreeWindingsTransformerLeg,
    pub leg3: ThreeWindingsTransformerLeg,
    pub regulating_equipments: BTreeSet<RegulatingEquipmentIdentifier>,
}

impl ThreeWindingsTransformerAttributes {
    pub fn leg(&self, side: i32) -> NetstoreResult<&ThreeWindingsTransformerLeg> {
        match side {
            1 => Ok(&self.leg1),
            2 => Ok(&self.leg2),
            3 => Ok(&self.leg3),
            other => Err(NetstoreError::invalid(format!("no leg on side {other}"))),
        }
    }

    pub fn leg_mut(&mut self, side: i32) -> NetstoreResult<&mut ThreeWindingsTransformerLeg> {
        match side {
            1 => Ok(&mut self.leg1),
            2 => Ok(&mut self.leg2),
            3 => Ok(&mut self.leg3),
            other => Err(NetstoreError::invalid(format!("no leg on side {other}"))),
        }
    }
}

type LegRef = fn(&ThreeWindingsTransformerAttributes) -> &ThreeWindingsTransformerLeg;
type LegMut = fn(&mut ThreeWindingsTransformerAttributes) -> &mut ThreeWindingsTransformerLeg;

fn legs() -> [(i32, LegRef, LegMut); 3] {
    [
        (1, |a| &a.leg1, |a| &mut a.leg1),
        (2, |a| &a.leg2, |a| &mut a.leg2),
        (3, |a| &a.leg3, |a| &mut a.leg3),
    ]
}

/// Per-leg columns, suffixed with the leg number.
fn leg_columns(
    builder: TableMappingBuilder<ThreeWindingsTransformerAttributes>,
    side: i32,
    leg: LegRef,
    leg_mut: LegMut,
) -> TableMappingBuilder<ThreeWindingsTransformerAttributes> {
    let builder = builder
        .container(match side {
            1 => "voltage_level_id1",
            2 => "voltage_level_id2",
            _ => "voltage_level_id3",
        })
        .str(
            format!("voltage_level_id{side}"),
            move |a| leg(a).voltage_level_id.as_str(),
            move |a, v| leg_mut(a).voltage_level_id = v,
        )
        .opt_i32(
            format!("node{side}"),
            move |a| leg(a).node,
            move |a, v| leg_mut(a).node = v,
        )
        .opt_str(
            format!("bus{side}"),
            move |a| leg(a).bus.as_deref(),
            move |a, v| leg_mut(a).bus = v,
        )
        .opt_str(
            format!("connectable_bus{side}"),
            move |a| leg(a).connectable_bus.as_deref(),
            move |a, v| leg_mut(a).connectable_bus = v,
        )
        .f64(format!("r{side}"), move |a| leg(a).r, move |a, v| leg_mut(a).r = v)
        .f64(format!("x{side}"), move |a| leg(a).x, move |a, v| leg_mut(a).x = v)
        .f64(format!("g{side}"), move |a| leg(a).g, move |a, v| leg_mut(a).g = v)
        .f64(format!("b{side}"), move |a| leg(a).b, move |a, v| leg_mut(a).b = v)
        .f64(
            format!("rated_u{side}"),
            move |a| leg(a).rated_u,
            move |a, v| leg_mut(a).rated_u = v,
        )
        .f64(
            format!("rated_s{side}"),
            move |a| leg(a).rated_s,
            move |a, v| leg_mut(a).rated_s = v,
        )
        .f64(format!("p{side}"), move |a| leg(a).p, move |a, v| leg_mut(a).p = v)
        .f64(format!("q{side}"), move |a| leg(a).q, move |a, v| leg_mut(a).q = v)
        .opt_str(
            format!("selected_operational_limits_group_id{side}"),
            move |a| leg(a).selected_operational_limits_group_id.as_deref(),
            move |a, v| leg_mut(a).selected_operational_limits_group_id = v,
        );
    let suffix = side.to_string();
    let builder = tap_changer_columns(
        builder,
        "ratio_tap_changer",
        &suffix,
        move |a: &ThreeWindingsTransformerAttributes| leg(a).ratio_tap_changer.as_ref(),
        move |a: &mut ThreeWindingsTransformerAttributes| &mut leg_mut(a).ratio_tap_changer,
    );
    tap_changer_columns(
        builder,
        "phase_tap_changer",
        &suffix,
        move |a: &ThreeWindingsTransformerAttributes| leg(a).phase_tap_changer.as_ref(),
        move |a: &mut ThreeWindingsTransformerAttributes| &mut leg_mut(a).phase_tap_changer,
    )
}

fn three_windings_transformer_mapping() -> TableMapping<ThreeWindingsTransformerAttributes> {
    let mut builder = identifiable_columns!(TableMapping::<
        ThreeWindingsTransformerAttributes,
    >::builder(
        "three_windings_transformer",
        ResourceType::ThreeWindingsTransformer
    ))
    .f64("rated_u0", |a| a.rated_u0, |a, v| a.rated_u0 = v);
    for (side, leg, leg_mut) in legs() {
        builder = leg_columns(builder, side, leg, leg_mut);
    }
    builder.build()
}

impl IdentifiableAttributes for ThreeWindingsTransformerAttributes {
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = TRANSFORMER_KINDS;

    mapped_family!(
        ThreeWindingsTransformerAttributes,
        ResourceType::ThreeWindingsTransformer,
        three_windings_transformer_mapping
    );

    fn external_attributes(&self) -> ExternalAttributes {
        let mut external = ExternalAttributes::default();
        for (side, leg, _) in legs() {
            let leg = leg(self);
            flatten_limits(side, &leg.operational_limits_groups, &mut external);
            flatten_steps(side, leg.ratio_tap_changer.as_ref(), &mut external);
            flatten_steps(side, leg.phase_tap_changer.as_ref(), &mut external);
        }
        external
    }

    fn attach_external_attributes(&mut self, external: ExternalAttributes) -> NetstoreResult<()> {
        for (side, _, leg_mut) in legs() {
            let leg = leg_mut(self);
            leg.operational_limits_groups.clear();
            attach_limits(side, &external, &mut leg.operational_limits_groups)?;
            attach_steps(side, leg.ratio_tap_changer.as_mut(), &external);
            attach_steps(side, leg.phase_tap_changer.as_mut(), &external);
        }
        Ok(())
    }

    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        Some(&mut self.regulating_equipments)
    }
}

#[cfg(test)]
mod tests {
    use super::{ThreeWindingsTransformerAttributes, TwoWindingsTransformerAttributes};
    use crate::attributes::{RatioTapChangerAttributes, TapChangerStepValue};
    use crate::external::{RegulatingPointAttributes, RegulatingTapChangerType};
    use crate::{IdentifiableAttributes, Value};

    #[test]
    fn leg_columns_address_each_leg() {
        let mapping = ThreeWindingsTransformerAttributes::mapping();
        let mut transformer = mapping.new_attributes();
        for side in 1..=3 {
            mapping
                .write(
                    &mut transformer,
                    &format!("voltage_level_id{side}"),
                    Value::from(format!("VL{side}")),
                )
                .expect("write");
        }
        assert_eq!(transformer.leg2.voltage_level_id, "VL2");
        assert_eq!(transformer.leg(3).expect("leg").voltage_level_id, "VL3");
        assert!(transformer.leg(4).is_err());
        assert_eq!(
            mapping.descriptor().container_columns,
            vec!["voltage_level_id1", "voltage_level_id2", "voltage_level_id3"]
        );
    }

    #[test]
    fn tap_changer_columns_allocate_on_write() {
        let mapping = TwoWindingsTransformerAttributes::mapping();
        let mut transformer = mapping.new_attributes();
        mapping
            .write(
                &mut transformer,
                "ratio_tap_changer_tap_position",
                Value::Null,
            )
            .expect("write");
        assert!(transformer.ratio_tap_changer.is_none());
        mapping
            .write(&mut transformer, "ratio_tap_changer_tap_position", Value::I64(2))
            .expect("write");
        assert_eq!(
            transformer.ratio_tap_changer.as_ref().map(|tc| tc.tap_position),
            Some(2)
        );
        assert_eq!(
            mapping
                .read(&transformer, "phase_tap_changer_tap_position")
                .expect("read"),
            Value::Null
        );
    }

    #[test]
    fn leg_tap_changers_use_side_discriminators() {
        let mut transformer = ThreeWindingsTransformerAttributes::default();
        transformer.leg3.ratio_tap_changer = Some(RatioTapChangerAttributes {
            steps: vec![TapChangerStepValue::default(); 2],
            regulating_point: Some(RegulatingPointAttributes::default()),
            ..RatioTapChangerAttributes::default()
        });
        let external = transformer.external_attributes();
        assert_eq!(external.tap_changer_steps.len(), 2);
        assert!(external.tap_changer_steps.iter().all(|step| step.side == 3));
        assert!(
            external
                .regulating_points
                .contains_key(&RegulatingTapChangerType::RatioTapChangerSide3)
        );

        let mut rebuilt = ThreeWindingsTransformerAttributes::default();
        rebuilt.leg3.ratio_tap_changer = Some(RatioTapChangerAttributes::default());
        rebuilt
            .attach_external_attributes(external)
            .expect("attach");
        assert_eq!(rebuilt.leg3, transformer.leg3);
    }
}
