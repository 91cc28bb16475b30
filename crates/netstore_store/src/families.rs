//! Typed entry points per equipment family.

use uuid::Uuid;

use crate::NetworkStore;
use netstore_core::*;

macro_rules! family_operations {
    ($(
        $variant:ident => $attrs:ty {
            $create:ident, $get_one:ident, $get_all:ident, $update:ident, $delete:ident
        }
    )+) => {
        impl NetworkStore {
            $(
                pub async fn $create(
                    &self,
                    network_uuid: Uuid,
                    resources: Vec<Resource<$attrs>>,
                ) -> NetstoreResult<()> {
                    self.create_identifiables(network_uuid, resources).await
                }

                pub async fn $get_one(
                    &self,
                    network_uuid: Uuid,
                    variant_num: VariantNum,
                    id: &str,
                ) -> NetstoreResult<Option<Resource<$attrs>>> {
                    self.get_identifiable(network_uuid, variant_num, id).await
                }

                pub async fn $get_all(
                    &self,
                    network_uuid: Uuid,
                    variant_num: VariantNum,
                ) -> NetstoreResult<Vec<Resource<$attrs>>> {
                    self.get_identifiables(network_uuid, variant_num).await
                }

                pub async fn $update(
                    &self,
                    network_uuid: Uuid,
                    resources: Vec<Resource<$attrs>>,
                ) -> NetstoreResult<()> {
                    self.update_identifiables(network_uuid, resources).await
                }

                pub async fn $delete(
                    &self,
                    network_uuid: Uuid,
                    variant_num: VariantNum,
                    ids: &[String],
                ) -> NetstoreResult<()> {
                    self.delete_identifiables::<$attrs>(network_uuid, variant_num, ids).await
                }
            )+
        }

        /// Reads one equipment of a family known only at runtime.
        pub(crate) async fn get_identifiable_of_type(
            store: &NetworkStore,
            resource_type: ResourceType,
            network_uuid: Uuid,
            variant_num: VariantNum,
            id: &str,
        ) -> NetstoreResult<Option<IdentifiableResource>> {
            match resource_type {
                $(
                    ResourceType::$variant => Ok(store
                        .get_identifiable::<$attrs>(network_uuid, variant_num, id)
                        .await?
                        .map(<$attrs as IdentifiableAttributes>::into_identifiable)),
                )+
                ResourceType::Network => Err(NetstoreError::not_found(
                    "the network is not an identifiable family",
                )),
            }
        }
    };
}

family_operations! {
    Substation => SubstationAttributes {
        create_substations, get_substation, get_substations, update_substations, delete_substations
    }
    VoltageLevel => VoltageLevelAttributes {
        create_voltage_levels, get_voltage_level, get_voltage_levels, update_voltage_levels,
        delete_voltage_levels
    }
    Generator => GeneratorAttributes {
        create_generators, get_generator, get_generators, update_generators, delete_generators
    }
    Battery => BatteryAttributes {
        create_batteries, get_battery, get_batteries, update_batteries, delete_batteries
    }
    Load => LoadAttributes {
        create_loads, get_load, get_loads, update_loads, delete_loads
    }
    ShuntCompensator => ShuntCompensatorAttributes {
        create_shunt_compensators, get_shunt_compensator, get_shunt_compensators,
        update_shunt_compensators, delete_shunt_compensators
    }
    StaticVarCompensator => StaticVarCompensatorAttributes {
        create_static_var_compensators, get_static_var_compensator, get_static_var_compensators,
        update_static_var_compensators, delete_static_var_compensators
    }
    VscConverterStation => VscConverterStationAttributes {
        create_vsc_converter_stations, get_vsc_converter_station, get_vsc_converter_stations,
        update_vsc_converter_stations, delete_vsc_converter_stations
    }
    LccConverterStation => LccConverterStationAttributes {
        create_lcc_converter_stations, get_lcc_converter_station, get_lcc_converter_stations,
        update_lcc_converter_stations, delete_lcc_converter_stations
    }
    BusbarSection => BusbarSectionAttributes {
        create_busbar_sections, get_busbar_section, get_busbar_sections, update_busbar_sections,
        delete_busbar_sections
    }
    Switch => SwitchAttributes {
        create_switches, get_switch, get_switches, update_switches, delete_switches
    }
    Line => LineAttributes {
        create_lines, get_line, get_lines, update_lines, delete_lines
    }
    TwoWindingsTransformer => TwoWindingsTransformerAttributes {
        create_two_windings_transformers, get_two_windings_transformer,
        get_two_windings_transformers, update_two_windings_transformers,
        delete_two_windings_transformers
    }
    ThreeWindingsTransformer => ThreeWindingsTransformerAttributes {
        create_three_windings_transformers, get_three_windings_transformer,
        get_three_windings_transformers, update_three_windings_transformers,
        delete_three_windings_transformers
    }
    DanglingLine => DanglingLineAttributes {
        create_dangling_lines, get_dangling_line, get_dangling_lines, update_dangling_lines,
        delete_dangling_lines
    }
    HvdcLine => HvdcLineAttributes {
        create_hvdc_lines, get_hvdc_line, get_hvdc_lines, update_hvdc_lines, delete_hvdc_lines
    }
    TieLine => TieLineAttributes {
        create_tie_lines, get_tie_line, get_tie_lines, update_tie_lines, delete_tie_lines
    }
    Ground => GroundAttributes {
        create_grounds, get_ground, get_grounds, update_grounds, delete_grounds
    }
    Area => AreaAttributes {
        create_areas, get_area, get_areas, update_areas, delete_areas
    }
}
