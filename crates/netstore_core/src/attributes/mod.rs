//! Attribute objects of every equipment family.

mod branches;
mod containers;
mod injections;
mod limits;
mod network;
mod reactive;
mod tap_changer;
mod transformers;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::external::{ExternalAttributeKind, ExternalAttributes, RegulatingEquipmentIdentifier};
use crate::mapping::TableMapping;
use crate::{NetstoreResult, Resource, ResourceType};

pub use branches::*;
pub use containers::*;
pub use injections::*;
pub use limits::*;
pub use network::*;
pub use reactive::*;
pub use tap_changer::*;
pub use transformers::*;

pub type Properties = BTreeMap<String, String>;
pub type Aliases = BTreeSet<String>;

/// Contract between an equipment family and the generic store code path.
///
/// Inline attributes flow through [`IdentifiableAttributes::mapping`]; one-to-many
/// sub-records are split off with `external_attributes` on write and merged back
/// with `attach_external_attributes` on read.
pub trait IdentifiableAttributes:
    Clone + Debug + Default + PartialEq + Send + Sync + 'static
{
    const RESOURCE_TYPE: ResourceType;
    const EXTERNAL_KINDS: &'static [ExternalAttributeKind] = &[];

    fn mapping() -> &'static TableMapping<Self>;

    fn external_attributes(&self) -> ExternalAttributes {
        ExternalAttributes::default()
    }

    fn attach_external_attributes(&mut self, _external: ExternalAttributes) -> NetstoreResult<()> {
        Ok(())
    }

    /// Back-references to the equipments regulating this one, when it can be regulated.
    fn regulating_equipments_mut(
        &mut self,
    ) -> Option<&mut BTreeSet<RegulatingEquipmentIdentifier>> {
        None
    }

    fn into_identifiable(resource: Resource<Self>) -> IdentifiableResource;
}

macro_rules! identifiable_resource {
    ($($variant:ident => $attrs:ty),+ $(,)?) => {
        /// A resource of any equipment family.
        #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
        #[serde(tag = "family", content = "resource")]
        pub enum IdentifiableResource {
            $($variant(Resource<$attrs>),)+
        }

        impl IdentifiableResource {
            pub fn id(&self) -> &str {
                match self {
                    $(IdentifiableResource::$variant(resource) => &resource.id,)+
                }
            }

            pub fn resource_type(&self) -> ResourceType {
                match self {
                    $(IdentifiableResource::$variant(resource) => resource.resource_type,)+
                }
            }
        }

        $(
            impl From<Resource<$attrs>> for IdentifiableResource {
                fn from(resource: Resource<$attrs>) -> Self {
                    IdentifiableResource::$variant(resource)
                }
            }
        )+
    };
}

identifiable_resource! {
    Substation => SubstationAttributes,
    VoltageLevel => VoltageLevelAttributes,
    Generator => GeneratorAttributes,
    Battery => BatteryAttributes,
    Load => LoadAttributes,
    ShuntCompensator => ShuntCompensatorAttributes,
    StaticVarCompensator => StaticVarCompensatorAttributes,
    VscConverterStation => VscConverterStationAttributes,
    LccConverterStation => LccConverterStationAttributes,
    BusbarSection => BusbarSectionAttributes,
    Switch => SwitchAttributes,
    Line => LineAttributes,
    TwoWindingsTransformer => TwoWindingsTransformerAttributes,
    ThreeWindingsTransformer => ThreeWindingsTransformerAttributes,
    DanglingLine => DanglingLineAttributes,
    HvdcLine => HvdcLineAttributes,
    TieLine => TieLineAttributes,
    Ground => GroundAttributes,
    Area => AreaAttributes,
}

/// Implements the boilerplate part of [`IdentifiableAttributes`] for a family
/// whose mapping is built by `$build`.
macro_rules! mapped_family {
    ($attrs:ty, $resource_type:expr, $build:expr) => {
        const RESOURCE_TYPE: $crate::ResourceType = $resource_type;

        fn mapping() -> &'static $crate::mapping::TableMapping<Self> {
            static MAPPING: once_cell::sync::Lazy<$crate::mapping::TableMapping<$attrs>> =
                once_cell::sync::Lazy::new($build);
            &MAPPING
        }

        fn into_identifiable(
            resource: $crate::Resource<Self>,
        ) -> $crate::attributes::IdentifiableResource {
            resource.into()
        }
    };
}

pub(crate) use mapped_family;
