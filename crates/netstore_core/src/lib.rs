pub mod api;
pub mod attributes;
pub mod error;
pub mod extension;
pub mod external;
pub mod ids;
pub mod mapping;
pub mod resolve;
pub mod resource;
pub mod value;
pub mod variant;

pub use api::*;
pub use attributes::*;
pub use error::{NetstoreError, NetstoreResult};
pub use extension::ExtensionResource;
pub use external::*;
pub use ids::*;
pub use mapping::{
    ColumnMapping, TableDescriptor, TableMapping, descriptor_for, descriptor_for_table,
    descriptors,
};
pub use resolve::VariantKeyed;
pub use resource::*;
pub use value::*;
pub use variant::*;
