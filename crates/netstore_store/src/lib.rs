pub mod config;
mod db;
mod external;
mod extensions;
mod families;
mod identifiables;
pub mod migration;
mod network;
pub mod store;

pub use config::{
    BatchConfig, DatabaseConfig, ExtensionsConfig, NetstoreConfig, PoolConfig,
    DEFAULT_BATCH_SIZE, DEFAULT_MAX_BIND_PARAMS,
};
pub use netstore_core::*;
pub use store::NetworkStore;
