use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use netstore_core::{NetstoreError, NetstoreResult};

const DEFAULT_CONFIG_NAME: &str = "netstore.json";
const DEFAULT_SQLITE_NAME: &str = "netstore.sqlite";

pub const DEFAULT_BATCH_SIZE: usize = 1000;
pub const DEFAULT_MAX_BIND_PARAMS: usize = 16_000;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite { path: Option<String> },
    Postgres { url: String },
    Mysql { url: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub acquire_timeout_ms: Option<u64>,
    pub idle_timeout_ms: Option<u64>,
}

/// Bounds of multi-row statements.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    pub batch_size: Option<usize>,
    pub max_bind_params: Option<usize>,
}

impl BatchConfig {
    pub fn with_defaults() -> Self {
        Self {
            batch_size: Some(DEFAULT_BATCH_SIZE),
            max_bind_params: Some(DEFAULT_MAX_BIND_PARAMS),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    /// Extension names dropped when a network is cloned into another network.
    pub excluded_from_network_clone: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetstoreConfig {
    pub database: DatabaseConfig,
    pub pool: Option<PoolConfig>,
    pub batch: Option<BatchConfig>,
    pub extensions: Option<ExtensionsConfig>,
    pub failpoints: Option<Vec<String>>,
}

impl NetstoreConfig {
    pub fn default_sqlite(path: impl Into<String>) -> Self {
        Self {
            database: DatabaseConfig::Sqlite {
                path: Some(path.into()),
            },
            pool: None,
            batch: Some(BatchConfig::with_defaults()),
            extensions: None,
            failpoints: None,
        }
    }

    pub fn load_or_init(base_dir: &Path, default_sqlite_path: &Path) -> NetstoreResult<Self> {
        fs::create_dir_all(base_dir)
            .map_err(|err| NetstoreError::storage(format!("create config dir: {err}")))?;
        let config_path = base_dir.join(DEFAULT_CONFIG_NAME);
        if config_path.exists() {
            let raw = fs::read_to_string(&config_path)
                .map_err(|err| NetstoreError::storage(format!("read config: {err}")))?;
            let config: NetstoreConfig = serde_json::from_str(&raw)
                .map_err(|err| NetstoreError::invalid(err.to_string()))?;
            return Ok(config);
        }
        let default = NetstoreConfig::default_sqlite(default_sqlite_path.to_string_lossy());
        let payload = serde_json::to_string_pretty(&default)
            .map_err(|err| NetstoreError::storage(format!("serialize config: {err}")))?;
        fs::write(&config_path, payload)
            .map_err(|err| NetstoreError::storage(format!("write config: {err}")))?;
        Ok(default)
    }

    /// Config of a datastore directory; first use writes a sqlite default
    /// pointing at `netstore.sqlite` in the same directory.
    pub fn load_or_init_in(base_dir: &Path) -> NetstoreResult<Self> {
        Self::load_or_init(base_dir, &base_dir.join(DEFAULT_SQLITE_NAME))
    }

    pub fn sqlite_path(&self, base_dir: &Path) -> NetstoreResult<PathBuf> {
        match &self.database {
            DatabaseConfig::Sqlite { path } => {
                let path = path
                    .clone()
                    .unwrap_or_else(|| DEFAULT_SQLITE_NAME.to_string());
                let candidate = PathBuf::from(path);
                if candidate.is_absolute() {
                    Ok(candidate)
                } else {
                    Ok(base_dir.join(candidate))
                }
            }
            _ => Err(NetstoreError::invalid("config is not sqlite backend")),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.database {
            DatabaseConfig::Sqlite { .. } => "sqlite",
            DatabaseConfig::Postgres { .. } => "postgres",
            DatabaseConfig::Mysql { .. } => "mysql",
        }
    }

    pub fn connection_url(&self) -> Option<&str> {
        match &self.database {
            DatabaseConfig::Sqlite { .. } => None,
            DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Some(url.as_str()),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch
            .as_ref()
            .and_then(|batch| batch.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE)
            .max(1)
    }

    pub fn max_bind_params(&self) -> usize {
        self.batch
            .as_ref()
            .and_then(|batch| batch.max_bind_params)
            .unwrap_or(DEFAULT_MAX_BIND_PARAMS)
            .max(1)
    }

    pub fn excluded_clone_extensions(&self) -> Vec<String> {
        self.extensions
            .as_ref()
            .and_then(|extensions| extensions.excluded_from_network_clone.clone())
            .unwrap_or_default()
    }
}
