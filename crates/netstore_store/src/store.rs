use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::Display;
use std::path::Path;
use std::time::Duration;

use sea_orm::sea_query;
use sea_orm::sea_query::{
    Expr, ExprTrait, MysqlQueryBuilder, PostgresQueryBuilder, Query, QueryStatementWriter,
    SqliteQueryBuilder, Value as SeaValue,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, QueryResult, Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use crate::db::*;
use crate::migration::Migrator;
use crate::{DatabaseConfig, NetstoreConfig};
use netstore_core::{
    NetstoreError, NetstoreResult, Resource, TableMapping, Value, ValueType, VariantNum,
    VariantScope,
};

pub(crate) const AFTER_IDENTIFIABLES_INSERT: &str = "after_identifiables_insert";
pub(crate) const AFTER_EXTERNAL_ATTRIBUTES_INSERT: &str = "after_external_attributes_insert";
pub(crate) const AFTER_CLONE_ROWS: &str = "after_clone_rows";

/// Parameters left free in a statement for the key and filter columns.
const RESERVED_BIND_PARAMS: usize = 8;

/// Relational network store.
///
/// Every multi-statement write runs in one transaction; reads go straight to the
/// pool.
#[derive(Clone)]
pub struct NetworkStore {
    pub(crate) conn: DatabaseConnection,
    pub(crate) backend: DatabaseBackend,
    batch_size: usize,
    max_bind_params: usize,
    pub(crate) excluded_clone_extensions: HashSet<String>,
    failpoints: HashSet<String>,
}

impl NetworkStore {
    pub async fn connect(config: &NetstoreConfig, base_dir: &Path) -> NetstoreResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        options.sqlx_logging(false);
        let conn = Database::connect(options).await?;
        let backend = conn.get_database_backend();
        let store = Self {
            conn,
            backend,
            batch_size: config.batch_size(),
            max_bind_params: config.max_bind_params(),
            excluded_clone_extensions: config.excluded_clone_extensions().into_iter().collect(),
            failpoints: config
                .failpoints
                .clone()
                .unwrap_or_default()
                .into_iter()
                .collect(),
        };
        Migrator::up(&store.conn, None).await?;
        log::info!(
            "network store ready on {} backend",
            config.backend_name()
        );
        Ok(store)
    }

    /// Opens the store of a datastore directory, creating its config on first use.
    pub async fn open(base_dir: &Path) -> NetstoreResult<Self> {
        let config = NetstoreConfig::load_or_init_in(base_dir)?;
        Self::connect(&config, base_dir).await
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    pub(crate) fn maybe_failpoint(&self, key: &str) -> NetstoreResult<()> {
        if self.failpoints.contains(key) {
            Err(NetstoreError::storage(format!("failpoint {key}")))
        } else {
            Ok(())
        }
    }

    /// Rows per multi-row statement for a table of `columns` columns.
    pub(crate) fn chunk_size(&self, columns: usize) -> usize {
        self.batch_size
            .min(self.max_bind_params / columns.max(1))
            .max(1)
    }

    /// Ids per `IN (...)` list.
    pub(crate) fn id_chunk_size(&self) -> usize {
        self.max_bind_params
            .saturating_sub(RESERVED_BIND_PARAMS)
            .max(1)
    }

    pub(crate) fn id_chunks<'a>(&self, ids: Option<&'a [String]>) -> Vec<Option<&'a [String]>> {
        match ids {
            None => vec![None],
            Some(ids) => ids.chunks(self.id_chunk_size()).map(Some).collect(),
        }
    }

    pub(crate) fn uuid_value(&self, uuid: Uuid) -> SeaValue {
        uuid_value(self.backend, uuid)
    }

    pub(crate) async fn find_variant_scope<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<Option<VariantScope>> {
        let select = Query::select()
            .from(Network::Table)
            .column(Network::FullVariantNum)
            .and_where(Expr::col(Network::Uuid).eq(self.uuid_value(network_uuid)))
            .and_where(Expr::col(Network::VariantNum).eq(variant_num))
            .to_owned();
        let Some(row) = query_one(conn, &select).await? else {
            return Ok(None);
        };
        let full_variant_num: i64 = row.try_get("", &col_name(Network::FullVariantNum))?;
        let full_variant_num = VariantNum::try_from(full_variant_num)
            .map_err(|_| NetstoreError::storage("full variant number out of range"))?;
        Ok(Some(VariantScope::partial(variant_num, full_variant_num)))
    }

    /// Scope of an existing variant.
    pub(crate) async fn variant_scope<C: ConnectionTrait>(
        &self,
        conn: &C,
        network_uuid: Uuid,
        variant_num: VariantNum,
    ) -> NetstoreResult<VariantScope> {
        self.find_variant_scope(conn, network_uuid, variant_num)
            .await?
            .ok_or_else(|| {
                NetstoreError::not_found(format!("variant {variant_num} of network {network_uuid}"))
            })
    }
}

/// Commits on success; on failure rolls back and returns the original error.
pub(crate) async fn finish<T>(
    tx: DatabaseTransaction,
    result: NetstoreResult<T>,
) -> NetstoreResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                log::warn!("rollback after '{err}' failed: {rollback_err}");
            }
            Err(err)
        }
    }
}

pub(crate) async fn begin(conn: &DatabaseConnection) -> NetstoreResult<DatabaseTransaction> {
    Ok(conn.begin().await?)
}

pub(crate) fn group_by_variant<T>(resources: Vec<Resource<T>>) -> BTreeMap<VariantNum, Vec<Resource<T>>> {
    let mut grouped: BTreeMap<VariantNum, Vec<Resource<T>>> = BTreeMap::new();
    for resource in resources {
        grouped
            .entry(resource.variant_num)
            .or_default()
            .push(resource);
    }
    grouped
}

pub(crate) fn uuid_value(backend: DatabaseBackend, uuid: Uuid) -> SeaValue {
    match backend {
        DatabaseBackend::Postgres => SeaValue::Uuid(Some(uuid)),
        DatabaseBackend::MySql => SeaValue::Bytes(Some(uuid.as_bytes().to_vec())),
        _ => SeaValue::String(Some(uuid.to_string())),
    }
}

pub(crate) fn read_uuid(row: &QueryResult, column: &str) -> NetstoreResult<Uuid> {
    if let Ok(value) = row.try_get::<String>("", column) {
        return Uuid::parse_str(&value)
            .map_err(|err| NetstoreError::storage(format!("invalid uuid {value}: {err}")));
    }
    if let Ok(value) = row.try_get::<Uuid>("", column) {
        return Ok(value);
    }
    if let Ok(value) = row.try_get::<Vec<u8>>("", column) {
        return Uuid::from_slice(&value)
            .map_err(|_| NetstoreError::storage("invalid uuid length"));
    }
    Err(NetstoreError::storage("unsupported uuid format"))
}

pub(crate) fn read_string_set(
    rows: &[QueryResult],
    column: impl sea_query::Iden,
) -> NetstoreResult<BTreeSet<String>> {
    let name = col_name(column);
    rows.iter()
        .map(|row| row.try_get::<String>("", &name).map_err(NetstoreError::from))
        .collect()
}

/// Typed bind value of a mapped column; NULLs carry the column type.
pub(crate) fn value_to_sea(value_type: ValueType, value: Value) -> SeaValue {
    match (value_type, value) {
        (ValueType::Str | ValueType::Json, Value::Null) => SeaValue::String(None),
        (ValueType::I64, Value::Null) => SeaValue::BigInt(None),
        (ValueType::F64, Value::Null) => SeaValue::Double(None),
        (ValueType::Bool, Value::Null) => SeaValue::Bool(None),
        (_, Value::Str(value)) => value.into(),
        (_, Value::I64(value)) => value.into(),
        (_, Value::F64(value)) => value.into(),
        (_, Value::Bool(value)) => value.into(),
        (_, Value::Json(value)) => value.to_string().into(),
    }
}

pub(crate) fn read_value(
    value_type: ValueType,
    row: &QueryResult,
    column: &str,
) -> NetstoreResult<Value> {
    let value = match value_type {
        ValueType::Str => row.try_get::<Option<String>>("", column)?.map(Value::Str),
        ValueType::I64 => row.try_get::<Option<i64>>("", column)?.map(Value::I64),
        ValueType::F64 => row.try_get::<Option<f64>>("", column)?.map(Value::F64),
        ValueType::Bool => row.try_get::<Option<bool>>("", column)?.map(Value::Bool),
        ValueType::Json => row
            .try_get::<Option<String>>("", column)?
            .map(|raw| serde_json::from_str(&raw).map_err(NetstoreError::codec))
            .transpose()?
            .map(Value::Json),
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Bind values of every mapped column, in mapping order.
pub(crate) fn mapped_values<T: Default + 'static>(
    mapping: &TableMapping<T>,
    attributes: &T,
) -> NetstoreResult<Vec<SeaValue>> {
    mapping
        .columns()
        .iter()
        .map(|column| Ok(value_to_sea(column.value_type(), column.get(attributes)?)))
        .collect()
}

pub(crate) fn read_mapped<T: Default + 'static>(
    mapping: &TableMapping<T>,
    row: &QueryResult,
) -> NetstoreResult<T> {
    let mut attributes = mapping.new_attributes();
    for column in mapping.columns() {
        let value = read_value(column.value_type(), row, column.name())?;
        column.set(&mut attributes, value)?;
    }
    Ok(attributes)
}

pub(crate) fn query_error(err: impl Display) -> NetstoreError {
    NetstoreError::storage(format!("query build: {err}"))
}

pub(crate) fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

pub(crate) async fn exec<C, S>(conn: &C, stmt: &S) -> NetstoreResult<u64>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn query_all<C, S>(conn: &C, stmt: &S) -> NetstoreResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

pub(crate) async fn query_one<C, S>(conn: &C, stmt: &S) -> NetstoreResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one_raw(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

fn build_connection_url(config: &NetstoreConfig, base_dir: &Path) -> NetstoreResult<String> {
    match &config.database {
        DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        DatabaseConfig::Postgres { url } | DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::DatabaseBackend;
    use sea_orm::sea_query::Value as SeaValue;
    use tempfile::tempdir;
    use uuid::Uuid;

    use super::{NetworkStore, uuid_value, value_to_sea};
    use netstore_core::{NetworkApi, Value, ValueType};

    #[tokio::test]
    async fn opening_a_directory_creates_config_and_database() {
        let dir = tempdir().expect("tempdir");
        let store = NetworkStore::open(dir.path()).await.expect("open store");
        assert!(dir.path().join("netstore.json").exists());
        assert!(dir.path().join("netstore.sqlite").exists());
        assert!(store.get_networks().await.expect("networks").is_empty());
        assert_eq!(store.chunk_size(4), 1000);
    }

    #[test]
    fn uuids_bind_per_backend() {
        let uuid = Uuid::new_v4();
        assert_eq!(
            uuid_value(DatabaseBackend::Sqlite, uuid),
            SeaValue::String(Some(uuid.to_string()))
        );
        assert_eq!(
            uuid_value(DatabaseBackend::Postgres, uuid),
            SeaValue::Uuid(Some(uuid))
        );
        assert_eq!(
            uuid_value(DatabaseBackend::MySql, uuid),
            SeaValue::Bytes(Some(uuid.as_bytes().to_vec()))
        );
    }

    #[test]
    fn nulls_keep_the_column_type() {
        assert_eq!(
            value_to_sea(ValueType::F64, Value::Null),
            SeaValue::Double(None)
        );
        assert_eq!(
            value_to_sea(ValueType::Json, Value::Json(serde_json::json!({"a": 1}))),
            SeaValue::String(Some("{\"a\":1}".to_string()))
        );
    }
}
