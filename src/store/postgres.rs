use super::{Collection, DocumentStore, Filter, StoredDocument};
use crate::config::Config;
use crate::error::StorageError;
use async_trait::async_trait;
use deadpool_postgres::{Config as PoolConfig, Object, Pool, Runtime};
use serde_json::{Map, Value};
use std::time::Duration;
use tokio_postgres::types::ToSql;
use tokio_postgres::NoTls;
use tracing::{debug, info};

/// Collections stored as PostgreSQL tables, one JSONB document per row.
pub struct PostgresStore {
    pool: Pool,
    database: String,
}

impl PostgresStore {
    pub async fn connect(config: &Config) -> Result<Self, StorageError> {
        let base_url = config.connection_url();
        let url = match config.database_name.as_deref() {
            Some(name) => database_url_for(base_url, name)?,
            None => base_url.to_string(),
        };

        let pool = create_pool(&url, config.max_connections)?;
        let store = Self {
            pool,
            database: redact(&url),
        };

        // Simple ping, and learn which database we actually landed in
        let client = store.client().await?;
        let row = client
            .query_one("SELECT current_database()", &[])
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                database: store.database.clone(),
                cause: format!("Ping failed: {}", e),
            })?;
        let database: String = row.get(0);
        drop(client);

        info!("Connected to PostgreSQL database {}", database);

        Ok(Self { database, ..store })
    }

    async fn client(&self) -> Result<Object, StorageError> {
        self.pool
            .get()
            .await
            .map_err(|e| StorageError::ConnectionFailed {
                database: self.database.clone(),
                cause: e.to_string(),
            })
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn ensure_collection(&self, collection: Collection) -> Result<(), StorageError> {
        // DDL takes no parameters, so the name goes in verbatim
        let table = collection.checked_name()?;
        let client = self.client().await?;

        let sql = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" (
                id TEXT PRIMARY KEY,
                body JSONB NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"
        );
        client
            .batch_execute(&sql)
            .await
            .map_err(|e| query_failed(collection, e))?;

        debug!("Ensured collection table {}", table);
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<(), StorageError> {
        let table = collection.checked_name()?;
        let client = self.client().await?;

        let body = Value::Object(body);
        let sql = format!("INSERT INTO \"{table}\" (id, body) VALUES ($1, $2)");
        client
            .execute(&sql, &[&id, &body])
            .await
            .map_err(|e| query_failed(collection, e))?;

        Ok(())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        let table = collection.checked_name()?;
        let client = self.client().await?;

        let rows = match filter {
            Some(filter) => {
                // jsonb equality, so true never matches "true"
                let sql = format!(
                    "SELECT id, body FROM \"{table}\" WHERE body -> $1::text = $2::jsonb ORDER BY inserted_at, id"
                );
                let params: [&(dyn ToSql + Sync); 2] = [&filter.field, &filter.value];
                client.query(&sql, &params).await
            }
            None => {
                let sql = format!("SELECT id, body FROM \"{table}\" ORDER BY inserted_at, id");
                client.query(&sql, &[]).await
            }
        }
        .map_err(|e| query_failed(collection, e))?;

        rows.iter()
            .map(|row| {
                let id: String = row.get("id");
                match row.get::<_, Value>("body") {
                    Value::Object(body) => Ok(StoredDocument { id, body }),
                    _ => Err(StorageError::NotAnObject {
                        collection: collection.to_string(),
                    }),
                }
            })
            .collect()
    }

    async fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        let client = self.client().await?;

        let rows = client
            .query(
                "SELECT table_name::text FROM information_schema.tables
                 WHERE table_schema = current_schema() ORDER BY table_name",
                &[],
            )
            .await?;

        Ok(rows.iter().map(|row| row.get(0)).collect())
    }

    async fn close(&self) {
        self.pool.close();
        info!("Closed PostgreSQL pool for {}", self.database);
    }
}

fn create_pool(database_url: &str, max_size: u32) -> Result<Pool, StorageError> {
    let mut cfg = PoolConfig::new();
    cfg.url = Some(database_url.to_string());

    cfg.pool = Some(deadpool_postgres::PoolConfig {
        max_size: max_size as usize,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(5)),
            recycle: Some(Duration::from_secs(5)),
        },
        ..Default::default()
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| StorageError::Internal(format!("Failed to create pool: {}", e)))
}

fn query_failed(collection: Collection, err: tokio_postgres::Error) -> StorageError {
    StorageError::QueryFailed {
        collection: collection.to_string(),
        cause: err.to_string(),
    }
}

/// Points `base_url` at database `db_name`, keeping any query string.
fn database_url_for(base_url: &str, db_name: &str) -> Result<String, StorageError> {
    let (without_query, query) = match base_url.split_once('?') {
        Some((url, query)) => (url, Some(query)),
        None => (base_url, None),
    };

    // Replace everything after the last '/' that follows the authority
    let authority_start = without_query.find("://").map(|i| i + 3).unwrap_or(0);
    match without_query[authority_start..].rfind('/') {
        Some(slash) => {
            let base = &without_query[..authority_start + slash + 1];
            Ok(match query {
                Some(query) => format!("{}{}?{}", base, db_name, query),
                None => format!("{}{}", base, db_name),
            })
        }
        None if authority_start > 0 => Ok(match query {
            Some(query) => format!("{}/{}?{}", without_query, db_name, query),
            None => format!("{}/{}", without_query, db_name),
        }),
        None => Err(StorageError::Internal(format!(
            "Invalid DATABASE_URL format: {}",
            redact(base_url)
        ))),
    }
}

/// Drops credentials from a connection string before it reaches a log or a client.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}***{}", &url[..scheme_end + 3], &url[at..])
        }
        _ => url.to_string(),
    }
}
