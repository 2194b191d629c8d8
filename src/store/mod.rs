//! Document store
//!
//! Documents are JSON objects grouped into named collections and addressed by
//! a generated string identifier. The [`DocumentStore`] trait is the seam
//! between the [`Gateway`] and a concrete backend:
//!
//! - [`PostgresStore`] keeps each collection in a table with a JSONB body
//! - [`MemoryStore`] keeps everything in process, for local runs and tests

mod gateway;
mod memory;
mod postgres;

pub use gateway::{Gateway, Stored, ID_FIELD};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use crate::config::{Config, StoreBackend};
use crate::error::StorageError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Where each served record kind lives. The only place collection names are
/// spelled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    League,
    Registration,
    Announcement,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::League,
        Collection::Registration,
        Collection::Announcement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::League => "league",
            Collection::Registration => "registration",
            Collection::Announcement => "announcement",
        }
    }

    /// Rejects names that cannot be used verbatim as a table name.
    pub fn checked_name(self) -> Result<&'static str, StorageError> {
        let name = self.name();
        if is_valid_identifier(name) {
            Ok(name)
        } else {
            Err(StorageError::InvalidCollection {
                name: name.to_string(),
            })
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Single field equality constraint
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, body: &Map<String, Value>) -> bool {
        body.get(&self.field) == Some(&self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub body: Map<String, Value>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database (or namespace) the store writes to
    fn database_name(&self) -> &str;

    /// Creates the backing storage for `collection` if it does not exist.
    async fn ensure_collection(&self, collection: Collection) -> Result<(), StorageError>;

    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<(), StorageError>;

    /// All documents in `collection` matching `filter`, oldest first.
    async fn find(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredDocument>, StorageError>;

    /// Names of every collection present in the database, sorted.
    async fn collection_names(&self) -> Result<Vec<String>, StorageError>;

    async fn close(&self) {}
}

/// Opens the configured backend and makes sure every collection exists.
pub async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>, StorageError> {
    let store: Arc<dyn DocumentStore> = match config.store_backend {
        StoreBackend::Postgres => Arc::new(PostgresStore::connect(config).await?),
        StoreBackend::Memory => {
            let name = config.database_name.as_deref().unwrap_or("league");
            Arc::new(MemoryStore::new(name))
        }
    };

    for collection in Collection::ALL {
        collection.checked_name()?;
        store.ensure_collection(collection).await?;
    }

    info!(
        "Document store ready: database={}, collections={:?}",
        store.database_name(),
        Collection::ALL.map(Collection::name)
    );

    Ok(store)
}

pub(crate) fn is_valid_identifier(name: &str) -> bool {
    if name.is_empty() || name.len() > 63 {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
