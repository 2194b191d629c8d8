use super::{Collection, DocumentStore, Filter, StoredDocument};
use crate::error::StorageError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};

/// In-process store. Contents vanish with the process.
pub struct MemoryStore {
    database: String,
    collections: DashMap<&'static str, Vec<StoredDocument>>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new(database: &str) -> Self {
        Self {
            database: database.to_string(),
            collections: DashMap::new(),
            available: AtomicBool::new(true),
        }
    }

    /// Makes every later call fail as if the store went away, or recover.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    /// Total documents across all collections
    pub fn document_count(&self) -> usize {
        self.collections.iter().map(|entry| entry.value().len()).sum()
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StorageError::ConnectionFailed {
                database: self.database.clone(),
                cause: "store is offline".to_string(),
            })
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn database_name(&self) -> &str {
        &self.database
    }

    async fn ensure_collection(&self, collection: Collection) -> Result<(), StorageError> {
        self.check_available()?;
        self.collections.entry(collection.name()).or_default();
        Ok(())
    }

    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        body: Map<String, Value>,
    ) -> Result<(), StorageError> {
        self.check_available()?;

        let mut documents = self.collections.entry(collection.name()).or_default();
        if documents.iter().any(|doc| doc.id == id) {
            return Err(StorageError::QueryFailed {
                collection: collection.to_string(),
                cause: format!("duplicate id {}", id),
            });
        }
        documents.push(StoredDocument {
            id: id.to_string(),
            body,
        });
        Ok(())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: Option<&Filter>,
    ) -> Result<Vec<StoredDocument>, StorageError> {
        self.check_available()?;

        let Some(documents) = self.collections.get(collection.name()) else {
            return Ok(Vec::new());
        };

        Ok(documents
            .iter()
            .filter(|doc| filter.map_or(true, |f| f.matches(&doc.body)))
            .cloned()
            .collect())
    }

    async fn collection_names(&self) -> Result<Vec<String>, StorageError> {
        self.check_available()?;

        let mut names: Vec<String> = self
            .collections
            .iter()
            .map(|entry| entry.key().to_string())
            .collect();
        names.sort();
        Ok(names)
    }
}
