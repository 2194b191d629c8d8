use super::{Collection, DocumentStore, Filter};
use crate::error::StorageError;
use crate::schema::{Announcement, League, Record, Registration};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Key under which a document's identifier is rendered on read
pub const ID_FIELD: &str = "_id";

/// Record kinds that are persisted, and where.
pub trait Stored: Record {
    const COLLECTION: Collection;
}

impl Stored for League {
    const COLLECTION: Collection = Collection::League;
}

impl Stored for Registration {
    const COLLECTION: Collection = Collection::Registration;
}

impl Stored for Announcement {
    const COLLECTION: Collection = Collection::Announcement;
}

/// Maps validated records to stored documents and back.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn DocumentStore>,
}

impl Gateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    /// Stores `record` under a fresh identifier and returns that identifier.
    pub async fn create_document<R>(
        &self,
        collection: Collection,
        record: &R,
    ) -> Result<String, StorageError>
    where
        R: Serialize + ?Sized,
    {
        let mut body = match serde_json::to_value(record) {
            Ok(Value::Object(body)) => body,
            Ok(_) => {
                return Err(StorageError::NotAnObject {
                    collection: collection.to_string(),
                })
            }
            Err(e) => return Err(StorageError::Internal(e.to_string())),
        };

        // The store owns identity
        body.remove(ID_FIELD);
        body.remove("id");

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        body.insert("created_at".to_string(), Value::String(now.clone()));
        body.insert("updated_at".to_string(), Value::String(now));

        let id = Uuid::new_v4().to_string();
        self.store.insert(collection, &id, body).await?;

        debug!("Created document {} in {}", id, collection);
        Ok(id)
    }

    /// Every document in `collection` matching `filter`, each carrying its
    /// identifier as a string under `_id`.
    pub async fn get_documents(
        &self,
        collection: Collection,
        filter: Option<Filter>,
    ) -> Result<Vec<Map<String, Value>>, StorageError> {
        let documents = self.store.find(collection, filter.as_ref()).await?;

        debug!("Read {} documents from {}", documents.len(), collection);

        Ok(documents
            .into_iter()
            .map(|doc| {
                let mut body = doc.body;
                body.insert(ID_FIELD.to_string(), Value::String(doc.id));
                body
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn gateway() -> (Arc<MemoryStore>, Gateway) {
        let store = Arc::new(MemoryStore::new("test"));
        (store.clone(), Gateway::new(store))
    }

    #[test]
    fn test_create_then_list() {
        let (_, gateway) = gateway();
        let reg = Registration::validate(&json!({
            "full_name": "Jo Lee",
            "email": "jo@example.com",
            "free_agent": true
        }))
        .unwrap();

        let docs = tokio_test::block_on(async {
            let id = gateway.create_document(Registration::COLLECTION, &reg).await.unwrap();
            assert!(!id.is_empty());

            let docs = gateway.get_documents(Registration::COLLECTION, None).await.unwrap();
            assert_eq!(docs[0][ID_FIELD], Value::String(id));
            docs
        });

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["full_name"], "Jo Lee");
        assert_eq!(docs[0]["email"], "jo@example.com");
        assert_eq!(docs[0]["free_agent"], true);
        assert!(docs[0]["created_at"].is_string());
        assert_eq!(docs[0]["created_at"], docs[0]["updated_at"]);
    }

    #[test]
    fn test_identifier_fields_are_not_business_fields() {
        let (store, gateway) = gateway();
        let payload = json!({"_id": "mine", "id": 7, "name": "x"});

        tokio_test::block_on(async {
            let id = gateway.create_document(Collection::League, &payload).await.unwrap();
            assert_ne!(id, "mine");

            let stored = store.find(Collection::League, None).await.unwrap();
            assert!(stored[0].body.get("_id").is_none());
            assert!(stored[0].body.get("id").is_none());
        });
    }

    #[test]
    fn test_identifiers_are_unique() {
        let (_, gateway) = gateway();
        let a = Announcement::validate(&json!({"title": "t", "message": "m"})).unwrap();

        let (first, second) = tokio_test::block_on(async {
            let first = gateway.create_document(Collection::Announcement, &a).await.unwrap();
            let second = gateway.create_document(Collection::Announcement, &a).await.unwrap();
            (first, second)
        });
        assert_ne!(first, second);
    }

    #[test]
    fn test_non_object_record_rejected() {
        let (store, gateway) = gateway();
        let result = tokio_test::block_on(gateway.create_document(Collection::League, &json!([1, 2])));
        assert!(matches!(result, Err(StorageError::NotAnObject { .. })));
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn test_filter_without_matches() {
        let (_, gateway) = gateway();
        let docs = tokio_test::block_on(
            gateway.get_documents(Collection::Announcement, Some(Filter::eq("published", true))),
        )
        .unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_store_failure_propagates() {
        let (store, gateway) = gateway();
        store.set_available(false);
        let league = League::validate(&json!({"name": "L"})).unwrap();

        let result = tokio_test::block_on(gateway.create_document(Collection::League, &league));
        assert!(matches!(result, Err(StorageError::ConnectionFailed { .. })));
    }
}
