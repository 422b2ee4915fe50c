use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::RwLock;

use super::{DocumentStore, StoreError};

/// In-process document store for local runs and tests.
///
/// Mirrors the subset of MongoDB semantics the services use, including
/// unique indexes registered with [`MemoryStore::with_unique_index`].
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    unique_fields: HashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_unique_index(mut self, collection: &str, field: &str) -> Self {
        self.unique_fields
            .entry(collection.to_string())
            .or_default()
            .push(field.to_string());
        self
    }

    /// Store with the same unique indexes the MongoDB backend creates.
    pub fn with_default_indexes() -> Self {
        Self::new()
            .with_unique_index(super::USERS, "username")
            .with_unique_index(super::CATEGORIES, "name")
    }

    fn check_unique(
        &self,
        collection: &str,
        documents: &[Document],
        candidate: &Document,
        skip: Option<usize>,
    ) -> Result<(), StoreError> {
        let Some(fields) = self.unique_fields.get(collection) else {
            return Ok(());
        };

        for field in fields {
            let Some(value) = candidate.get(field) else {
                continue;
            };
            let taken = documents
                .iter()
                .enumerate()
                .filter(|(idx, _)| Some(*idx) != skip)
                .any(|(_, doc)| doc.get(field) == Some(value));
            if taken {
                return Err(StoreError::DuplicateKey(format!(
                    "Duplicate key in {}: {}",
                    collection, field
                )));
            }
        }

        Ok(())
    }
}

fn filter_matches(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, expected)| match document.get(key) {
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => items.contains(expected),
        Some(actual) => actual == expected,
        None => matches!(expected, Bson::Null),
    })
}

fn apply_update(document: &mut Document, update: &Document) -> Result<(), StoreError> {
    for (operator, fields) in update {
        let fields = fields
            .as_document()
            .ok_or_else(|| StoreError::UnsupportedOperator(format!("{} expects a document", operator)))?;

        match operator.as_str() {
            "$set" => {
                for (key, value) in fields {
                    document.insert(key.clone(), value.clone());
                }
            }
            "$addToSet" => {
                for (key, value) in fields {
                    match document.get_mut(key) {
                        Some(Bson::Array(items)) => {
                            if !items.contains(value) {
                                items.push(value.clone());
                            }
                        }
                        Some(_) => {
                            return Err(StoreError::Backend(format!("{} is not an array", key)))
                        }
                        None => {
                            document.insert(key.clone(), Bson::Array(vec![value.clone()]));
                        }
                    }
                }
            }
            "$pull" => {
                for (key, value) in fields {
                    if let Some(Bson::Array(items)) = document.get_mut(key) {
                        items.retain(|item| item != value);
                    }
                }
            }
            other => return Err(StoreError::UnsupportedOperator(other.to_string())),
        }
    }

    Ok(())
}

impl MemoryStore {
    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, Vec<Document>>>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, Vec<Document>>>, StoreError> {
        self.collections
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, mut document: Document) -> Result<ObjectId, StoreError> {
        let id = match document.get_object_id("_id") {
            Ok(id) => id,
            Err(_) => {
                let id = ObjectId::new();
                document.insert("_id", id);
                id
            }
        };

        let mut collections = self.write()?;
        let documents = collections.entry(collection.to_string()).or_default();
        if documents.iter().any(|doc| doc.get_object_id("_id").ok() == Some(id)) {
            return Err(StoreError::DuplicateKey(format!("Duplicate key in {}: _id", collection)));
        }
        self.check_unique(collection, documents, &document, None)?;
        documents.push(document);

        Ok(id)
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| filter_matches(doc, &filter)))
            .cloned())
    }

    async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter_matches(doc, &filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(idx) = documents.iter().position(|doc| filter_matches(doc, &filter)) else {
            return Ok(false);
        };

        let mut updated = documents[idx].clone();
        apply_update(&mut updated, &update)?;
        self.check_unique(collection, documents, &updated, Some(idx))?;
        documents[idx] = updated;

        Ok(true)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match documents.iter().position(|doc| filter_matches(doc, &filter)) {
            Some(idx) => {
                documents.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        let mut collections = self.write()?;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let before = documents.len();
        documents.retain(|doc| !filter_matches(doc, &filter));
        Ok((before - documents.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_add_to_set_and_pull_keep_set_semantics() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("users", doc! { "username": "alice", "following": [] })
            .await
            .unwrap();

        for _ in 0..2 {
            store
                .update_one("users", doc! { "_id": id }, doc! { "$addToSet": { "following": "bob" } })
                .await
                .unwrap();
        }
        let user = store.find_one("users", doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(user.get_array("following").unwrap().len(), 1);

        let by_member = store
            .find_many("users", doc! { "following": "bob" })
            .await
            .unwrap();
        assert_eq!(by_member.len(), 1);

        store
            .update_one("users", doc! { "_id": id }, doc! { "$pull": { "following": "bob" } })
            .await
            .unwrap();
        let user = store.find_one("users", doc! { "_id": id }).await.unwrap().unwrap();
        assert!(user.get_array("following").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_merges_fields() {
        let store = MemoryStore::new();
        let id = store
            .insert_one("users", doc! { "username": "alice", "bio": "" })
            .await
            .unwrap();

        let matched = store
            .update_one("users", doc! { "_id": id }, doc! { "$set": { "bio": "hello" } })
            .await
            .unwrap();
        assert!(matched);

        let user = store.find_one("users", doc! { "_id": id }).await.unwrap().unwrap();
        assert_eq!(user.get_str("bio").unwrap(), "hello");
        assert_eq!(user.get_str("username").unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_unique_index_rejects_duplicates() {
        let store = MemoryStore::with_default_indexes();
        store.insert_one("users", doc! { "username": "alice" }).await.unwrap();

        let result = store.insert_one("users", doc! { "username": "alice" }).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.find_many("users", doc! {}).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_on_missing_document_reports_no_match() {
        let store = MemoryStore::new();
        let matched = store
            .update_one("users", doc! { "_id": ObjectId::new() }, doc! { "$set": { "bio": "x" } })
            .await
            .unwrap();
        assert!(!matched);
    }

    #[tokio::test]
    async fn test_unknown_operator_is_rejected() {
        let store = MemoryStore::new();
        let id = store.insert_one("users", doc! { "n": 1 }).await.unwrap();
        let result = store
            .update_one("users", doc! { "_id": id }, doc! { "$inc": { "n": 1 } })
            .await;
        assert!(matches!(result, Err(StoreError::UnsupportedOperator(_))));
    }
}
