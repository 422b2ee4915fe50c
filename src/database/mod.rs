pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoDB;

use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{de::DeserializeOwned, Serialize};

pub const USERS: &str = "users";
pub const POSTS: &str = "posts";
pub const COMMENTS: &str = "comments";
pub const CATEGORIES: &str = "categories";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    DuplicateKey(String),
    #[error("Database error: {0}")]
    Backend(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Unsupported update operator: {0}")]
    UnsupportedOperator(String),
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(err: bson::de::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Collection-oriented persistence used by every service.
///
/// Filters are equality matches on top-level fields (an array field matches
/// when it contains the value). Updates use `$set`, `$addToSet` and `$pull`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError>;

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError>;

    async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError>;

    /// Returns whether a document matched the filter.
    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<bool, StoreError>;

    /// Returns whether a document was removed.
    async fn delete_one(&self, collection: &str, filter: Document) -> Result<bool, StoreError>;

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    Ok(bson::to_document(value)?)
}

pub async fn find_one_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: Document,
) -> Result<Option<T>, StoreError> {
    match store.find_one(collection, filter).await? {
        Some(document) => Ok(Some(bson::from_document(document)?)),
        None => Ok(None),
    }
}

pub async fn find_many_as<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    filter: Document,
) -> Result<Vec<T>, StoreError> {
    store
        .find_many(collection, filter)
        .await?
        .into_iter()
        .map(|document| bson::from_document(document).map_err(StoreError::from))
        .collect()
}
