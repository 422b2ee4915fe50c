use async_trait::async_trait;
use futures::stream::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use std::error::Error;

use super::{DocumentStore, StoreError, CATEGORIES, COMMENTS, POSTS, USERS};

const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoDB {
    db: Database,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, Box<dyn Error>> {
        let mut client_options = mongodb::options::ClientOptions::parse(uri).await?;

        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let client = Client::with_options(client_options)?;

        // Extract database name from URI or use default
        let db_name = uri
            .rsplit('/')
            .next()
            .and_then(|s| s.split('?').next())
            .filter(|s| !s.is_empty() && !s.contains(':'))
            .unwrap_or("blog_app");

        let db = client.database(db_name);

        // Test connection
        db.list_collection_names().await?;

        let mongodb = Self { db };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the unique and lookup indexes the services rely on
    async fn ensure_indexes(&self) -> Result<(), Box<dyn Error>> {
        log::info!("🔧 Creating database indexes...");

        let unique = || IndexOptions::builder().unique(true).build();

        let indexes: Vec<(&str, IndexModel)> = vec![
            (
                USERS,
                IndexModel::builder()
                    .keys(doc! { "username": 1 })
                    .options(unique())
                    .build(),
            ),
            (
                CATEGORIES,
                IndexModel::builder()
                    .keys(doc! { "name": 1 })
                    .options(unique())
                    .build(),
            ),
            (POSTS, IndexModel::builder().keys(doc! { "author_id": 1 }).build()),
            (POSTS, IndexModel::builder().keys(doc! { "category_id": 1 }).build()),
            (COMMENTS, IndexModel::builder().keys(doc! { "post_id": 1 }).build()),
        ];

        for (collection, index) in indexes {
            let keys = index.keys.clone();
            match self.collection(collection).create_index(index).await {
                Ok(_) => log::info!("   ✅ Index ready: {}({})", collection, keys),
                // Username uniqueness depends on this index
                Err(e) if collection == USERS => return Err(Box::new(e)),
                Err(e) => log::debug!("   ℹ️  Index not created on {}: {}", collection, e),
            }
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.db.collection(name)
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY_CODE
    )
}

fn map_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::DuplicateKey(format!("Duplicate key in {}", collection))
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[async_trait]
impl DocumentStore for MongoDB {
    async fn insert_one(&self, collection: &str, document: Document) -> Result<ObjectId, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(document)
            .await
            .map_err(|e| map_error(collection, e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Backend("Inserted id is not an ObjectId".to_string()))
    }

    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one(filter)
            .await
            .map_err(|e| map_error(collection, e))
    }

    async fn find_many(&self, collection: &str, filter: Document) -> Result<Vec<Document>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .await
            .map_err(|e| map_error(collection, e))?;

        cursor.try_collect().await.map_err(|e| map_error(collection, e))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(result.matched_count > 0)
    }

    async fn delete_one(&self, collection: &str, filter: Document) -> Result<bool, StoreError> {
        let result = self
            .collection(collection)
            .delete_one(filter)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(result.deleted_count > 0)
    }

    async fn delete_many(&self, collection: &str, filter: Document) -> Result<u64, StoreError> {
        let result = self
            .collection(collection)
            .delete_many(filter)
            .await
            .map_err(|e| map_error(collection, e))?;

        Ok(result.deleted_count)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.db
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn test_mongodb_connection() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/blog_app_test".to_string());

        let db = MongoDB::new(&uri).await.unwrap();
        assert!(db.health_check().await.is_ok());
    }
}
