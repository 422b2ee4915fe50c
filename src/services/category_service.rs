use mongodb::bson::doc;

use crate::database::{self, DocumentStore, StoreError, CATEGORIES, POSTS};
use crate::models::{Category, CategoryResponse, CreateCategoryRequest};
use crate::utils::{non_blank, parse_object_id, ApiError, ApiResult};

pub async fn list_categories(store: &dyn DocumentStore) -> ApiResult<Vec<CategoryResponse>> {
    let mut categories = database::find_many_as::<Category>(store, CATEGORIES, doc! {}).await?;
    categories.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(categories.into_iter().map(CategoryResponse::from).collect())
}

/// Fails with `Validation` when the id does not name an existing category.
pub async fn ensure_exists(store: &dyn DocumentStore, category_id: &str) -> ApiResult<()> {
    let id = parse_object_id(category_id, "Category")
        .map_err(|_| ApiError::validation("Unknown category"))?;
    match store.find_one(CATEGORIES, doc! { "_id": id }).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::validation("Unknown category")),
    }
}

pub async fn create_category(
    store: &dyn DocumentStore,
    request: &CreateCategoryRequest,
) -> ApiResult<CategoryResponse> {
    let name = non_blank(request.name.as_deref())
        .ok_or_else(|| ApiError::validation("Category name is required"))?;

    if store.find_one(CATEGORIES, doc! { "name": name }).await?.is_some() {
        return Err(ApiError::Conflict("Category already exists".to_string()));
    }

    let mut category = Category {
        id: None,
        name: name.to_string(),
        description: request.description.clone().unwrap_or_default(),
    };

    let id = match store.insert_one(CATEGORIES, database::to_document(&category)?).await {
        Ok(id) => id,
        Err(StoreError::DuplicateKey(_)) => {
            return Err(ApiError::Conflict("Category already exists".to_string()))
        }
        Err(e) => return Err(e.into()),
    };
    category.id = Some(id);

    log::info!("🏷️  Category created: {} ({})", category.name, id.to_hex());
    Ok(CategoryResponse::from(category))
}

/// Refused while any post is still filed under the category.
pub async fn delete_category(store: &dyn DocumentStore, category_id: &str) -> ApiResult<()> {
    let id = parse_object_id(category_id, "Category")?;
    if store.find_one(POSTS, doc! { "category_id": id.to_hex() }).await?.is_some() {
        return Err(ApiError::Conflict("Category is still used by posts".to_string()));
    }
    if !store.delete_one(CATEGORIES, doc! { "_id": id }).await? {
        return Err(ApiError::not_found("Category not found"));
    }

    log::info!("🗑️ Category deleted: {}", id.to_hex());
    Ok(())
}
