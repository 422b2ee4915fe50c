use actix_web::{web, HttpResponse};

use crate::models::{CategoryResponse, CreateCategoryRequest};
use crate::services::category_service;
use crate::state::AppState;
use crate::utils::ApiResult;

#[utoipa::path(
    get,
    path = "/categories",
    tag = "Categories",
    responses((status = 200, description = "All categories by name", body = [CategoryResponse]))
)]
pub async fn list_categories(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let categories = category_service::list_categories(state.store()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": categories.len(),
        "categories": categories
    })))
}

#[utoipa::path(
    post,
    path = "/categories",
    tag = "Categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 400, description = "Missing name or duplicate category"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    state: web::Data<AppState>,
    request: web::Json<CreateCategoryRequest>,
) -> ApiResult<HttpResponse> {
    let category = category_service::create_category(state.store(), &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "category": category
    })))
}

#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = "Categories",
    params(("id" = String, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 400, description = "Category is still used by posts"),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    category_service::delete_category(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Category deleted successfully"
    })))
}
