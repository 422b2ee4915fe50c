use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{CreatePostRequest, PostQuery, PostResponse, UpdatePostRequest};
use crate::services::post_service;
use crate::state::AppState;
use crate::utils::ApiResult;

#[utoipa::path(
    get,
    path = "/posts",
    tag = "Posts",
    params(PostQuery),
    responses((status = 200, description = "Posts, newest first", body = [PostResponse]))
)]
pub async fn list_posts(state: web::Data<AppState>, query: web::Query<PostQuery>) -> ApiResult<HttpResponse> {
    let posts = post_service::list_posts(state.store(), &query).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": posts.len(),
        "posts": posts
    })))
}

#[utoipa::path(
    post,
    path = "/posts",
    tag = "Posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Missing title/content or unknown category"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    request: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    log::info!("📝 POST /posts - author: {}", user.sub);

    let post = post_service::create_post(state.store(), &user.sub, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "post": post
    })))
}

#[utoipa::path(
    get,
    path = "/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post found", body = PostResponse),
        (status = 404, description = "Post not found")
    )
)]
pub async fn get_post(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let post = post_service::find_post(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "post": PostResponse::from(post)
    })))
}

#[utoipa::path(
    put,
    path = "/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 400, description = "No fields, blank fields or unknown category"),
        (status = 403, description = "Caller is not the author"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_post(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<UpdatePostRequest>,
) -> ApiResult<HttpResponse> {
    log::info!("✏️  PUT /posts/{} - user: {}", path, user.sub);

    let post = post_service::update_post(state.store(), &user, &path, &request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "post": post
    })))
}

#[utoipa::path(
    delete,
    path = "/posts/{id}",
    tag = "Posts",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post and its comments deleted"),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    log::info!("🗑️ DELETE /posts/{} - user: {}", path, user.sub);

    post_service::delete_post(state.store(), &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Post deleted successfully"
    })))
}
