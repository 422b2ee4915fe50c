use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{CommentResponse, CreateCommentRequest};
use crate::services::comment_service;
use crate::state::AppState;
use crate::utils::ApiResult;

#[utoipa::path(
    get,
    path = "/posts/{id}/comments",
    tag = "Comments",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Comments, oldest first", body = [CommentResponse]),
        (status = 404, description = "Post not found")
    )
)]
pub async fn list_comments(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let comments = comment_service::list_comments(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": comments.len(),
        "comments": comments
    })))
}

#[utoipa::path(
    post,
    path = "/posts/{id}/comments",
    tag = "Comments",
    params(("id" = String, Path, description = "Post id")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Missing content"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn add_comment(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let comment = comment_service::add_comment(state.store(), &user.sub, &path, &request).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "success": true,
        "comment": comment
    })))
}

#[utoipa::path(
    delete,
    path = "/comments/{id}",
    tag = "Comments",
    params(("id" = String, Path, description = "Comment id")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    comment_service::delete_comment(state.store(), &user, &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Comment deleted successfully"
    })))
}
