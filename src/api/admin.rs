use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{RoleUpdate, UserProfile};
use crate::services::user_service;
use crate::state::AppState;
use crate::utils::ApiResult;

#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    tag = "Admin",
    params(("id" = String, Path, description = "User whose role changes")),
    request_body = RoleUpdate,
    responses(
        (status = 200, description = "Role updated", body = UserProfile),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_role(
    state: web::Data<AppState>,
    admin: web::ReqData<Claims>,
    path: web::Path<String>,
    request: web::Json<RoleUpdate>,
) -> ApiResult<HttpResponse> {
    log::info!("🔑 PUT /admin/users/{}/role - {} by {}", path, request.role, admin.sub);

    let profile = user_service::set_role(state.store(), &path, request.role).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": profile
    })))
}
