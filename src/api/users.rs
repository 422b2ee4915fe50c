use actix_web::{web, HttpResponse};

use crate::middleware::auth::Claims;
use crate::models::{LoginRequest, LoginResponse, ProfileUpdate, PublicProfile, RegisterRequest, RegisterResponse, UserProfile};
use crate::services::user_service::{self, FollowOutcome, UnfollowOutcome};
use crate::state::AppState;
use crate::utils::ApiResult;

#[utoipa::path(
    post,
    path = "/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Missing fields or username already exists")
    )
)]
pub async fn register(
    state: web::Data<AppState>,
    request: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let username = request.username.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /register - username: {}", username);

    let response = user_service::register(state.store(), &state.credentials, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Registration failed: {} - {}", username, e))?;

    Ok(HttpResponse::Created().json(response))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let username = request.username.as_deref().unwrap_or("N/A");
    log::info!("🔐 POST /login - username: {}", username);

    let response = user_service::authenticate(state.store(), &state.credentials, &state.tokens, &request)
        .await
        .inspect_err(|e| log::warn!("❌ Login failed: {} - {}", username, e))?;

    log::info!("✅ Login successful: {}", username);
    Ok(HttpResponse::Ok().json(response))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Users",
    responses(
        (status = 200, description = "Caller's profile", body = UserProfile),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_profile(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
) -> ApiResult<HttpResponse> {
    let profile = user_service::get_profile(state.store(), &user.sub).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": profile
    })))
}

#[utoipa::path(
    put,
    path = "/profile",
    tag = "Users",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "No fields or a field that cannot be changed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "User no longer exists")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    update: web::Json<ProfileUpdate>,
) -> ApiResult<HttpResponse> {
    log::info!("✏️  PUT /profile - user: {}", user.sub);

    let profile = user_service::update_profile(state.store(), &user.sub, &update).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": profile
    })))
}

#[utoipa::path(
    post,
    path = "/users/{id}/follow",
    tag = "Users",
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Followed successfully"),
        (status = 400, description = "Already following, or self-follow"),
        (status = 404, description = "Either user does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn follow(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let target_id = path.into_inner();
    log::info!("👥 POST /users/{}/follow - user: {}", target_id, user.sub);

    let response = match user_service::follow(state.store(), &user.sub, &target_id).await? {
        FollowOutcome::Followed => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Followed successfully"
        })),
        FollowOutcome::AlreadyFollowing => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Already following"
        })),
    };

    Ok(response)
}

#[utoipa::path(
    post,
    path = "/users/{id}/unfollow",
    tag = "Users",
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Unfollowed successfully"),
        (status = 400, description = "Not following this user"),
        (status = 404, description = "Either user does not exist")
    ),
    security(("bearer_auth" = []))
)]
pub async fn unfollow(
    state: web::Data<AppState>,
    user: web::ReqData<Claims>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let target_id = path.into_inner();
    log::info!("👥 POST /users/{}/unfollow - user: {}", target_id, user.sub);

    let response = match user_service::unfollow(state.store(), &user.sub, &target_id).await? {
        UnfollowOutcome::Unfollowed => HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Unfollowed successfully"
        })),
        UnfollowOutcome::NotFollowing => HttpResponse::BadRequest().json(serde_json::json!({
            "success": false,
            "message": "Not following this user"
        })),
    };

    Ok(response)
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let profile = user_service::get_public_profile(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "user": profile
    })))
}

#[utoipa::path(
    get,
    path = "/users/{id}/followers",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Users following this user", body = [PublicProfile]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_followers(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let followers = user_service::list_followers(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": followers.len(),
        "followers": followers
    })))
}

#[utoipa::path(
    get,
    path = "/users/{id}/following",
    tag = "Users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Users this user follows", body = [PublicProfile]),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_following(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let following = user_service::list_following(state.store(), &path).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "total": following.len(),
        "following": following
    })))
}
