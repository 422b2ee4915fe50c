use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Blog Service API",
        version = "1.0.0",
        description = "REST API for a small blogging platform.\n\n**Authentication:** protected endpoints expect `Authorization: Bearer <token>` with a token from `POST /login`.\n\n**Roles:** `viewer` (default) and `admin`. Category management and role changes are admin-only."
    ),
    paths(
        // Auth
        crate::api::users::register,
        crate::api::users::login,

        // Health
        crate::api::health::health_check,

        // Users
        crate::api::users::get_profile,
        crate::api::users::update_profile,
        crate::api::users::follow,
        crate::api::users::unfollow,
        crate::api::users::get_user,
        crate::api::users::get_followers,
        crate::api::users::get_following,

        // Admin
        crate::api::admin::set_role,

        // Posts
        crate::api::posts::list_posts,
        crate::api::posts::create_post,
        crate::api::posts::get_post,
        crate::api::posts::update_post,
        crate::api::posts::delete_post,

        // Comments
        crate::api::comments::list_comments,
        crate::api::comments::add_comment,
        crate::api::comments::delete_comment,

        // Categories
        crate::api::categories::list_categories,
        crate::api::categories::create_category,
        crate::api::categories::delete_category,
    ),
    components(
        schemas(
            crate::models::Role,
            crate::models::RegisterRequest,
            crate::models::RegisterResponse,
            crate::models::LoginRequest,
            crate::models::LoginResponse,
            crate::models::ProfileUpdate,
            crate::models::RoleUpdate,
            crate::models::UserProfile,
            crate::models::PublicProfile,
            crate::models::CreatePostRequest,
            crate::models::UpdatePostRequest,
            crate::models::PostResponse,
            crate::models::CreateCommentRequest,
            crate::models::CommentResponse,
            crate::models::CreateCategoryRequest,
            crate::models::CategoryResponse,
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Registration and login. Login returns a signed bearer token."),
        (name = "Health", description = "Liveness and document store connectivity."),
        (name = "Users", description = "Own profile, public profiles and the follow graph."),
        (name = "Admin", description = "Role management. Admin only."),
        (name = "Posts", description = "Blog posts. Reads are public, writes need a token."),
        (name = "Comments", description = "Comments on posts."),
        (name = "Categories", description = "Post categories. Reads are public, writes are admin-only."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from POST /login"))
                        .build(),
                ),
            );
        }
    }
}
