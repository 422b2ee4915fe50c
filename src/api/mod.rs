pub mod admin;
pub mod categories;
pub mod comments;
pub mod health;
pub mod posts;
pub mod swagger;
pub mod users;

use actix_web::web;

use crate::middleware::AuthMiddleware;
use crate::utils::ApiError;

/// Registers every route with its access policy. Shared by `main` and the
/// HTTP tests so both exercise the same table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::validation(format!("Invalid request body: {}", err)).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::not_found(format!("Invalid path: {}", err)).into()),
    )
    .route("/", web::get().to(health::index))
    .route("/health", web::get().to(health::health_check))
    // Auth
    .route("/register", web::post().to(users::register))
    .route("/login", web::post().to(users::login))
    // Own profile
    .service(
        web::resource("/profile")
            .wrap(AuthMiddleware::required())
            .route(web::get().to(users::get_profile))
            .route(web::put().to(users::update_profile)),
    )
    // Follow graph
    .service(
        web::resource("/users/{id}/follow")
            .wrap(AuthMiddleware::required())
            .route(web::post().to(users::follow)),
    )
    .service(
        web::resource("/users/{id}/unfollow")
            .wrap(AuthMiddleware::required())
            .route(web::post().to(users::unfollow)),
    )
    .route("/users/{id}", web::get().to(users::get_user))
    .route("/users/{id}/followers", web::get().to(users::get_followers))
    .route("/users/{id}/following", web::get().to(users::get_following))
    // Admin
    .service(
        web::resource("/admin/users/{id}/role")
            .wrap(AuthMiddleware::admin())
            .route(web::put().to(admin::set_role)),
    )
    // Posts: public reads, authenticated writes
    .service(
        web::resource("/posts")
            .wrap(AuthMiddleware::required().writes_only())
            .route(web::get().to(posts::list_posts))
            .route(web::post().to(posts::create_post)),
    )
    .service(
        web::resource("/posts/{id}")
            .wrap(AuthMiddleware::required().writes_only())
            .route(web::get().to(posts::get_post))
            .route(web::put().to(posts::update_post))
            .route(web::delete().to(posts::delete_post)),
    )
    .service(
        web::resource("/posts/{id}/comments")
            .wrap(AuthMiddleware::required().writes_only())
            .route(web::get().to(comments::list_comments))
            .route(web::post().to(comments::add_comment)),
    )
    .service(
        web::resource("/comments/{id}")
            .wrap(AuthMiddleware::required())
            .route(web::delete().to(comments::delete_comment)),
    )
    // Categories: public reads, admin writes
    .service(
        web::resource("/categories")
            .wrap(AuthMiddleware::admin().writes_only())
            .route(web::get().to(categories::list_categories))
            .route(web::post().to(categories::create_category)),
    )
    .service(
        web::resource("/categories/{id}")
            .wrap(AuthMiddleware::admin())
            .route(web::delete().to(categories::delete_category)),
    );
}
