use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header::AUTHORIZATION, Method},
    web, Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::future::{ready, Ready};

pub use crate::services::token_service::Claims;
use crate::models::Role;
use crate::state::AppState;
use crate::utils::ApiError;

/// Verifies the bearer token and stores its [`Claims`] in the request
/// extensions, where handlers read them through `web::ReqData<Claims>`.
#[derive(Clone, Copy)]
pub struct AuthMiddleware {
    required_role: Option<Role>,
    public_reads: bool,
}

impl AuthMiddleware {
    /// Any valid token
    pub fn required() -> Self {
        Self {
            required_role: None,
            public_reads: false,
        }
    }

    /// Valid token with the admin role
    pub fn admin() -> Self {
        Self {
            required_role: Some(Role::Admin),
            public_reads: false,
        }
    }

    /// Lets GET and HEAD through without a token.
    pub fn writes_only(mut self) -> Self {
        self.public_reads = true;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            policy: *self,
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    policy: AuthMiddleware,
}

/// Token from `Authorization: Bearer <token>`
pub fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    let header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("Bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

fn authorize(req: &ServiceRequest, required_role: Option<Role>) -> Result<Claims, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("AppState not registered".to_string()))?;

    let token = bearer_token(req)
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization token".to_string()))?;

    let claims = state.tokens.verify(token)?;

    if let Some(role) = required_role {
        if claims.role != role {
            log::warn!("⛔ {} {} denied for {} (role {})", req.method(), req.path(), claims.sub, claims.role);
            return Err(ApiError::forbidden("Insufficient permissions"));
        }
    }

    Ok(claims)
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let is_read = matches!(*req.method(), Method::GET | Method::HEAD);
        if self.policy.public_reads && is_read {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        match authorize(&req, self.policy.required_role) {
            Ok(claims) => {
                req.extensions_mut().insert(claims);
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                if matches!(e, ApiError::Unauthorized(_)) {
                    log::warn!("🔒 {} {} rejected: {}", req.method(), req.path(), e);
                }
                // Short-circuit: the wrapped handler never runs
                let res = req.into_response(e.error_response()).map_into_right_body();
                Box::pin(async move { Ok(res) })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::{CredentialService, TokenService};
    use actix_web::{test, App, HttpResponse};
    use std::sync::Arc;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState::new(
            Arc::new(MemoryStore::new()),
            TokenService::new("test-secret", "blog-service", 24),
            CredentialService::new(4),
        ))
    }

    async fn whoami(claims: web::ReqData<Claims>) -> HttpResponse {
        HttpResponse::Ok().body(claims.sub.clone())
    }

    async fn ok() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[actix_web::test]
    async fn test_missing_and_garbage_tokens_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(state())
                .service(web::resource("/me").wrap(AuthMiddleware::required()).route(web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get().uri("/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Bearer nope"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 401);

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 401);
    }

    #[actix_web::test]
    async fn test_valid_token_injects_subject() {
        let state = state();
        let token = state.tokens.issue("64b7f0c2a1b2c3d4e5f60718", Role::Viewer).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::resource("/me").wrap(AuthMiddleware::required()).route(web::get().to(whoami))),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/me")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, web::Bytes::from_static(b"64b7f0c2a1b2c3d4e5f60718"));
    }

    #[actix_web::test]
    async fn test_admin_route_rejects_viewer() {
        let state = state();
        let viewer = state.tokens.issue("viewer-id", Role::Viewer).unwrap();
        let admin = state.tokens.issue("admin-id", Role::Admin).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state)
                .service(web::resource("/admin").wrap(AuthMiddleware::admin()).route(web::post().to(whoami))),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", viewer)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::post()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", admin)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);
    }

    #[actix_web::test]
    async fn test_writes_only_lets_reads_through() {
        let app = test::init_service(
            App::new().app_data(state()).service(
                web::resource("/posts")
                    .wrap(AuthMiddleware::required().writes_only())
                    .route(web::get().to(ok))
                    .route(web::post().to(whoami)),
            ),
        )
        .await;

        let req = test::TestRequest::get().uri("/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 200);

        let req = test::TestRequest::post().uri("/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 401);
    }
}
