pub mod category_service;
pub mod comment_service;
pub mod credential_service;
pub mod post_service;
pub mod token_service;
pub mod user_service;

pub use credential_service::CredentialService;
pub use token_service::{Claims, TokenService};
