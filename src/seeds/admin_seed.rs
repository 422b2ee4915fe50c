use crate::database::DocumentStore;
use crate::models::Role;
use crate::services::{user_service, CredentialService};
use crate::utils::ApiError;

/// Creates the bootstrap admin account unless a user with that name exists.
/// Failures are logged; the server still starts.
pub async fn seed_admin(store: &dyn DocumentStore, credentials: &CredentialService, username: &str, password: &str) {
    match user_service::create_user(store, credentials, username, password, None, Role::Admin).await {
        Ok(id) => log::info!("👑 Admin user '{}' created ({})", username, id.to_hex()),
        Err(ApiError::Conflict(_)) => {
            log::info!("👑 Admin user '{}' already exists, skipping seed", username)
        }
        Err(e) => log::error!("❌ Failed to seed admin user '{}': {:?}", username, e),
    }
}
