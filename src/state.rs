use std::sync::Arc;

use crate::database::DocumentStore;
use crate::services::{CredentialService, TokenService};

/// Shared per-process handles. Holds no per-request state.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: TokenService,
    pub credentials: CredentialService,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService, credentials: CredentialService) -> Self {
        Self {
            store,
            tokens,
            credentials,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
