//! Logout Use Case
//!
//! Tokens are not stored server-side, so logging out only clears the
//! client's copy. The caller is identified for the log when possible.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::authenticate;

pub struct LogoutUseCase {
    config: Arc<AuthConfig>,
}

impl LogoutUseCase {
    pub fn new(config: Arc<AuthConfig>) -> Self {
        Self { config }
    }

    /// Never fails
    pub fn execute(&self, token: Option<&str>) {
        match token.map(|t| authenticate(&self.config, t)) {
            Some(Ok(claims)) => {
                tracing::info!(public_id = %claims.id, "User logged out");
            }
            Some(Err(_)) => {
                tracing::debug!("Logout with an invalid or expired token");
            }
            None => {
                tracing::debug!("Logout without a token");
            }
        }
    }
}
