//! Session tokens
//!
//! Tokens are stateless: a signed `{id, email}` envelope with a 7 day
//! expiry. Nothing is stored server-side.

use platform::token::IssuedToken;
use serde::{Deserialize, Serialize};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::error::AuthResult;

/// Identity carried under the token's `data` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Public id of the user
    pub id: String,
    pub email: String,
}

impl SessionClaims {
    pub fn for_user(user: &User) -> Self {
        Self {
            id: user.public_id.to_string(),
            email: user.email.to_string(),
        }
    }
}

pub fn issue_session(config: &AuthConfig, user: &User) -> AuthResult<IssuedToken> {
    Ok(config.tokens.issue(&SessionClaims::for_user(user))?)
}

/// Expired and forged tokens both come back as `AuthError::TokenInvalid`
pub fn authenticate(config: &AuthConfig, token: &str) -> AuthResult<SessionClaims> {
    let claims = config.tokens.verify::<SessionClaims>(token)?;
    Ok(claims.data)
}
