//! Current User Use Case
//!
//! Resolves the account behind a verified session token.

use std::sync::Arc;

use crate::application::session::SessionClaims;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::public_id::PublicId;
use crate::error::{AuthError, AuthResult};

pub struct CurrentUserUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
}

impl<R> CurrentUserUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// A token whose subject no longer resolves is treated as invalid
    pub async fn execute(&self, claims: &SessionClaims) -> AuthResult<User> {
        let public_id = PublicId::parse_str(&claims.id).map_err(|_| AuthError::TokenInvalid)?;

        self.repo
            .find_by_public_id(&public_id)
            .await?
            .ok_or(AuthError::TokenInvalid)
    }
}
