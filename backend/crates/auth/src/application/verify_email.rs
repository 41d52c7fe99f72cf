//! Verify Email Use Case
//!
//! Consumes the verification code, marks the account verified and signs
//! the user in.

use std::sync::Arc;

use chrono::Utc;
use platform::token::IssuedToken;

use crate::application::config::AuthConfig;
use crate::application::otp::accepted;
use crate::application::session::issue_session;
use crate::domain::entity::user::User;
use crate::domain::repository::{OtpEffect, UserRepository};
use crate::domain::value_object::{
    email::Email,
    otp::{OtpCode, OtpPurpose},
};
use crate::error::AuthResult;

pub struct VerifyEmailInput {
    pub email: String,
    pub otp: String,
}

#[derive(Debug)]
pub struct VerifyEmailOutput {
    pub user: User,
    pub token: IssuedToken,
}

pub struct VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: VerifyEmailInput) -> AuthResult<VerifyEmailOutput> {
        let email = Email::new(&input.email)?;
        let code = OtpCode::parse(&input.otp)?;
        let purpose = OtpPurpose::EmailVerification;

        let check = self
            .repo
            .consume_otp(
                &email,
                purpose,
                &code.digest(),
                Utc::now(),
                OtpEffect::MarkVerified,
            )
            .await?;
        let user = accepted(check, purpose)?;

        let token = issue_session(&self.config, &user)?;

        tracing::info!(public_id = %user.public_id, "Email verified");

        Ok(VerifyEmailOutput { user, token })
    }
}
