//! Resend Verification Use Case
//!
//! Replaces the outstanding verification code with a new one.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::otp::issue_and_send;
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, otp::OtpPurpose};
use crate::error::{AuthError, AuthResult};

pub struct ResendVerificationUseCase<R, M>
where
    R: UserRepository,
    M: OtpMailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> ResendVerificationUseCase<R, M>
where
    R: UserRepository,
    M: OtpMailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(&self, email: &str) -> AuthResult<()> {
        let email = Email::new(email)?;

        let user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.email_verified {
            return Err(AuthError::AlreadyVerified);
        }

        issue_and_send(
            self.repo.as_ref(),
            self.mailer.as_ref(),
            &self.config,
            &email,
            OtpPurpose::EmailVerification,
            Utc::now(),
        )
        .await?;

        Ok(())
    }
}
