//! Forgot Password Use Case
//!
//! Issues a password reset code. Unknown emails are reported as such.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::otp::issue_and_send;
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, otp::OtpPurpose};
use crate::error::AuthResult;

pub struct ForgotPasswordUseCase<R, M>
where
    R: UserRepository,
    M: OtpMailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> ForgotPasswordUseCase<R, M>
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

        issue_and_send(
            self.repo.as_ref(),
            self.mailer.as_ref(),
            &self.config,
            &email,
            OtpPurpose::PasswordReset,
            Utc::now(),
        )
        .await?;

        Ok(())
    }
}
