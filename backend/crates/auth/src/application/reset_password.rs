//! Reset Password Use Case
//!
//! Consumes the reset code and replaces the password in the same step.
//! The new password is validated first so a rejected password does not
//! burn the code.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::application::otp::accepted;
use crate::domain::repository::{OtpEffect, UserRepository};
use crate::domain::value_object::{
    email::Email,
    otp::{OtpCode, OtpPurpose},
    user_password::{RawPassword, UserPassword},
};
use crate::error::AuthResult;

pub struct ResetPasswordInput {
    pub email: String,
    pub otp: String,
    pub password: String,
}

pub struct ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> ResetPasswordUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        let email = Email::new(&input.email)?;
        let code = OtpCode::parse(&input.otp)?;
        let raw_password = RawPassword::new(&input.password)?;
        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let purpose = OtpPurpose::PasswordReset;

        let check = self
            .repo
            .consume_otp(
                &email,
                purpose,
                &code.digest(),
                Utc::now(),
                OtpEffect::SetPassword(password_hash),
            )
            .await?;
        let user = accepted(check, purpose)?;

        tracing::info!(public_id = %user.public_id, "Password reset");

        Ok(())
    }
}
