//! Register Use Case
//!
//! Creates an unverified account and mails its first verification code.

use std::sync::Arc;

use chrono::Utc;

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    otp::{OtpCode, OtpPurpose, PendingOtp},
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct RegisterOutput {
    pub user: User,
}

pub struct RegisterUseCase<R, M>
where
    R: UserRepository,
    M: OtpMailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> RegisterUseCase<R, M>
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

    pub async fn execute(&self, input: RegisterInput) -> AuthResult<RegisterOutput> {
        let name = DisplayName::new(&input.name)?;
        let email = Email::new(&input.email)?;
        let raw_password = RawPassword::new(&input.password)?;

        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = UserPassword::from_raw(&raw_password, self.config.pepper())?;
        let mut user = User::new(name, email, password_hash);

        let code = OtpCode::generate();
        let purpose = OtpPurpose::EmailVerification;
        user.set_pending_otp(
            purpose,
            Some(PendingOtp::issue(&code, self.config.otp_ttl(purpose), Utc::now())),
        );

        self.repo.create(&user).await?;

        tracing::info!(
            public_id = %user.public_id,
            email = %user.email,
            "User registered"
        );

        self.mailer
            .send_otp(&user.email, &user.name, purpose, &code)
            .await?;

        Ok(RegisterOutput { user })
    }
}
