//! Shared one-time code steps for the use cases

use chrono::{DateTime, Utc};

use crate::application::config::AuthConfig;
use crate::domain::entity::user::User;
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::{OtpCheck, UserRepository};
use crate::domain::value_object::{
    email::Email,
    otp::{OtpCode, OtpPurpose, PendingOtp},
};
use crate::error::{AuthError, AuthResult};

/// Store a fresh code (discarding the previous one) and mail it
pub(crate) async fn issue_and_send<R, M>(
    repo: &R,
    mailer: &M,
    config: &AuthConfig,
    email: &Email,
    purpose: OtpPurpose,
    now: DateTime<Utc>,
) -> AuthResult<User>
where
    R: UserRepository,
    M: OtpMailer,
{
    let code = OtpCode::generate();
    let pending = PendingOtp::issue(&code, config.otp_ttl(purpose), now);

    let user = repo
        .replace_otp(email, purpose, &pending)
        .await?
        .ok_or(AuthError::UserNotFound)?;

    tracing::info!(
        public_id = %user.public_id,
        purpose = %purpose,
        expires_at = %pending.expires_at,
        "OTP issued"
    );

    mailer.send_otp(&user.email, &user.name, purpose, &code).await?;

    Ok(user)
}

pub(crate) fn accepted(check: OtpCheck, purpose: OtpPurpose) -> AuthResult<User> {
    match check {
        OtpCheck::Accepted(user) => Ok(user),
        OtpCheck::Mismatch => Err(AuthError::OtpMismatch),
        OtpCheck::Expired => {
            tracing::info!(purpose = %purpose, "Expired OTP presented and invalidated");
            Err(AuthError::OtpExpired)
        }
        OtpCheck::NoPendingCode => Err(AuthError::NoPendingOtp),
        OtpCheck::UnknownUser => Err(AuthError::UserNotFound),
    }
}
