//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::user::User;
use crate::domain::value_object::{
    email::Email,
    otp::{OtpPurpose, PendingOtp},
    public_id::PublicId,
    user_password::UserPassword,
};
use crate::error::AuthResult;

/// What a successfully consumed code does to the account
#[derive(Debug, Clone)]
pub enum OtpEffect {
    MarkVerified,
    SetPassword(UserPassword),
}

/// Result of an attempt to consume a code
#[derive(Debug, Clone)]
pub enum OtpCheck {
    /// Code matched and was invalidated together with the effect
    Accepted(User),
    /// Stored code and account left untouched
    Mismatch,
    /// Code matched but had expired. It is invalidated.
    Expired,
    NoPendingCode,
    UnknownUser,
}

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Insert a new user. Fails with `AuthError::EmailTaken` on a duplicate email.
    async fn create(&self, user: &User) -> AuthResult<()>;

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>>;

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>>;

    /// Persist a successful login: counter reset, lockout lifted, last login
    async fn update_login_state(&self, user: &User) -> AuthResult<()>;

    /// Atomically count one failed login and lock the account once the
    /// count reaches `User::MAX_LOGIN_FAILURES`. `None` if the email is unknown.
    async fn record_login_failure(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>>;

    /// Overwrite the purpose's outstanding code. `None` if the email is unknown.
    async fn replace_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        otp: &PendingOtp,
    ) -> AuthResult<Option<User>>;

    /// Compare-and-invalidate: on a live match the code is cleared and
    /// `effect` applied in one atomic step.
    async fn consume_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code_hash: &[u8; 32],
        now: DateTime<Utc>,
        effect: OtpEffect,
    ) -> AuthResult<OtpCheck>;

    /// Clear codes whose deadline has passed
    async fn purge_expired_otps(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}
