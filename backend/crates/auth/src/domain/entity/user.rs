//! User Entity
//!
//! Account holder: profile, credentials, pending one-time codes and the
//! login failure counter that drives temporary lockout.

use chrono::{DateTime, Duration, Utc};

use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    otp::{OtpPurpose, PendingOtp},
    public_id::PublicId,
    user_id::UserId,
    user_password::UserPassword,
};

#[derive(Debug, Clone)]
pub struct User {
    /// Internal UUID identifier
    pub user_id: UserId,
    /// Public-facing nanoid identifier
    pub public_id: PublicId,
    pub name: DisplayName,
    /// Unique, lower-cased
    pub email: Email,
    pub password_hash: UserPassword,
    pub email_verified: bool,
    pub verification_otp: Option<PendingOtp>,
    pub reset_otp: Option<PendingOtp>,
    /// Consecutive login failures
    pub failed_login_count: u16,
    pub locked_until: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Maximum login failures before temporary lockout
    pub const MAX_LOGIN_FAILURES: u16 = 5;
    /// Lockout duration in minutes
    pub const LOCKOUT_MINUTES: i64 = 15;

    /// New, unverified account
    pub fn new(name: DisplayName, email: Email, password_hash: UserPassword) -> Self {
        let now = Utc::now();
        Self {
            user_id: UserId::new(),
            public_id: PublicId::new(),
            name,
            email,
            password_hash,
            email_verified: false,
            verification_otp: None,
            reset_otp: None,
            failed_login_count: 0,
            locked_until: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.locked_until.is_some_and(|until| now < until)
    }

    pub fn record_failure_at(&mut self, now: DateTime<Utc>) {
        self.failed_login_count = self.failed_login_count.saturating_add(1);
        self.updated_at = now;

        if self.failed_login_count >= Self::MAX_LOGIN_FAILURES {
            self.locked_until = Some(now + Duration::minutes(Self::LOCKOUT_MINUTES));
        }
    }

    pub fn record_login_at(&mut self, now: DateTime<Utc>) {
        self.failed_login_count = 0;
        self.locked_until = None;
        self.last_login_at = Some(now);
        self.updated_at = now;
    }

    pub fn pending_otp(&self, purpose: OtpPurpose) -> Option<&PendingOtp> {
        match purpose {
            OtpPurpose::EmailVerification => self.verification_otp.as_ref(),
            OtpPurpose::PasswordReset => self.reset_otp.as_ref(),
        }
    }

    /// Replaces whatever code of this purpose was outstanding
    pub fn set_pending_otp(&mut self, purpose: OtpPurpose, otp: Option<PendingOtp>) {
        match purpose {
            OtpPurpose::EmailVerification => self.verification_otp = otp,
            OtpPurpose::PasswordReset => self.reset_otp = otp,
        }
    }

    pub fn mark_verified(&mut self, now: DateTime<Utc>) {
        self.email_verified = true;
        self.updated_at = now;
    }

    /// New password also lifts any lockout
    pub fn set_password(&mut self, password_hash: UserPassword, now: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.failed_login_count = 0;
        self.locked_until = None;
        self.updated_at = now;
    }
}
