//! In-memory repository
//!
//! Same contract as the PostgreSQL implementation. Every operation runs
//! under one lock, which is what makes code consumption atomic here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::entity::user::User;
use crate::domain::repository::{OtpCheck, OtpEffect, UserRepository};
use crate::domain::value_object::{
    email::Email,
    otp::{OtpPurpose, OtpVerdict, PendingOtp},
    public_id::PublicId,
};
use crate::error::{AuthError, AuthResult};

#[derive(Clone, Default)]
pub struct MemoryUserRepository {
    users: Arc<Mutex<HashMap<Email, User>>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.lock().await.len()
    }
}

impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        if users.contains_key(&user.email) {
            return Err(AuthError::EmailTaken);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        Ok(self.users.lock().await.get(email).cloned())
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|u| &u.public_id == public_id)
            .cloned())
    }

    async fn update_login_state(&self, user: &User) -> AuthResult<()> {
        let mut users = self.users.lock().await;
        let stored = users.get_mut(&user.email).ok_or(AuthError::UserNotFound)?;
        stored.failed_login_count = user.failed_login_count;
        stored.locked_until = user.locked_until;
        stored.last_login_at = user.last_login_at;
        stored.updated_at = user.updated_at;
        Ok(())
    }

    async fn record_login_failure(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(email) else {
            return Ok(None);
        };
        user.record_failure_at(now);
        Ok(Some(user.clone()))
    }

    async fn replace_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        otp: &PendingOtp,
    ) -> AuthResult<Option<User>> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(email) else {
            return Ok(None);
        };
        user.set_pending_otp(purpose, Some(otp.clone()));
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn consume_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code_hash: &[u8; 32],
        now: DateTime<Utc>,
        effect: OtpEffect,
    ) -> AuthResult<OtpCheck> {
        let mut users = self.users.lock().await;
        let Some(user) = users.get_mut(email) else {
            return Ok(OtpCheck::UnknownUser);
        };
        let Some(pending) = user.pending_otp(purpose) else {
            return Ok(OtpCheck::NoPendingCode);
        };

        match pending.check(code_hash, now) {
            OtpVerdict::Mismatch => Ok(OtpCheck::Mismatch),
            OtpVerdict::Expired => {
                user.set_pending_otp(purpose, None);
                Ok(OtpCheck::Expired)
            }
            OtpVerdict::Match => {
                user.set_pending_otp(purpose, None);
                match effect {
                    OtpEffect::MarkVerified => user.mark_verified(now),
                    OtpEffect::SetPassword(hash) => user.set_password(hash, now),
                }
                Ok(OtpCheck::Accepted(user.clone()))
            }
        }
    }

    async fn purge_expired_otps(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut users = self.users.lock().await;
        let mut purged = 0u64;

        for user in users.values_mut() {
            for purpose in [OtpPurpose::EmailVerification, OtpPurpose::PasswordReset] {
                if user.pending_otp(purpose).is_some_and(|otp| otp.is_expired(now)) {
                    user.set_pending_otp(purpose, None);
                    purged += 1;
                }
            }
        }

        Ok(purged)
    }
}
