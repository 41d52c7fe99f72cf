//! Mailer implementations
//!
//! `LogMailer` writes the code to the log instead of sending it.
//! `MemoryMailer` keeps every message for inspection.

use std::sync::{Arc, Mutex};

use crate::domain::mailer::OtpMailer;
use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    otp::{OtpCode, OtpPurpose},
};
use crate::error::AuthResult;

fn subject(purpose: OtpPurpose) -> &'static str {
    match purpose {
        OtpPurpose::EmailVerification => "Verify your email",
        OtpPurpose::PasswordReset => "Reset your password",
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogMailer;

impl OtpMailer for LogMailer {
    async fn send_otp(
        &self,
        to: &Email,
        name: &DisplayName,
        purpose: OtpPurpose,
        code: &OtpCode,
    ) -> AuthResult<()> {
        tracing::info!(
            to = %to,
            name = %name,
            purpose = %purpose,
            subject = subject(purpose),
            code = code.as_str(),
            "OTP email (log delivery)"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentOtp {
    pub to: String,
    pub purpose: OtpPurpose,
    pub code: String,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryMailer {
    sent: Arc<Mutex<Vec<SentOtp>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentOtp> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Most recent code mailed to `to` for `purpose`
    pub fn last_code(&self, to: &str, purpose: OtpPurpose) -> Option<String> {
        let to = to.trim().to_lowercase();
        self.sent()
            .into_iter()
            .rev()
            .find(|m| m.to == to && m.purpose == purpose)
            .map(|m| m.code)
    }
}

impl OtpMailer for MemoryMailer {
    async fn send_otp(
        &self,
        to: &Email,
        _name: &DisplayName,
        purpose: OtpPurpose,
        code: &OtpCode,
    ) -> AuthResult<()> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(SentOtp {
                to: to.to_string(),
                purpose,
                code: code.as_str().to_string(),
            });
        Ok(())
    }
}
