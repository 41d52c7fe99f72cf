//! One-Time Code Value Objects
//!
//! A user holds at most one live code per [`OtpPurpose`]. Only the SHA-256
//! digest is stored, next to its expiry.

use chrono::{DateTime, Duration, Utc};
use derive_more::Display;
use kernel::error::app_error::{AppError, AppResult};
use platform::crypto::constant_time_eq;
use platform::otp::{OTP_DIGITS, generate_numeric_code, hash_code};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum OtpPurpose {
    #[display("email_verification")]
    EmailVerification,
    #[display("password_reset")]
    PasswordReset,
}

/// Code presented by the user or about to be mailed
#[derive(Clone, PartialEq, Eq)]
pub struct OtpCode(String);

impl OtpCode {
    pub fn generate() -> Self {
        Self(generate_numeric_code(OTP_DIGITS))
    }

    /// Shape is not checked here; a malformed code is simply a mismatch
    pub fn parse(raw: impl AsRef<str>) -> AppResult<Self> {
        let code = raw.as_ref().trim();
        if code.is_empty() {
            return Err(AppError::bad_request("OTP is required"));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn digest(&self) -> [u8; 32] {
        hash_code(&self.0)
    }
}

impl std::fmt::Debug for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OtpCode").field(&"[REDACTED]").finish()
    }
}

/// Outcome of comparing a presented code with the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpVerdict {
    Match,
    Mismatch,
    /// Code matched but the deadline has passed
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOtp {
    pub code_hash: [u8; 32],
    pub expires_at: DateTime<Utc>,
}

impl PendingOtp {
    pub fn issue(code: &OtpCode, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            code_hash: code.digest(),
            expires_at: now + ttl,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The code is compared first, so a wrong guess never reveals expiry
    pub fn check(&self, code_hash: &[u8; 32], now: DateTime<Utc>) -> OtpVerdict {
        if !constant_time_eq(&self.code_hash, code_hash) {
            OtpVerdict::Mismatch
        } else if self.is_expired(now) {
            OtpVerdict::Expired
        } else {
            OtpVerdict::Match
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_code_shape() {
        let code = OtpCode::generate();
        assert_eq!(code.as_str().len(), 6);
        assert!(code.as_str().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_parse_trims_and_requires() {
        assert_eq!(OtpCode::parse(" 123456 ").unwrap().as_str(), "123456");
        assert_eq!(OtpCode::parse("   ").unwrap_err().message(), "OTP is required");
    }

    #[test]
    fn test_check_verdicts() {
        let now = Utc::now();
        let code = OtpCode::parse("123456").unwrap();
        let pending = PendingOtp::issue(&code, Duration::minutes(10), now);

        assert_eq!(pending.check(&code.digest(), now), OtpVerdict::Match);

        let wrong = OtpCode::parse("654321").unwrap();
        assert_eq!(pending.check(&wrong.digest(), now), OtpVerdict::Mismatch);

        let later = now + Duration::minutes(10);
        assert_eq!(pending.check(&code.digest(), later), OtpVerdict::Expired);
        assert_eq!(pending.check(&wrong.digest(), later), OtpVerdict::Mismatch);
    }

    #[test]
    fn test_purpose_display() {
        assert_eq!(OtpPurpose::PasswordReset.to_string(), "password_reset");
    }

    #[test]
    fn test_code_debug_redacted() {
        let code = OtpCode::parse("123456").unwrap();
        assert!(!format!("{:?}", code).contains("123456"));
    }
}
