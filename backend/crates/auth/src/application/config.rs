//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::sync::Arc;
use std::time::Duration;

use platform::cookie::CookieConfig;
use platform::token::{DEFAULT_TOKEN_TTL_SECS, TokenError, TokenSigner};

use crate::domain::value_object::otp::OtpPurpose;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// Ten minutes
pub const DEFAULT_OTP_TTL: Duration = Duration::from_secs(10 * 60);

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Signs and verifies session tokens
    pub tokens: Arc<TokenSigner>,
    /// Session cookie attributes (name `jwt`)
    pub cookie: CookieConfig,
    pub verification_otp_ttl: Duration,
    pub reset_otp_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
}

impl AuthConfig {
    /// Production defaults around the given signing secret
    pub fn new(token_secret: impl AsRef<[u8]>) -> Result<Self, TokenError> {
        let tokens = TokenSigner::new(token_secret, Duration::from_secs(DEFAULT_TOKEN_TTL_SECS))?;

        Ok(Self {
            tokens: Arc::new(tokens),
            cookie: CookieConfig::default(),
            verification_otp_ttl: DEFAULT_OTP_TTL,
            reset_otp_ttl: DEFAULT_OTP_TTL,
            password_pepper: None,
        })
    }

    /// Random signing secret and insecure cookie (for development and tests)
    pub fn development() -> Result<Self, TokenError> {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);

        let mut config = Self::new(secret)?;
        config.cookie.secure = false;
        Ok(config)
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie.secure = secure;
        self
    }

    pub fn with_pepper(mut self, pepper: Option<Vec<u8>>) -> Self {
        self.password_pepper = pepper.filter(|p| !p.is_empty());
        self
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    /// Cookie lifetime matches the token lifetime
    pub fn cookie_max_age_secs(&self) -> i64 {
        self.tokens.ttl_secs()
    }

    pub fn otp_ttl(&self, purpose: OtpPurpose) -> chrono::Duration {
        let ttl = match purpose {
            OtpPurpose::EmailVerification => self.verification_otp_ttl,
            OtpPurpose::PasswordReset => self.reset_otp_ttl,
        };
        chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(10))
    }
}
