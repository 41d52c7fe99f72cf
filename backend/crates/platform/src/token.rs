//! Signed Session Tokens
//!
//! Compact HS256 JWTs (`header.payload.signature`, base64url without padding).
//! The payload carries the caller's data under the `data` claim plus `iat`
//! and `exp` in Unix seconds.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::crypto::{from_base64url, to_base64url};

type HmacSha256 = Hmac<Sha256>;

/// Seven days
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 7 * 24 * 60 * 60;

const HEADER_ALG: &str = "HS256";
const HEADER_TYP: &str = "JWT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token signing secret is not configured")]
    MissingSecret,

    #[error("Token lifetime must be positive and fit a timestamp")]
    InvalidTtl,

    #[error("Token is malformed or its signature does not match")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Decoded token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims<T> {
    pub data: T,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// HS256 signer/verifier bound to one secret and lifetime
pub struct TokenSigner {
    secret: Zeroizing<Vec<u8>>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }
        let ttl_secs = i64::try_from(ttl.as_secs()).map_err(|_| TokenError::InvalidTtl)?;
        if ttl_secs <= 0 {
            return Err(TokenError::InvalidTtl);
        }

        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            ttl_secs,
        })
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length
        match HmacSha256::new_from_slice(&self.secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC-SHA256 accepts arbitrary key sizes"),
        }
    }

    pub fn issue<T: Serialize>(&self, data: &T) -> Result<IssuedToken, TokenError> {
        self.issue_at(data, Utc::now())
    }

    pub fn issue_at<T: Serialize>(
        &self,
        data: &T,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let iat = now.timestamp();
        // A TTL too large to express as a timestamp is a configuration error
        let exp = iat
            .checked_add(self.ttl_secs)
            .ok_or(TokenError::InvalidTtl)?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(TokenError::InvalidTtl)?;

        let header = Header {
            alg: HEADER_ALG.to_string(),
            typ: HEADER_TYP.to_string(),
        };
        let claims = TokenClaims { data, iat, exp };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| TokenError::Encoding(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            to_base64url(&header_json),
            to_base64url(&claims_json)
        );

        let mut mac = self.mac();
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();

        Ok(IssuedToken {
            token: format!("{}.{}", signing_input, to_base64url(&signature)),
            expires_at,
        })
    }

    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<TokenClaims<T>, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Signature is checked before the payload is parsed
    pub fn verify_at<T: DeserializeOwned>(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims<T>, TokenError> {
        let mut parts = token.trim().split('.');
        let (Some(header_b64), Some(claims_b64), Some(sig_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(TokenError::Invalid);
        };

        let signature = from_base64url(sig_b64).map_err(|_| TokenError::Invalid)?;

        let mut mac = self.mac();
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::Invalid)?;

        let header_json = from_base64url(header_b64).map_err(|_| TokenError::Invalid)?;
        let header: Header =
            serde_json::from_slice(&header_json).map_err(|_| TokenError::Invalid)?;
        if header.alg != HEADER_ALG {
            return Err(TokenError::Invalid);
        }

        let claims_json = from_base64url(claims_b64).map_err(|_| TokenError::Invalid)?;
        let claims: TokenClaims<T> =
            serde_json::from_slice(&claims_json).map_err(|_| TokenError::Invalid)?;

        if now.timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl_secs", &self.ttl_secs)
            .finish()
    }
}
