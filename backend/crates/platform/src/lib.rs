//! Platform Crate - Technical Infrastructure
//!
//! Domain-agnostic building blocks for the account service:
//! - Cryptographic utilities (SHA-256, base64url, constant-time compare)
//! - Password hashing (Argon2id, NIST SP 800-63B length rules)
//! - Signed session tokens (HS256 JWT)
//! - One-time numeric codes
//! - Cookie and bearer-token header handling

pub mod cookie;
pub mod crypto;
pub mod otp;
pub mod password;
pub mod token;
