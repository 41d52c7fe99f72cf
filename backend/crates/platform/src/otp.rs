//! One-time numeric codes
//!
//! Codes are delivered out-of-band and only their SHA-256 digest is kept
//! server-side.

use rand::{Rng, rngs::OsRng};

use crate::crypto::sha256;

/// Digits in a generated code
pub const OTP_DIGITS: u32 = 6;

/// Uniformly random, zero-padded decimal code of `digits` length
pub fn generate_numeric_code(digits: u32) -> String {
    let digits = digits.clamp(1, 9);
    let upper = 10u32.pow(digits);
    let value = OsRng.gen_range(0..upper);
    format!("{:0width$}", value, width = digits as usize)
}

/// Digest stored in place of the code. Surrounding whitespace is ignored.
pub fn hash_code(code: &str) -> [u8; 32] {
    sha256(code.trim().as_bytes())
}
