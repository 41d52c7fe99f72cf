//! Auth (Account) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and mailer ports
//! - `application/` - Use cases
//! - `infra/` - PostgreSQL and in-memory repositories, mailers
//! - `presentation/` - HTTP handlers, DTOs, router
//!
//! ## Features
//! - Registration with email + password
//! - Email verification with a 6-digit one-time code
//! - Login issuing a 7 day HS256 token (body and `jwt` cookie)
//! - Forgot / reset password with a one-time code
//!
//! ## Security Model
//! - Passwords hashed with Argon2id (NIST SP 800-63B length rules)
//! - One-time codes stored as SHA-256 digests, single use, 10 minute TTL
//! - Code consumption is an atomic compare-and-invalidate
//! - Automatic lockout after repeated failed logins

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use infra::{LogMailer, MemoryMailer, MemoryUserRepository, PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
