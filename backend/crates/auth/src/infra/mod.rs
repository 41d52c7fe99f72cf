//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod mail;
pub mod memory;
pub mod postgres;

pub use mail::{LogMailer, MemoryMailer};
pub use memory::MemoryUserRepository;
pub use postgres::PgAuthRepository;
