//! Domain Layer
//!
//! Contains entities, value objects, and the persistence and mail ports.

pub mod entity;
pub mod mailer;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::user::User;
pub use mailer::OtpMailer;
pub use repository::{OtpCheck, OtpEffect, UserRepository};
