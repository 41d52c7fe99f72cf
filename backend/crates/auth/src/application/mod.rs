//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod current_user;
pub mod forgot_password;
pub mod login;
pub mod logout;
mod otp;
pub mod register;
pub mod resend_verification;
pub mod reset_password;
pub mod session;
pub mod verify_email;

// Re-exports
pub use config::AuthConfig;
pub use current_user::CurrentUserUseCase;
pub use forgot_password::ForgotPasswordUseCase;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use register::{RegisterInput, RegisterOutput, RegisterUseCase};
pub use resend_verification::ResendVerificationUseCase;
pub use reset_password::{ResetPasswordInput, ResetPasswordUseCase};
pub use session::SessionClaims;
pub use verify_email::{VerifyEmailInput, VerifyEmailOutput, VerifyEmailUseCase};
