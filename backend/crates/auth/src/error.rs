//! Auth Error Types
//!
//! Auth-specific error variants that render through the unified
//! `kernel::error::AppError` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::token::TokenError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Input rejected by a value object
    #[error("{}", .0.message())]
    Validation(AppError),

    #[error("User not found")]
    UserNotFound,

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email before logging in")]
    EmailNotVerified,

    #[error("Account is temporarily locked")]
    AccountLocked,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Invalid OTP")]
    OtpMismatch,

    #[error("OTP has expired")]
    OtpExpired,

    #[error("No pending OTP for this account")]
    NoPendingOtp,

    /// Bad signature, malformed, expired, or the subject is gone
    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Could not send email: {0}")]
    MailDelivery(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(err) => err.kind(),
            AuthError::UserNotFound | AuthError::NoPendingOtp => ErrorKind::NotFound,
            AuthError::EmailTaken | AuthError::AlreadyVerified => ErrorKind::Conflict,
            AuthError::InvalidCredentials | AuthError::TokenInvalid => ErrorKind::Unauthorized,
            AuthError::EmailNotVerified => ErrorKind::Forbidden,
            AuthError::AccountLocked => ErrorKind::Locked,
            AuthError::OtpMismatch => ErrorKind::BadRequest,
            AuthError::OtpExpired => ErrorKind::Gone,
            AuthError::MailDelivery(_) => ErrorKind::ServiceUnavailable,
            AuthError::Database(_) | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    fn action(&self) -> Option<&str> {
        match self {
            AuthError::Validation(err) => err.action(),
            AuthError::EmailNotVerified => Some("Enter the code sent to your email"),
            AuthError::AccountLocked => Some("Try again in a few minutes or reset your password"),
            AuthError::OtpExpired | AuthError::NoPendingOtp => Some("Request a new code"),
            AuthError::TokenInvalid => Some("Please log in again"),
            _ => None,
        }
    }

    /// Server-side failures keep their details out of the response body
    pub fn to_app_error(&self) -> AppError {
        let err = match self {
            AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::new(self.kind(), "Something went wrong. Please try again later.")
            }
            AuthError::MailDelivery(_) => AppError::new(self.kind(), "Could not send email"),
            _ => AppError::new(self.kind(), self.to_string()),
        };

        match self.action() {
            Some(action) => err.with_action(action.to_string()),
            None => err,
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::Validation(err) if err.is_server_error() => {
                tracing::error!(error = ?err, "Auth internal error");
            }
            AuthError::MailDelivery(msg) => {
                tracing::error!(message = %msg, "OTP email delivery failed");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::AccountLocked => {
                tracing::warn!("Login attempt on locked account");
            }
            AuthError::OtpMismatch => {
                tracing::warn!("OTP mismatch");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Validation(err)
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid | TokenError::Expired => AuthError::TokenInvalid,
            TokenError::MissingSecret | TokenError::InvalidTtl | TokenError::Encoding(_) => {
                AuthError::Internal(err.to_string())
            }
        }
    }
}
