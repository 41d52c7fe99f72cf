//! HTTP client for the account endpoints

use std::fmt;
use std::time::Duration;

use serde_json::{Value, json};

use crate::state::AuthOp;

/// Default request timeout applied to every call
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum number of characters of a non-JSON error body kept in the error value
const MAX_ERROR_CHARS: usize = 200;

/// One dispatchable request with its body
#[derive(Clone, PartialEq)]
pub enum AuthRequest {
    Register {
        name: String,
        email: String,
        password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    ForgotPassword {
        email: String,
    },
    ResetPassword {
        email: String,
        otp: String,
        password: String,
    },
    ResendVerificationOtp {
        email: String,
    },
    VerifyEmail {
        email: String,
        otp: String,
    },
}

impl AuthRequest {
    pub fn op(&self) -> AuthOp {
        match self {
            Self::Register { .. } => AuthOp::Register,
            Self::Login { .. } => AuthOp::Login,
            Self::Logout => AuthOp::Logout,
            Self::ForgotPassword { .. } => AuthOp::ForgotPassword,
            Self::ResetPassword { .. } => AuthOp::ResetPassword,
            Self::ResendVerificationOtp { .. } => AuthOp::ResendVerificationOtp,
            Self::VerifyEmail { .. } => AuthOp::VerifyEmail,
        }
    }

    /// Path below the API base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Register { .. } => "/api/user/register",
            Self::Login { .. } => "/api/user/login",
            Self::Logout => "/api/user/logout",
            Self::ForgotPassword { .. } => "/api/user/forgot-password",
            Self::ResetPassword { .. } => "/api/user/reset-password",
            Self::ResendVerificationOtp { .. } => "/api/user/resend-verification",
            Self::VerifyEmail { .. } => "/api/user/verify-email",
        }
    }

    /// JSON body, `None` for logout
    pub fn body(&self) -> Option<Value> {
        match self {
            Self::Register {
                name,
                email,
                password,
            } => Some(json!({ "name": name, "email": email, "password": password })),
            Self::Login { email, password } => {
                Some(json!({ "email": email, "password": password }))
            }
            Self::Logout => None,
            Self::ForgotPassword { email } | Self::ResendVerificationOtp { email } => {
                Some(json!({ "email": email }))
            }
            Self::ResetPassword {
                email,
                otp,
                password,
            } => Some(json!({ "email": email, "otp": otp, "password": password })),
            Self::VerifyEmail { email, otp } => Some(json!({ "email": email, "otp": otp })),
        }
    }
}

impl fmt::Debug for AuthRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRequest")
            .field("op", &self.op())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx answer; `body` is the server's error body
    #[error("Request failed ({status})")]
    Rejected { status: u16, body: Value },

    #[error("Response error: {0}")]
    Parse(String),
}

impl ApiError {
    /// Error value stored in the auth state. Server error bodies pass
    /// through unchanged; local failures take the same shape.
    pub fn into_value(self) -> Value {
        match self {
            Self::Rejected { body, .. } => body,
            Self::Network(message) => local_error("NETWORK_ERROR", message),
            Self::Timeout => local_error("TIMEOUT", "Request timed out".to_string()),
            Self::Parse(message) => local_error("INVALID_RESPONSE", message),
        }
    }
}

fn local_error(kind: &str, message: String) -> Value {
    json!({
        "message": message,
        "kind": kind,
        "status": Value::Null,
        "action": Value::Null,
    })
}

#[trait_variant::make(AuthApi: Send)]
pub trait LocalAuthApi {
    /// Sends the request and returns the parsed success body
    async fn send(&self, request: &AuthRequest) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAuthApi {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, request: &AuthRequest) -> String {
        format!("{}{}", self.base_url, request.path())
    }
}

impl AuthApi for HttpAuthApi {
    async fn send(&self, request: &AuthRequest) -> Result<Value, ApiError> {
        let mut builder = self.client.post(self.url(request));
        if let Some(body) = request.body() {
            builder = builder.json(&body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        tracing::debug!(op = ?request.op(), status = status.as_u16(), "Auth request completed");

        if status.is_success() {
            parse_success(&text)
        } else {
            Err(ApiError::Rejected {
                status: status.as_u16(),
                body: parse_error_body(status.as_u16(), &text),
            })
        }
    }
}

fn parse_success(text: &str) -> Result<Value, ApiError> {
    if text.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}

fn parse_error_body(status: u16, text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(body @ Value::Object(_)) => body,
        _ => {
            let message: String = text.trim().chars().take(MAX_ERROR_CHARS).collect();
            json!({
                "message": message,
                "kind": Value::Null,
                "status": status,
                "action": Value::Null,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_password_body_and_path() {
        let request = AuthRequest::ResetPassword {
            email: "a@x.com".to_string(),
            otp: "123456".to_string(),
            password: "new-password".to_string(),
        };

        assert_eq!(request.op(), AuthOp::ResetPassword);
        assert_eq!(request.path(), "/api/user/reset-password");
        assert_eq!(
            request.body(),
            Some(json!({"email": "a@x.com", "otp": "123456", "password": "new-password"}))
        );
    }

    #[test]
    fn test_logout_has_no_body() {
        assert_eq!(AuthRequest::Logout.body(), None);
        assert_eq!(AuthRequest::Logout.path(), "/api/user/logout");
    }

    #[test]
    fn test_debug_hides_credentials() {
        let request = AuthRequest::Login {
            email: "a@x.com".to_string(),
            password: "hunter22".to_string(),
        };
        let printed = format!("{request:?}");
        assert!(printed.contains("Login"));
        assert!(!printed.contains("hunter22"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let api = HttpAuthApi::with_client(reqwest::Client::new(), "http://localhost:31113/");
        assert_eq!(
            api.url(&AuthRequest::Logout),
            "http://localhost:31113/api/user/logout"
        );
    }

    #[test]
    fn test_server_error_body_forwarded_verbatim() {
        let body = json!({"message": "Invalid OTP", "kind": "BAD_REQUEST", "status": 400, "action": null});
        let err = ApiError::Rejected {
            status: 400,
            body: parse_error_body(400, &body.to_string()),
        };
        assert_eq!(err.into_value(), body);
    }

    #[test]
    fn test_plain_text_error_body_wrapped() {
        let value = parse_error_body(502, "Bad Gateway");
        assert_eq!(value["message"], "Bad Gateway");
        assert_eq!(value["status"], 502);
    }

    #[test]
    fn test_network_error_value_has_message() {
        let value = ApiError::Network("connection refused".to_string()).into_value();
        assert_eq!(value["message"], "connection refused");
        assert_eq!(value["kind"], "NETWORK_ERROR");
    }

    #[test]
    fn test_empty_success_body() {
        assert_eq!(parse_success("").unwrap(), json!({}));
        assert!(matches!(parse_success("not json"), Err(ApiError::Parse(_))));
    }
}
