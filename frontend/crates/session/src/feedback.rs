//! Helpers for showing request outcomes

use std::time::Duration;

use serde_json::Value;

use crate::state::AuthState;

/// How long a success message stays before the state is cleared
pub const SUCCESS_CLEAR_DELAY: Duration = Duration::from_millis(1000);
/// How long an error message stays before the state is cleared
pub const ERROR_CLEAR_DELAY: Duration = Duration::from_millis(500);

/// Banner to show for the latest request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Success(String),
    Error(String),
}

impl Feedback {
    /// Errors win over a success message left from an earlier request
    pub fn from_state(state: &AuthState) -> Option<Self> {
        if let Some(error) = &state.error {
            return Some(Self::Error(error_message(error)));
        }
        state.success.clone().map(Self::Success)
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(message) | Self::Error(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn clear_delay(&self) -> Duration {
        match self {
            Self::Success(_) => SUCCESS_CLEAR_DELAY,
            Self::Error(_) => ERROR_CLEAR_DELAY,
        }
    }
}

/// Best-effort text for an error value
pub fn error_message(error: &Value) -> String {
    match error {
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) => message.to_string(),
            None => error.to_string(),
        },
        Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(error_message(&json!({"message": "Invalid OTP"})), "Invalid OTP");
        assert_eq!(error_message(&json!({"code": 7})), r#"{"code":7}"#);
        assert_eq!(error_message(&json!("plain")), "plain");
        assert_eq!(error_message(&json!(42)), "42");
        assert_eq!(error_message(&Value::Null), "null");
    }

    #[test]
    fn test_feedback_from_state() {
        assert_eq!(Feedback::from_state(&AuthState::default()), None);

        let state = AuthState {
            success: Some("Email verified successfully".to_string()),
            ..Default::default()
        };
        let feedback = Feedback::from_state(&state).unwrap();
        assert!(!feedback.is_error());
        assert_eq!(feedback.message(), "Email verified successfully");
        assert_eq!(feedback.clear_delay(), Duration::from_millis(1000));

        let state = AuthState {
            error: Some(json!({"message": "OTP has expired"})),
            success: Some("stale".to_string()),
            ..Default::default()
        };
        let feedback = Feedback::from_state(&state).unwrap();
        assert_eq!(feedback, Feedback::Error("OTP has expired".to_string()));
        assert_eq!(feedback.clear_delay(), Duration::from_millis(500));
    }
}
