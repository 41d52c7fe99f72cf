//! Auth state and its reducer

use serde_json::Value;

/// Response body of a successful login or email verification
pub type AuthPayload = Value;

/// The seven requests a store can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthOp {
    Register,
    Login,
    Logout,
    ForgotPassword,
    ResetPassword,
    ResendVerificationOtp,
    VerifyEmail,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<AuthPayload>,
    pub loading: bool,
    /// Error body of the latest failed request, forwarded verbatim
    pub error: Option<Value>,
    pub success: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthAction {
    Pending(AuthOp),
    Fulfilled(AuthOp, Value),
    Rejected(AuthOp, Value),
    /// The request was abandoned before it resolved
    Cancelled(AuthOp),
    ClearAuthState,
    /// Payload read back from session storage
    Restored(AuthPayload),
}

pub fn reduce(state: &mut AuthState, action: AuthAction) {
    match action {
        AuthAction::Pending(_) => {
            state.loading = true;
            state.error = None;
            state.success = None;
        }
        AuthAction::Fulfilled(op, payload) => {
            state.loading = false;
            match op {
                AuthOp::Login => state.user = Some(payload),
                AuthOp::Logout => state.user = None,
                _ => {
                    state.success = payload
                        .get("message")
                        .and_then(Value::as_str)
                        .map(str::to_owned);
                }
            }
        }
        AuthAction::Rejected(_, error) => {
            state.loading = false;
            state.error = Some(error);
        }
        AuthAction::Cancelled(_) => state.loading = false,
        AuthAction::ClearAuthState => {
            state.error = None;
            state.success = None;
        }
        AuthAction::Restored(payload) => state.user = Some(payload),
    }
}
