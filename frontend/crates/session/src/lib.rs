//! Client session store for the account service
//!
//! Holds the auth state the UI renders, drives requests against the
//! `/api/user` endpoints and keeps the signed-in payload in session storage.

pub mod api;
pub mod feedback;
pub mod forms;
pub mod state;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, AuthApi, AuthRequest, HttpAuthApi};
pub use feedback::Feedback;
pub use forms::Route;
pub use forms::reset_password::{ResetField, ResetPasswordForm, SubmitOutcome};
pub use state::{AuthAction, AuthOp, AuthState, reduce};
pub use storage::{AUTH_INFO_KEY, MemorySessionStorage, SessionStorage};
pub use store::{AuthStore, DispatchResult};
