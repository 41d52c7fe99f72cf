//! Auth store: runs requests and reduces their outcomes

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::task::{AbortHandle, JoinHandle};

use crate::api::{AuthApi, AuthRequest};
use crate::feedback::Feedback;
use crate::state::{AuthAction, AuthOp, AuthState, reduce};
use crate::storage::{AUTH_INFO_KEY, SessionStorage};

/// Outcome of a dispatch that ran to completion. A dispatch whose future is
/// dropped reduces `Cancelled` instead and returns nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Fulfilled(Value),
    Rejected(Value),
}

impl DispatchResult {
    pub fn is_fulfilled(&self) -> bool {
        matches!(self, Self::Fulfilled(_))
    }
}

pub struct AuthStore<A, S>
where
    A: AuthApi,
    S: SessionStorage,
{
    api: A,
    storage: S,
    state: Arc<Mutex<AuthState>>,
    in_flight: tokio::sync::Mutex<()>,
    /// At most one pending clear; replaced by the next schedule or dispatch
    clear_timer: Mutex<Option<AbortHandle>>,
}

impl<A, S> AuthStore<A, S>
where
    A: AuthApi,
    S: SessionStorage,
{
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            state: Arc::new(Mutex::new(AuthState::default())),
            in_flight: tokio::sync::Mutex::new(()),
            clear_timer: Mutex::new(None),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        lock(&self.state).clone()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Hydrates `user` from session storage. Returns whether a payload was found.
    pub fn restore(&self) -> bool {
        let Some(raw) = self.storage.get_item(AUTH_INFO_KEY) else {
            return false;
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(payload) => {
                self.apply(AuthAction::Restored(payload));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unreadable stored session");
                self.storage.remove_item(AUTH_INFO_KEY);
                false
            }
        }
    }

    /// Runs one request. Requests on the same store are serialized.
    pub async fn dispatch(&self, request: AuthRequest) -> DispatchResult {
        let _turn = self.in_flight.lock().await;
        // A clear scheduled for the previous outcome must not wipe this one
        self.cancel_clear();
        let op = request.op();

        self.apply(AuthAction::Pending(op));
        let pending = PendingGuard::new(&self.state, op);

        let result = self.api.send(&request).await;
        pending.disarm();

        match result {
            Ok(payload) => {
                self.persist(op, &payload);
                self.apply(AuthAction::Fulfilled(op, payload.clone()));
                DispatchResult::Fulfilled(payload)
            }
            Err(e) => {
                tracing::debug!(op = ?op, error = %e, "Auth request rejected");
                let error = e.into_value();
                self.apply(AuthAction::Rejected(op, error.clone()));
                DispatchResult::Rejected(error)
            }
        }
    }

    /// Clears `error` and `success`
    pub fn clear(&self) {
        self.apply(AuthAction::ClearAuthState);
    }

    /// Clears `error` and `success` once `delay` has passed. Replaces any
    /// clear still pending; a later dispatch cancels it too.
    pub fn clear_after(&self, delay: Duration) -> JoinHandle<()> {
        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            reduce(&mut lock(&state), AuthAction::ClearAuthState);
        });

        let previous = lock(&self.clear_timer).replace(handle.abort_handle());
        if let Some(previous) = previous {
            previous.abort();
        }
        handle
    }

    fn cancel_clear(&self) {
        if let Some(timer) = lock(&self.clear_timer).take() {
            timer.abort();
        }
    }

    /// Takes the banner for the latest outcome and schedules its removal
    /// (1000 ms for success, 500 ms for errors).
    pub fn acknowledge(&self) -> Option<(Feedback, JoinHandle<()>)> {
        let feedback = Feedback::from_state(&self.state())?;
        let handle = self.clear_after(feedback.clear_delay());
        Some((feedback, handle))
    }

    fn apply(&self, action: AuthAction) {
        reduce(&mut lock(&self.state), action);
    }

    fn persist(&self, op: AuthOp, payload: &Value) {
        match op {
            AuthOp::Login | AuthOp::VerifyEmail => match serde_json::to_string(payload) {
                Ok(raw) => self.storage.set_item(AUTH_INFO_KEY, raw),
                Err(e) => tracing::warn!(error = %e, "Failed to store session"),
            },
            AuthOp::Logout => self.storage.remove_item(AUTH_INFO_KEY),
            _ => {}
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reduces `Cancelled` if dropped before the request resolves
struct PendingGuard<'a> {
    state: &'a Mutex<AuthState>,
    op: AuthOp,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(state: &'a Mutex<AuthState>, op: AuthOp) -> Self {
        Self {
            state,
            op,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::debug!(op = ?self.op, "Auth request cancelled");
            reduce(&mut lock(self.state), AuthAction::Cancelled(self.op));
        }
    }
}
