//! Fake APIs for store and form tests

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::api::{ApiError, AuthApi, AuthRequest};

/// Answers requests from a queue and records what was sent
pub struct ScriptedApi {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    sent: Mutex<Vec<AuthRequest>>,
}

impl ScriptedApi {
    pub fn new(responses: Vec<Result<Value, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<AuthRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl AuthApi for ScriptedApi {
    async fn send(&self, request: &AuthRequest) -> Result<Value, ApiError> {
        self.sent.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Network("no scripted response".to_string())))
    }
}

/// Never answers
pub struct HangingApi;

impl AuthApi for HangingApi {
    async fn send(&self, _request: &AuthRequest) -> Result<Value, ApiError> {
        std::future::pending().await
    }
}

pub fn login_payload(email: &str) -> Value {
    json!({
        "message": "Login successful",
        "user": { "id": "V1StGXR8_Z5jdHi6B-myT", "name": "Alice", "email": email, "emailVerified": true },
        "token": "eyJhbGciOiJIUzI1NiJ9.e30.sig",
        "expiresAt": "2026-10-21T00:00:00Z",
    })
}
