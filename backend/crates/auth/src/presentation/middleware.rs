//! Auth Middleware
//!
//! Guards routes that need a signed-in user.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::session::authenticate;
use crate::error::AuthError;
use crate::presentation::handlers::session_token;

/// Rejects with 401 unless a valid token is presented. On success the
/// decoded `SessionClaims` are stored in the request extensions.
pub async fn require_session(
    State(config): State<Arc<AuthConfig>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token(req.headers(), &config).ok_or(AuthError::TokenInvalid)?;
    let claims = authenticate(&config, &token)?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}
