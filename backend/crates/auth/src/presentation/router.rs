//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::UserRepository;
use crate::infra::{mail::LogMailer, postgres::PgAuthRepository};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_session;

/// Create the Auth router with PostgreSQL repository and log delivery
pub fn auth_router(repo: PgAuthRepository, config: AuthConfig) -> Router {
    auth_router_generic(repo, LogMailer, config)
}

/// Create a generic Auth router for any repository and mailer
pub fn auth_router_generic<R, M>(repo: R, mailer: M, config: AuthConfig) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let state = AuthAppState {
        repo: Arc::new(repo),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    Router::new()
        .route("/me", get(handlers::me::<R, M>))
        .route_layer(middleware::from_fn_with_state(
            state.config.clone(),
            require_session,
        ))
        .route("/register", post(handlers::register::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/logout", post(handlers::logout::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route(
            "/resend-verification",
            post(handlers::resend_verification::<R, M>),
        )
        .route("/forgot-password", post(handlers::forgot_password::<R, M>))
        .route("/reset-password", post(handlers::reset_password::<R, M>))
        .with_state(state)
}
