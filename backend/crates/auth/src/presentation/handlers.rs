//! HTTP Handlers

use axum::extract::{Extension, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CurrentUserUseCase, ForgotPasswordUseCase, LoginInput, LoginUseCase, LogoutUseCase,
    RegisterInput, RegisterUseCase, ResendVerificationUseCase, ResetPasswordInput,
    ResetPasswordUseCase, SessionClaims, VerifyEmailInput, VerifyEmailUseCase,
};
use crate::domain::mailer::OtpMailer;
use crate::domain::repository::UserRepository;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CurrentUserResponse, EmailRequest, LoginRequest, MessageResponse, RegisterRequest,
    RegisterResponse, ResetPasswordRequest, SessionResponse, UserResponse, VerifyEmailRequest,
};

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/user/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(RegisterInput {
            name: req.name,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful. Please verify your email.".to_string(),
            user: UserResponse::from(&output.user),
        }),
    ))
}

// ============================================================================
// Login / Logout
// ============================================================================

/// POST /api/user/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    let cookie = session_cookie(&state.config, &output.token.token)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            message: "Login successful".to_string(),
            user: UserResponse::from(&output.user),
            token: output.token.token,
            expires_at: output.token.expires_at,
        }),
    ))
}

/// POST /api/user/logout
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> impl IntoResponse
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let token = session_token(&headers, &state.config);
    LogoutUseCase::new(state.config.clone()).execute(token.as_deref());

    let mut response = (
        StatusCode::OK,
        Json(MessageResponse::new("Logged out successfully")),
    )
        .into_response();

    if let Some(cookie) = state.config.cookie.delete_cookie_header() {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }

    response
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /api/user/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = VerifyEmailUseCase::new(state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(VerifyEmailInput {
            email: req.email,
            otp: req.otp,
        })
        .await?;

    let cookie = session_cookie(&state.config, &output.token.token)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(SessionResponse {
            message: "Email verified successfully".to_string(),
            user: UserResponse::from(&output.user),
            token: output.token.token,
            expires_at: output.token.expires_at,
        }),
    ))
}

/// POST /api/user/resend-verification
pub async fn resend_verification<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = ResendVerificationUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "Verification OTP resent. Please check your email.",
    )))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/user/forgot-password
pub async fn forgot_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<EmailRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = ForgotPasswordUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    use_case.execute(&req.email).await?;

    Ok(Json(MessageResponse::new(
        "Password reset OTP sent. Please check your email.",
    )))
}

/// POST /api/user/reset-password
pub async fn reset_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<ResetPasswordRequest>,
) -> AuthResult<Json<MessageResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let use_case = ResetPasswordUseCase::new(state.repo.clone(), state.config.clone());

    use_case
        .execute(ResetPasswordInput {
            email: req.email,
            otp: req.otp,
            password: req.password,
        })
        .await?;

    Ok(Json(MessageResponse::new(
        "Your password has been reset successfully.",
    )))
}

// ============================================================================
// Current User (requires authentication)
// ============================================================================

/// GET /api/user/me
pub async fn me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(claims): Extension<SessionClaims>,
) -> AuthResult<Json<CurrentUserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: OtpMailer + Clone + Send + Sync + 'static,
{
    let user = CurrentUserUseCase::new(state.repo.clone())
        .execute(&claims)
        .await?;

    Ok(Json(CurrentUserResponse {
        user: UserResponse::from(&user),
    }))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `Authorization: Bearer` first, then the session cookie
pub fn session_token(headers: &HeaderMap, config: &AuthConfig) -> Option<String> {
    platform::cookie::extract_bearer(headers)
        .or_else(|| platform::cookie::extract_cookie(headers, &config.cookie.name))
}

fn session_cookie(config: &AuthConfig, token: &str) -> AuthResult<HeaderValue> {
    config
        .cookie
        .set_cookie_header(token, config.cookie_max_age_secs())
        .ok_or_else(|| AuthError::Internal("Session cookie is not a valid header".to_string()))
}
