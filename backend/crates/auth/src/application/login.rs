//! Login Use Case
//!
//! Checks the password, then the verification flag, then issues a token.

use std::sync::Arc;

use chrono::Utc;
use platform::token::IssuedToken;

use crate::application::config::AuthConfig;
use crate::application::session::issue_session;
use crate::domain::entity::user::User;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::{email::Email, user_password::RawPassword};
use crate::error::{AuthError, AuthResult};

pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub token: IssuedToken,
}

pub struct LoginUseCase<R>
where
    R: UserRepository,
{
    repo: Arc<R>,
    config: Arc<AuthConfig>,
}

impl<R> LoginUseCase<R>
where
    R: UserRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<AuthConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        let email = Email::new(&input.email).map_err(|_| AuthError::InvalidCredentials)?;

        let mut user = self
            .repo
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let now = Utc::now();
        if user.is_locked_at(now) {
            return Err(AuthError::AccountLocked);
        }

        let password_valid = RawPassword::new(&input.password)
            .map(|raw| user.password_hash.verify(&raw, self.config.pepper()))
            .unwrap_or(false);

        if !password_valid {
            // Counted in storage so concurrent failures are never lost
            let failed = self
                .repo
                .record_login_failure(&email, now)
                .await?
                .ok_or(AuthError::InvalidCredentials)?;

            tracing::warn!(
                public_id = %failed.public_id,
                failed_login_count = failed.failed_login_count,
                locked = failed.is_locked_at(now),
                "Login failed"
            );
            return Err(AuthError::InvalidCredentials);
        }

        // Only callers who know the password learn the account is unverified
        if !user.email_verified {
            return Err(AuthError::EmailNotVerified);
        }

        user.record_login_at(now);
        self.repo.update_login_state(&user).await?;

        let token = issue_session(&self.config, &user)?;

        tracing::info!(
            public_id = %user.public_id,
            expires_at = %token.expires_at,
            "User logged in"
        );

        Ok(LoginOutput { user, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{display_name::DisplayName, user_password::UserPassword};
    use crate::infra::memory::MemoryUserRepository;

    async fn verified_account(repo: &MemoryUserRepository, email: &str) -> User {
        let raw = RawPassword::new("password-123").unwrap();
        let mut user = User::new(
            DisplayName::new("Alice").unwrap(),
            Email::new(email).unwrap(),
            UserPassword::from_raw(&raw, None).unwrap(),
        );
        user.email_verified = true;
        repo.create(&user).await.unwrap();
        user
    }

    fn input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_parallel_wrong_passwords_lock_account() {
        let repo = Arc::new(MemoryUserRepository::new());
        let user = verified_account(&repo, "a@x.com").await;
        let config = Arc::new(AuthConfig::development().unwrap());
        let use_case = Arc::new(LoginUseCase::new(repo.clone(), config));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let use_case = use_case.clone();
                tokio::spawn(async move { use_case.execute(input("a@x.com", "wrong-password")).await })
            })
            .collect();

        let mut rejected = 0u16;
        for task in tasks {
            match task.await.unwrap() {
                Err(AuthError::InvalidCredentials) => rejected += 1,
                Err(AuthError::AccountLocked) => {}
                other => panic!("unexpected login result: {other:?}"),
            }
        }

        let stored = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_count, rejected);
        assert!(stored.failed_login_count >= User::MAX_LOGIN_FAILURES);
        assert!(stored.is_locked_at(Utc::now()));

        let err = use_case
            .execute(input("a@x.com", "password-123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AccountLocked));
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let repo = Arc::new(MemoryUserRepository::new());
        let user = verified_account(&repo, "a@x.com").await;
        let use_case = LoginUseCase::new(repo.clone(), Arc::new(AuthConfig::development().unwrap()));

        for _ in 0..3 {
            let err = use_case
                .execute(input("a@x.com", "wrong-password"))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
        assert_eq!(
            repo.find_by_email(&user.email)
                .await
                .unwrap()
                .unwrap()
                .failed_login_count,
            3
        );

        let output = use_case.execute(input("a@x.com", "password-123")).await.unwrap();
        assert_eq!(output.user.failed_login_count, 0);

        let stored = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_count, 0);
        assert!(stored.last_login_at.is_some());
    }
}
