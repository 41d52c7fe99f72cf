//! PostgreSQL Repository Implementation

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::user::User;
use crate::domain::repository::{OtpCheck, OtpEffect, UserRepository};
use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    otp::{OtpPurpose, PendingOtp},
    public_id::PublicId,
    user_id::UserId,
    user_password::UserPassword,
};
use crate::error::{AuthError, AuthResult};

const USER_COLUMNS: &str = r#"
    user_id,
    public_id,
    name,
    email,
    password_hash,
    email_verified,
    verification_otp_hash,
    verification_otp_expires_at,
    reset_otp_hash,
    reset_otp_expires_at,
    failed_login_count,
    locked_until,
    last_login_at,
    created_at,
    updated_at
"#;

/// (hash column, expiry column) for a purpose
fn otp_columns(purpose: OtpPurpose) -> (&'static str, &'static str) {
    match purpose {
        OtpPurpose::EmailVerification => ("verification_otp_hash", "verification_otp_expires_at"),
        OtpPurpose::PasswordReset => ("reset_otp_hash", "reset_otp_expires_at"),
    }
}

/// PostgreSQL-backed user repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Startup housekeeping: drop codes that can no longer be used
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        let purged = self.purge_expired_otps(Utc::now()).await?;
        tracing::info!(otps_purged = purged, "Cleaned up expired OTPs");
        Ok(purged)
    }

    async fn find_one(&self, column: &'static str, value: &str) -> AuthResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn apply_effect(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code_hash: &[u8; 32],
        now: DateTime<Utc>,
        effect: &OtpEffect,
    ) -> AuthResult<Option<User>> {
        let (hash_col, exp_col) = otp_columns(purpose);

        // Matching, unexpired code only: clear it and apply the effect
        let (set_effect, password) = match effect {
            OtpEffect::MarkVerified => ("email_verified = TRUE", None),
            OtpEffect::SetPassword(hash) => (
                "password_hash = $4, failed_login_count = 0, locked_until = NULL",
                Some(hash.as_phc_string()),
            ),
        };

        let sql = format!(
            r#"
            UPDATE users SET
                {hash_col} = NULL,
                {exp_col} = NULL,
                {set_effect},
                updated_at = $3
            WHERE email = $1
              AND {hash_col} = $2
              AND {exp_col} > $3
            RETURNING {USER_COLUMNS}
            "#
        );

        let mut query = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .bind(code_hash.as_slice())
            .bind(now);
        if let Some(password) = password {
            query = query.bind(password);
        }

        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| r.into_user()).transpose()
    }

    /// Matching but expired code: invalidate it
    async fn invalidate_expired(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code_hash: &[u8; 32],
        now: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let (hash_col, exp_col) = otp_columns(purpose);
        let sql = format!(
            r#"
            UPDATE users SET {hash_col} = NULL, {exp_col} = NULL, updated_at = $3
            WHERE email = $1
              AND {hash_col} = $2
              AND {exp_col} <= $3
            "#
        );

        let affected = sqlx::query(&sql)
            .bind(email.as_str())
            .bind(code_hash.as_slice())
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for PgAuthRepository {
    async fn create(&self, user: &User) -> AuthResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                user_id,
                public_id,
                name,
                email,
                password_hash,
                email_verified,
                verification_otp_hash,
                verification_otp_expires_at,
                reset_otp_hash,
                reset_otp_expires_at,
                failed_login_count,
                locked_until,
                last_login_at,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.public_id.as_str())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(user.password_hash.as_phc_string())
        .bind(user.email_verified)
        .bind(user.verification_otp.as_ref().map(|o| o.code_hash.to_vec()))
        .bind(user.verification_otp.as_ref().map(|o| o.expires_at))
        .bind(user.reset_otp.as_ref().map(|o| o.code_hash.to_vec()))
        .bind(user.reset_otp.as_ref().map(|o| o.expires_at))
        .bind(user.failed_login_count as i16)
        .bind(user.locked_until)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<User>> {
        self.find_one("email", email.as_str()).await
    }

    async fn find_by_public_id(&self, public_id: &PublicId) -> AuthResult<Option<User>> {
        self.find_one("public_id", public_id.as_str()).await
    }

    async fn update_login_state(&self, user: &User) -> AuthResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                failed_login_count = $2,
                locked_until = $3,
                last_login_at = $4,
                updated_at = $5
            WHERE user_id = $1
            "#,
        )
        .bind(user.user_id.as_uuid())
        .bind(user.failed_login_count as i16)
        .bind(user.locked_until)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn record_login_failure(
        &self,
        email: &Email,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<User>> {
        // One statement: the row lock serializes concurrent failures
        let sql = format!(
            r#"
            UPDATE users SET
                failed_login_count = LEAST(failed_login_count + 1, 32767),
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2 THEN $3
                    ELSE locked_until
                END,
                updated_at = $4
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .bind(User::MAX_LOGIN_FAILURES as i16)
            .bind(now + Duration::minutes(User::LOCKOUT_MINUTES))
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn replace_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        otp: &PendingOtp,
    ) -> AuthResult<Option<User>> {
        let (hash_col, exp_col) = otp_columns(purpose);
        let sql = format!(
            r#"
            UPDATE users SET {hash_col} = $2, {exp_col} = $3, updated_at = NOW()
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.as_str())
            .bind(otp.code_hash.as_slice())
            .bind(otp.expires_at)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_user()).transpose()
    }

    async fn consume_otp(
        &self,
        email: &Email,
        purpose: OtpPurpose,
        code_hash: &[u8; 32],
        now: DateTime<Utc>,
        effect: OtpEffect,
    ) -> AuthResult<OtpCheck> {
        if let Some(user) = self
            .apply_effect(email, purpose, code_hash, now, &effect)
            .await?
        {
            return Ok(OtpCheck::Accepted(user));
        }

        if self.invalidate_expired(email, purpose, code_hash, now).await? {
            return Ok(OtpCheck::Expired);
        }

        let (hash_col, _) = otp_columns(purpose);
        let sql = format!("SELECT {hash_col} IS NOT NULL FROM users WHERE email = $1");
        let has_pending = sqlx::query_scalar::<_, bool>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        Ok(match has_pending {
            None => OtpCheck::UnknownUser,
            Some(false) => OtpCheck::NoPendingCode,
            Some(true) => OtpCheck::Mismatch,
        })
    }

    async fn purge_expired_otps(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut purged = 0;

        for purpose in [OtpPurpose::EmailVerification, OtpPurpose::PasswordReset] {
            let (hash_col, exp_col) = otp_columns(purpose);
            let sql = format!(
                "UPDATE users SET {hash_col} = NULL, {exp_col} = NULL WHERE {exp_col} <= $1"
            );
            purged += sqlx::query(&sql)
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected();
        }

        Ok(purged)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    user_id: Uuid,
    public_id: String,
    name: String,
    email: String,
    password_hash: String,
    email_verified: bool,
    verification_otp_hash: Option<Vec<u8>>,
    verification_otp_expires_at: Option<DateTime<Utc>>,
    reset_otp_hash: Option<Vec<u8>>,
    reset_otp_expires_at: Option<DateTime<Utc>>,
    failed_login_count: i16,
    locked_until: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn pending_otp(
    hash: Option<Vec<u8>>,
    expires_at: Option<DateTime<Utc>>,
) -> AuthResult<Option<PendingOtp>> {
    match (hash, expires_at) {
        (Some(hash), Some(expires_at)) => {
            let code_hash: [u8; 32] = hash
                .try_into()
                .map_err(|_| AuthError::Internal("Invalid OTP hash length".to_string()))?;
            Ok(Some(PendingOtp {
                code_hash,
                expires_at,
            }))
        }
        _ => Ok(None),
    }
}

impl UserRow {
    fn into_user(self) -> AuthResult<User> {
        let public_id = PublicId::parse_str(&self.public_id)
            .map_err(|e| AuthError::Internal(format!("Invalid public_id: {}", e)))?;

        let password_hash = UserPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        Ok(User {
            user_id: UserId::from_uuid(self.user_id),
            public_id,
            name: DisplayName::from_db(self.name),
            email: Email::from_db(self.email),
            password_hash,
            email_verified: self.email_verified,
            verification_otp: pending_otp(
                self.verification_otp_hash,
                self.verification_otp_expires_at,
            )?,
            reset_otp: pending_otp(self.reset_otp_hash, self.reset_otp_expires_at)?,
            failed_login_count: self.failed_login_count.max(0) as u16,
            locked_until: self.locked_until,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{otp::OtpCode, user_password::RawPassword};
    use sqlx::postgres::PgPoolOptions;

    /// Migrated pool, or `None` when `TEST_DATABASE_URL` is not set
    async fn test_repo(test: &str) -> Option<PgAuthRepository> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("SKIP-TEST-POSTGRES: {test} skipped, TEST_DATABASE_URL not set");
            return None;
        };

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .unwrap();
        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await
            .unwrap();

        Some(PgAuthRepository::new(pool))
    }

    fn hash(password: &str) -> UserPassword {
        UserPassword::from_raw(&RawPassword::new(password).unwrap(), None).unwrap()
    }

    /// Fresh account with a unique address so runs never collide
    async fn seeded_user(repo: &PgAuthRepository) -> User {
        let email = Email::new(&format!("{}@pg.test", PublicId::new())).unwrap();
        let user = User::new(DisplayName::new("Test").unwrap(), email, hash("password-123"));
        repo.create(&user).await.unwrap();
        user
    }

    async fn issue(repo: &PgAuthRepository, user: &User, purpose: OtpPurpose) -> OtpCode {
        let code = OtpCode::generate();
        let otp = PendingOtp::issue(&code, Duration::minutes(10), Utc::now());
        assert!(repo.replace_otp(&user.email, purpose, &otp).await.unwrap().is_some());
        code
    }

    #[tokio::test]
    async fn test_accepted_code_cannot_be_reused() {
        let Some(repo) = test_repo("test_accepted_code_cannot_be_reused").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let digest = issue(&repo, &user, OtpPurpose::EmailVerification)
            .await
            .digest();

        let consume = || {
            repo.consume_otp(
                &user.email,
                OtpPurpose::EmailVerification,
                &digest,
                Utc::now(),
                OtpEffect::MarkVerified,
            )
        };

        match consume().await.unwrap() {
            OtpCheck::Accepted(u) => {
                assert!(u.email_verified);
                assert!(u.verification_otp.is_none());
            }
            other => panic!("expected Accepted, got {other:?}"),
        }
        assert!(matches!(consume().await.unwrap(), OtpCheck::NoPendingCode));
    }

    #[tokio::test]
    async fn test_mismatch_leaves_code_and_password() {
        let Some(repo) = test_repo("test_mismatch_leaves_code_and_password").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let code = issue(&repo, &user, OtpPurpose::PasswordReset).await;
        let before = repo.find_by_email(&user.email).await.unwrap().unwrap();

        let wrong = if code.as_str() == "000000" { "111111" } else { "000000" };
        let wrong = OtpCode::parse(wrong).unwrap();
        let check = repo
            .consume_otp(
                &user.email,
                OtpPurpose::PasswordReset,
                &wrong.digest(),
                Utc::now(),
                OtpEffect::SetPassword(hash("new-password")),
            )
            .await
            .unwrap();
        assert!(matches!(check, OtpCheck::Mismatch));

        let after = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(
            after.reset_otp.map(|o| o.code_hash),
            before.reset_otp.map(|o| o.code_hash)
        );
        assert_eq!(after.password_hash, user.password_hash);

        // The right code still works and swaps the password
        let check = repo
            .consume_otp(
                &user.email,
                OtpPurpose::PasswordReset,
                &code.digest(),
                Utc::now(),
                OtpEffect::SetPassword(hash("new-password")),
            )
            .await
            .unwrap();
        let OtpCheck::Accepted(updated) = check else {
            panic!("expected Accepted, got {check:?}");
        };
        let raw = RawPassword::new("new-password").unwrap();
        assert!(updated.password_hash.verify(&raw, None));
        assert!(updated.reset_otp.is_none());
    }

    #[tokio::test]
    async fn test_expired_code_is_cleared() {
        let Some(repo) = test_repo("test_expired_code_is_cleared").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let code = issue(&repo, &user, OtpPurpose::EmailVerification).await;
        let late = Utc::now() + Duration::minutes(11);

        let check = repo
            .consume_otp(
                &user.email,
                OtpPurpose::EmailVerification,
                &code.digest(),
                late,
                OtpEffect::MarkVerified,
            )
            .await
            .unwrap();
        assert!(matches!(check, OtpCheck::Expired));

        let stored = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert!(stored.verification_otp.is_none());
        assert!(!stored.email_verified);
    }

    #[tokio::test]
    async fn test_replaced_code_stops_working() {
        let Some(repo) = test_repo("test_replaced_code_stops_working").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let old = issue(&repo, &user, OtpPurpose::EmailVerification).await;
        let new = loop {
            let code = issue(&repo, &user, OtpPurpose::EmailVerification).await;
            if code.as_str() != old.as_str() {
                break code;
            }
        };

        let check = repo
            .consume_otp(
                &user.email,
                OtpPurpose::EmailVerification,
                &old.digest(),
                Utc::now(),
                OtpEffect::MarkVerified,
            )
            .await
            .unwrap();
        assert!(matches!(check, OtpCheck::Mismatch));

        let check = repo
            .consume_otp(
                &user.email,
                OtpPurpose::EmailVerification,
                &new.digest(),
                Utc::now(),
                OtpEffect::MarkVerified,
            )
            .await
            .unwrap();
        assert!(matches!(check, OtpCheck::Accepted(_)));
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let Some(repo) = test_repo("test_duplicate_email_rejected").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let twin = User::new(
            DisplayName::new("Twin").unwrap(),
            user.email.clone(),
            hash("password-456"),
        );

        let err = repo.create(&twin).await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_unknown_email() {
        let Some(repo) = test_repo("test_unknown_email").await else {
            return;
        };
        let email = Email::new(&format!("{}@pg.test", PublicId::new())).unwrap();

        assert!(repo.find_by_email(&email).await.unwrap().is_none());
        assert!(repo.record_login_failure(&email, Utc::now()).await.unwrap().is_none());
        let check = repo
            .consume_otp(
                &email,
                OtpPurpose::PasswordReset,
                &[0u8; 32],
                Utc::now(),
                OtpEffect::MarkVerified,
            )
            .await
            .unwrap();
        assert!(matches!(check, OtpCheck::UnknownUser));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_failures_all_counted() {
        let Some(repo) = test_repo("test_concurrent_failures_all_counted").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let now = Utc::now();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let repo = repo.clone();
                let email = user.email.clone();
                tokio::spawn(async move { repo.record_login_failure(&email, now).await })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap().unwrap().is_some());
        }

        let stored = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(stored.failed_login_count, 20);
        assert!(stored.is_locked_at(now));

        // A successful login resets the counter
        let mut stored = stored;
        stored.record_login_at(now);
        repo.update_login_state(&stored).await.unwrap();
        let reset = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert_eq!(reset.failed_login_count, 0);
        assert!(!reset.is_locked_at(now));
    }

    #[tokio::test]
    async fn test_purge_clears_only_expired() {
        let Some(repo) = test_repo("test_purge_clears_only_expired").await else {
            return;
        };
        let user = seeded_user(&repo).await;
        let now = Utc::now();
        let stale = PendingOtp::issue(
            &OtpCode::generate(),
            Duration::minutes(10),
            now - Duration::hours(1),
        );
        repo.replace_otp(&user.email, OtpPurpose::EmailVerification, &stale)
            .await
            .unwrap();
        issue(&repo, &user, OtpPurpose::PasswordReset).await;

        assert!(repo.purge_expired_otps(now).await.unwrap() >= 1);

        let stored = repo.find_by_email(&user.email).await.unwrap().unwrap();
        assert!(stored.verification_otp.is_none());
        assert!(stored.reset_otp.is_some());
    }
}
