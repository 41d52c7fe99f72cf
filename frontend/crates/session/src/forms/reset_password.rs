//! Reset-password form
//!
//! Reached from the forgot-password step, which hands over the email the
//! reset code was sent to.

use std::collections::BTreeMap;

use crate::api::{AuthApi, AuthRequest};
use crate::feedback::error_message;
use crate::forms::Route;
use crate::storage::SessionStorage;
use crate::store::{AuthStore, DispatchResult};

const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ResetField {
    Otp,
    Password,
    ConfirmPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent
    Invalid,
    Navigate(Route),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct ResetPasswordForm {
    email: String,
    otp: String,
    password: String,
    confirm_password: String,
    errors: BTreeMap<ResetField, &'static str>,
}

impl ResetPasswordForm {
    /// Without an email the user is sent back to request a code first.
    pub fn enter(email: Option<String>) -> Result<Self, Route> {
        match email {
            Some(email) if !email.trim().is_empty() => Ok(Self {
                email,
                ..Default::default()
            }),
            _ => Err(Route::ForgotPassword),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn value(&self, field: ResetField) -> &str {
        match field {
            ResetField::Otp => &self.otp,
            ResetField::Password => &self.password,
            ResetField::ConfirmPassword => &self.confirm_password,
        }
    }

    pub fn update(&mut self, field: ResetField, value: impl Into<String>) {
        let value = value.into();
        match field {
            ResetField::Otp => self.otp = value,
            ResetField::Password => self.password = value,
            ResetField::ConfirmPassword => self.confirm_password = value,
        }
        self.errors.remove(&field);
    }

    pub fn error(&self, field: ResetField) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    pub fn errors(&self) -> &BTreeMap<ResetField, &'static str> {
        &self.errors
    }

    /// Checks every field and replaces the error map. Returns whether the
    /// form can be submitted.
    pub fn validate(&mut self) -> bool {
        self.errors.clear();

        if self.otp.trim().is_empty() {
            self.errors.insert(ResetField::Otp, "OTP is required");
        }

        let password = self.password.trim();
        if password.is_empty() {
            self.errors
                .insert(ResetField::Password, "Password is required");
        } else if password.chars().count() < MIN_PASSWORD_LENGTH {
            self.errors.insert(
                ResetField::Password,
                "Password must be at least 8 characters long",
            );
        }

        let confirm = self.confirm_password.trim();
        if confirm.is_empty() {
            self.errors
                .insert(ResetField::ConfirmPassword, "Please confirm your password");
        } else if confirm != password {
            self.errors
                .insert(ResetField::ConfirmPassword, "Passwords do not match");
        }

        self.errors.is_empty()
    }

    pub async fn submit<A, S>(&mut self, store: &AuthStore<A, S>) -> SubmitOutcome
    where
        A: AuthApi,
        S: SessionStorage,
    {
        if !self.validate() {
            return SubmitOutcome::Invalid;
        }

        let request = AuthRequest::ResetPassword {
            email: self.email.clone(),
            otp: self.otp.trim().to_string(),
            password: self.password.trim().to_string(),
        };

        match store.dispatch(request).await {
            DispatchResult::Fulfilled(_) => {
                store.clear();
                SubmitOutcome::Navigate(Route::Landing)
            }
            DispatchResult::Rejected(error) => {
                // Banner is dropped after the error delay
                store.acknowledge();
                SubmitOutcome::Failed(error_message(&error))
            }
        }
    }

    /// "Back to login" link
    pub fn cancel(&self) -> Route {
        Route::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::storage::MemorySessionStorage;
    use crate::testing::ScriptedApi;
    use serde_json::json;

    fn filled(password: &str, confirm: &str) -> ResetPasswordForm {
        let mut form = ResetPasswordForm::enter(Some("a@x.com".to_string())).unwrap();
        form.update(ResetField::Otp, " 123456 ");
        form.update(ResetField::Password, password);
        form.update(ResetField::ConfirmPassword, confirm);
        form
    }

    #[test]
    fn test_enter_without_email_redirects() {
        assert_eq!(
            ResetPasswordForm::enter(None).unwrap_err(),
            Route::ForgotPassword
        );
        assert_eq!(
            ResetPasswordForm::enter(Some("  ".to_string())).unwrap_err(),
            Route::ForgotPassword
        );
        assert_eq!(Route::ForgotPassword.path(), "/forgot-password");
    }

    #[test]
    fn test_empty_form_reports_every_field() {
        let mut form = ResetPasswordForm::enter(Some("a@x.com".to_string())).unwrap();

        assert!(!form.validate());
        assert_eq!(form.error(ResetField::Otp), Some("OTP is required"));
        assert_eq!(form.error(ResetField::Password), Some("Password is required"));
        assert_eq!(
            form.error(ResetField::ConfirmPassword),
            Some("Please confirm your password")
        );
    }

    #[test]
    fn test_password_length_boundary() {
        let mut short = filled("1234567", "1234567");
        assert!(!short.validate());
        assert_eq!(
            short.error(ResetField::Password),
            Some("Password must be at least 8 characters long")
        );

        let mut ok = filled("12345678", "12345678");
        assert!(ok.validate());
    }

    #[test]
    fn test_password_is_trimmed_before_length_check() {
        let mut form = filled("  1234567  ", "1234567");
        assert!(!form.validate());
        assert!(form.error(ResetField::Password).is_some());
    }

    #[test]
    fn test_update_clears_field_error() {
        let mut form = ResetPasswordForm::enter(Some("a@x.com".to_string())).unwrap();
        form.validate();

        form.update(ResetField::Otp, "123456");

        assert!(form.error(ResetField::Otp).is_none());
        assert!(form.error(ResetField::Password).is_some());
        assert_eq!(form.value(ResetField::Otp), "123456");
    }

    #[tokio::test]
    async fn test_one_char_mismatch_sends_nothing() {
        let store = AuthStore::new(ScriptedApi::new(vec![]), MemorySessionStorage::new());
        let mut form = filled("new-password", "new-passwore");

        let outcome = form.submit(&store).await;

        assert_eq!(outcome, SubmitOutcome::Invalid);
        assert_eq!(
            form.error(ResetField::ConfirmPassword),
            Some("Passwords do not match")
        );
        assert!(store.api().sent().is_empty());
        assert!(!store.state().loading);
    }

    #[tokio::test]
    async fn test_success_navigates_to_landing() {
        let api = ScriptedApi::new(vec![Ok(
            json!({"message": "Your password has been reset successfully."}),
        )]);
        let store = AuthStore::new(api, MemorySessionStorage::new());
        let mut form = filled(" new-password ", "new-password");

        let outcome = form.submit(&store).await;

        assert_eq!(outcome, SubmitOutcome::Navigate(Route::Landing));
        assert_eq!(Route::Landing.path(), "/user/home");
        let state = store.state();
        assert!(state.success.is_none());
        assert!(state.error.is_none());

        let sent = store.api().sent();
        assert_eq!(
            sent,
            vec![AuthRequest::ResetPassword {
                email: "a@x.com".to_string(),
                otp: "123456".to_string(),
                password: "new-password".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_rejection_surfaces_server_message() {
        let api = ScriptedApi::new(vec![Err(ApiError::Rejected {
            status: 400,
            body: json!({"message": "Invalid OTP", "kind": "BAD_REQUEST", "status": 400, "action": null}),
        })]);
        let store = AuthStore::new(api, MemorySessionStorage::new());
        let mut form = filled("new-password", "new-password");

        let outcome = form.submit(&store).await;

        assert_eq!(outcome, SubmitOutcome::Failed("Invalid OTP".to_string()));
        assert_eq!(store.state().error.unwrap()["message"], "Invalid OTP");
    }

    #[test]
    fn test_cancel_goes_to_login() {
        let form = ResetPasswordForm::enter(Some("a@x.com".to_string())).unwrap();
        assert_eq!(form.cancel().path(), "/login");
    }
}
