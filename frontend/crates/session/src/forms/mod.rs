//! Form models

pub mod reset_password;

/// Navigation targets a form can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    ForgotPassword,
    Login,
    Landing,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::ForgotPassword => "/forgot-password",
            Self::Login => "/login",
            Self::Landing => "/user/home",
        }
    }
}
