//! Outbound mail port

use crate::domain::value_object::{
    display_name::DisplayName,
    email::Email,
    otp::{OtpCode, OtpPurpose},
};
use crate::error::AuthResult;

#[trait_variant::make(OtpMailer: Send)]
pub trait LocalOtpMailer {
    async fn send_otp(
        &self,
        to: &Email,
        name: &DisplayName,
        purpose: OtpPurpose,
        code: &OtpCode,
    ) -> AuthResult<()>;
}
