use thiserror::Error;

use crate::types::Credentials;

/// Maximum accepted username length, matching the `users.username` column width.
pub const MAX_USERNAME_LEN: usize = 20;

/// Maximum accepted password length, matching the `users.password` column width.
pub const MAX_PASSWORD_LEN: usize = 40;

/// Pure validation rules applied to registration payloads before any row is
/// written.
pub struct RegistrationPolicy;

impl RegistrationPolicy {
    /// Checks the submitted credentials against the account limits.
    ///
    /// Lengths are counted in characters, not bytes, so multi-byte usernames
    /// are measured the way the columns were sized.
    pub fn validate(credentials: &Credentials) -> Result<(), RegistrationError> {
        if credentials.username.chars().count() > MAX_USERNAME_LEN {
            return Err(RegistrationError::UsernameTooLong);
        }
        if credentials.password.chars().count() > MAX_PASSWORD_LEN {
            return Err(RegistrationError::PasswordTooLong);
        }
        Ok(())
    }
}

/// Reasons a registration payload is rejected before reaching storage.
///
/// The display strings are part of the service's wire contract; handlers
/// prefix them with "unsuccessful registration: ".
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("username too long")]
    UsernameTooLong,
    #[error("password too long")]
    PasswordTooLong,
}
