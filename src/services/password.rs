//! Password form validation
//!
//! Runs before any network call so that obviously bad input never reaches
//! the backend.

/// Shortest password the forms accept
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Why a new password was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("Passwords do not match")]
    Mismatch,
    #[error("Password must be at least {} characters", MIN_PASSWORD_LENGTH)]
    TooShort,
}

/// Check a new password against its confirmation.
///
/// The mismatch check runs first, matching the order users see errors in.
/// Length is counted in characters, not bytes.
pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), PasswordError> {
    if password != confirm {
        return Err(PasswordError::Mismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}
