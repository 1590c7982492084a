//! Authentication error types.

use thiserror::Error;

use crate::backend::{IdentityError, StoreError};

/// Errors that can occur during authentication and profile operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] devgon_core::EmailError),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Phone is not exactly ten digits.
    #[error("phone number must be exactly 10 digits")]
    InvalidPhone,

    /// A required profile field is blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Invalid credentials (wrong password or unknown email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// The identity exists but has no `users` profile.
    #[error("user data not found")]
    ProfileMissing,

    /// The account has been suspended by an administrator.
    #[error("account suspended")]
    Suspended,

    /// Identity provider failure.
    #[error("identity provider error: {0}")]
    Identity(IdentityError),

    /// Document store failure.
    #[error("profile store error: {0}")]
    Repository(#[from] StoreError),
}

impl From<IdentityError> for AuthError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::EmailTaken => Self::UserAlreadyExists,
            IdentityError::InvalidCredentials => Self::InvalidCredentials,
            other @ IdentityError::Unavailable(_) => Self::Identity(other),
        }
    }
}
