//! Argon2id password hashing shared by the identity adapters.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use super::IdentityError;

/// Work factor for new hashes.
///
/// Verification always uses the parameters embedded in the stored hash, so
/// accounts hashed at either cost verify the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashCost {
    /// Argon2id defaults.
    #[default]
    Standard,
    /// Minimum memory and a single pass, for throwaway in-memory accounts.
    Light,
}

impl HashCost {
    fn hasher(self) -> Result<Argon2<'static>, IdentityError> {
        match self {
            Self::Standard => Ok(Argon2::default()),
            Self::Light => {
                let params = Params::new(Params::MIN_M_COST, 1, 1, None)
                    .map_err(|e| IdentityError::Unavailable(format!("argon2 params: {e}")))?;
                Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
            }
        }
    }
}

/// Hash a password into a PHC string.
pub(crate) fn hash_password(password: &str, cost: HashCost) -> Result<String, IdentityError> {
    let salt = SaltString::generate(&mut OsRng);

    cost.hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| IdentityError::Unavailable(format!("password hashing failed: {e}")))
}

/// Verify a password against a stored PHC string.
pub(crate) fn verify_password(password: &str, hash: &str) -> Result<(), IdentityError> {
    let parsed = PasswordHash::new(hash).map_err(|_| IdentityError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| IdentityError::InvalidCredentials)
}
