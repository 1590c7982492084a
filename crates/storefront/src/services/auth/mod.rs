//! Authentication service.
//!
//! Accounts live in the identity provider; the profile (name, phone,
//! address, role, suspension flag) lives in the `users` collection under the
//! same id.

mod error;

pub use error::AuthError;

use chrono::Utc;
use serde_json::Value;
use tracing::instrument;

use devgon_core::{Email, UserId, UserRole};

use crate::backend::{DocumentStore, Identity, IdentityProvider, Record, StoreError, to_record};
use crate::models::collections::USERS;
use crate::models::user::fields;
use crate::models::{SessionUser, User, UserProfile};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Required phone number length.
const PHONE_DIGITS: usize = 10;

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub phone: String,
    pub address: String,
}

/// Editable profile fields. The email is fixed at sign-up.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// Authentication service.
///
/// Handles registration, login and the signed-in user's profile.
pub struct AuthService<'a> {
    identity: &'a dyn IdentityProvider,
    store: &'a dyn DocumentStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityProvider, store: &'a dyn DocumentStore) -> Self {
        Self { identity, store }
    }

    /// Register a new customer and create their profile.
    ///
    /// # Errors
    ///
    /// Returns a validation error for bad input, `AuthError::UserAlreadyExists`
    /// if the email is registered, or a backend error.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: Registration) -> Result<SessionUser, AuthError> {
        let email = Email::parse(&form.email)?;
        if form.password != form.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(&form.password)?;
        let name = required("name", &form.name)?;
        let phone = validate_phone(&form.phone)?;
        let address = required("address", &form.address)?;

        let identity = self.identity.sign_up(&email, &form.password).await?;

        let profile = UserProfile {
            name,
            email: identity.email.clone(),
            phone,
            address,
            role: UserRole::User,
            suspended: false,
            created_at: Some(Utc::now()),
        };
        self.store
            .put(USERS, identity.user_id.as_str(), to_record(&profile)?)
            .await?;

        tracing::info!(user_id = %identity.user_id, "User registered");
        Ok(session_user(identity.user_id, profile))
    }

    /// Authenticate with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a wrong email/password,
    /// `AuthError::ProfileMissing` if the account has no profile and
    /// `AuthError::Suspended` for suspended accounts.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser, AuthError> {
        let email = Email::parse(email)?;
        let identity = self.identity.sign_in(&email, password).await?;

        let user = self.profile(&identity.user_id).await?;
        if user.profile.suspended {
            tracing::warn!(user_id = %user.id, "Suspended user attempted login");
            return Err(AuthError::Suspended);
        }

        Ok(session_user(user.id, user.profile))
    }

    /// End the provider-side session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if the provider fails.
    pub async fn logout(&self, user: &SessionUser) -> Result<(), AuthError> {
        self.identity
            .sign_out(&Identity {
                user_id: user.id.clone(),
                email: user.email.clone(),
            })
            .await?;
        Ok(())
    }

    /// Read a user's profile.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ProfileMissing` if there is no profile.
    pub async fn profile(&self, user_id: &UserId) -> Result<User, AuthError> {
        let doc = self
            .store
            .get(USERS, user_id.as_str())
            .await?
            .ok_or(AuthError::ProfileMissing)?;
        Ok(User {
            id: user_id.clone(),
            profile: doc.decode()?,
        })
    }

    /// Update the editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns a validation error, `AuthError::ProfileMissing` if there is no
    /// profile, or a backend error.
    #[instrument(skip(self, update))]
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<User, AuthError> {
        let mut changes = Record::new();
        changes.insert(
            fields::NAME.to_owned(),
            Value::from(required("name", &update.name)?),
        );
        changes.insert(
            fields::PHONE.to_owned(),
            Value::from(validate_phone(&update.phone)?),
        );
        changes.insert(
            fields::ADDRESS.to_owned(),
            Value::from(required("address", &update.address)?),
        );

        self.store
            .update(USERS, user_id.as_str(), changes, None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => AuthError::ProfileMissing,
                other => AuthError::Repository(other),
            })?;

        self.profile(user_id).await
    }
}

fn session_user(id: UserId, profile: UserProfile) -> SessionUser {
    SessionUser {
        id,
        email: profile.email,
        name: profile.name,
        role: profile.role,
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Exactly ten ASCII digits, surrounding whitespace ignored.
fn validate_phone(phone: &str) -> Result<String, AuthError> {
    let phone = phone.trim();
    if phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(phone.to_owned())
    } else {
        Err(AuthError::InvalidPhone)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value.to_owned())
}
