//! Authentication extractors.
//!
//! The signed-in user is stored in the session under
//! [`session_keys::CURRENT_USER`] at login and removed at logout.
//! [`RequireAuth`] and [`RequireAdmin`] re-read the `users` profile on every
//! request, so a suspension or role change applies to sessions that are
//! already open.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{SessionUser, session_keys};
use crate::services::auth::AuthError;
use crate::state::AppState;

/// Extractor that requires a signed-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn my_orders(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Orders for {}", user.email)
/// }
/// ```
pub struct RequireAuth(pub SessionUser);

/// Extractor that requires a signed-in administrator.
pub struct RequireAdmin(pub SessionUser);

/// Rejection from the auth extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthRejection {
    /// Nobody is signed in; the client should prompt for login.
    Unauthorized,
    /// Signed in, but not an administrator.
    Forbidden,
    /// Signed in, but the account has been suspended since.
    Suspended,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Please sign in to continue"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Administrator access required"),
            Self::Suspended => (StatusCode::FORBIDDEN, "This account has been suspended"),
        };
        (status, Json(json!({ "error": message, "login": "/auth/login" }))).into_response()
    }
}

async fn current_user(parts: &Parts) -> Option<SessionUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// The session user with role and name taken from the stored profile.
///
/// A missing profile counts as signed out and a suspended one is refused. If
/// the store cannot be reached the session copy is used as-is, so read
/// routes keep degrading to notices instead of failing.
async fn refresh(state: &AppState, user: SessionUser) -> Result<SessionUser, AuthRejection> {
    match state.auth().profile(&user.id).await {
        Ok(current) if current.profile.suspended => {
            tracing::warn!(user_id = %user.id, "Suspended user denied");
            Err(AuthRejection::Suspended)
        }
        Ok(current) => Ok(SessionUser {
            name: current.profile.name,
            role: current.profile.role,
            ..user
        }),
        Err(AuthError::ProfileMissing) => {
            tracing::warn!(user_id = %user.id, "Session user has no profile");
            Err(AuthRejection::Unauthorized)
        }
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Profile check skipped");
            Ok(user)
        }
    }
}

impl<S> FromRequestParts<S> for RequireAuth
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;
        refresh(&AppState::from_ref(state), user).await.map(Self)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts)
            .await
            .ok_or(AuthRejection::Unauthorized)?;
        let user = refresh(&AppState::from_ref(state), user).await?;
        if !user.is_admin() {
            tracing::warn!(user_id = %user.id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(user))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireAuth`, this does not reject the request if nobody is signed in.
pub struct OptionalAuth(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_user(parts).await))
    }
}

/// Store the signed-in user, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Clear the whole session (logout), cart included.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
