//! Authentication route handlers.
//!
//! Registration signs the new customer in straight away. Login rotates the
//! session id before storing the user.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::SessionUser;
use crate::services::auth::Registration;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub phone: String,
    pub address: String,
}

/// The signed-in user, if any.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: Option<SessionUser>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and sign in.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RegisterForm>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .auth()
        .register(Registration {
            name: form.name,
            email: form.email,
            password: form.password,
            password_confirm: form.password_confirm,
            phone: form.phone,
            address: form.address,
        })
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((StatusCode::CREATED, Json(MeResponse { user: Some(user) })))
}

/// Sign in with email and password.
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<MeResponse>, AppError> {
    let user = state
        .auth()
        .login(&form.email, &form.password)
        .await?;

    set_current_user(&session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(MeResponse { user: Some(user) }))
}

/// Sign out and drop the session, cart included.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode, AppError> {
    if let Some(user) = &user
        && let Err(e) = state.auth().logout(user).await
    {
        tracing::warn!(error = %e, "Identity provider sign-out failed");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();

    Ok(StatusCode::NO_CONTENT)
}

/// The current user, or `null`.
pub async fn me(OptionalAuth(user): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse { user })
}
