//! Account route handlers.
//!
//! These routes require authentication.

use axum::{Json, extract::State};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::{RequireAuth, set_current_user};
use crate::models::{SessionUser, User};
use crate::services::auth::ProfileUpdate;
use crate::state::AppState;

/// Profile form data. The email cannot be changed.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub name: String,
    pub phone: String,
    pub address: String,
}

/// The signed-in user's profile.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.auth().profile(&user.id).await?))
}

/// Update name, phone and address.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Json(form): Json<ProfileForm>,
) -> Result<Json<User>, AppError> {
    let updated = state
        .auth()
        .update_profile(
            &user.id,
            ProfileUpdate {
                name: form.name,
                phone: form.phone,
                address: form.address,
            },
        )
        .await?;

    // Keep the display name in the session in step with the profile.
    if updated.profile.name != user.name {
        let refreshed = SessionUser {
            name: updated.profile.name.clone(),
            ..user
        };
        set_current_user(&session, &refreshed).await?;
    }

    Ok(Json(updated))
}
