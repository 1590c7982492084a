//! Admin user handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use tracing::instrument;

use devgon_core::UserId;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::User;
use crate::routes::Listing;
use crate::services::users::UserWithOrders;
use crate::state::AppState;

/// Suspend form data.
#[derive(Debug, Deserialize)]
pub struct SuspendForm {
    pub suspended: bool,
}

/// Every user with their orders.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<Listing<UserWithOrders>> {
    let result = state.users().list_users_with_orders().await;
    Json(Listing::from_read("users", result))
}

/// Suspend or reinstate a user.
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn suspend(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<UserId>,
    Json(form): Json<SuspendForm>,
) -> Result<Json<User>, AppError> {
    if id == admin.id && form.suspended {
        return Err(AppError::BadRequest(
            "You cannot suspend your own account".to_string(),
        ));
    }
    Ok(Json(state.users().set_suspended(&id, form.suspended).await?))
}
