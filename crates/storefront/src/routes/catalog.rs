//! Public catalog handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use super::Listing;
use crate::models::Medicine;
use crate::state::AppState;

/// All medicines, by name.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Listing<Medicine>> {
    Json(Listing::from_read("medicines", state.catalog().list().await))
}
