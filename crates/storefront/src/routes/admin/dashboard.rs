//! Admin dashboard.

use axum::{Json, extract::State};
use serde::Serialize;
use tracing::instrument;

use crate::middleware::RequireAdmin;
use crate::routes::unavailable_notice;
use crate::services::dashboard::{self, DashboardStats};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub stats: DashboardStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Summary counts. A failed read shows zeros and a notice.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Json<DashboardView> {
    let view = match dashboard::stats(state.documents()).await {
        Ok(stats) => DashboardView {
            stats,
            notice: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load dashboard");
            DashboardView {
                stats: DashboardStats::default(),
                notice: Some(unavailable_notice("dashboard figures")),
            }
        }
    };
    Json(view)
}
