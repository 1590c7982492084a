//! Admin order handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use devgon_core::{Order, OrderId};

use crate::error::{AppError, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::routes::unavailable_notice;
use crate::services::orders::AdvanceOutcome;
use crate::state::AppState;

/// Filter query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    /// Matched against order id, customer name and email.
    #[serde(default)]
    pub q: String,
}

/// Filtered order list.
#[derive(Debug, Serialize)]
pub struct OrdersView {
    pub items: Vec<Order>,
    /// Orders fetched, before filtering.
    pub total: usize,
    /// Orders not yet delivered, before filtering.
    pub open: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Advance form data.
#[derive(Debug, Deserialize)]
pub struct AdvanceForm {
    /// The status the admin saw.
    pub current_status: String,
}

/// All orders, newest first, narrowed by `q`.
///
/// The fetched list is cached, so changing the filter does not re-query.
#[instrument(skip(state, _admin))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Json<OrdersView> {
    let view = match state.order_book().await {
        Ok(book) => OrdersView {
            items: book.filter(&filter.q).into_iter().cloned().collect(),
            total: book.len(),
            open: book.open_count(),
            notice: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load orders");
            OrdersView {
                items: Vec::new(),
                total: 0,
                open: 0,
                notice: Some(unavailable_notice("orders")),
            }
        }
    };
    Json(view)
}

/// Move an order one stage forward.
#[instrument(skip(state, admin, form), fields(admin_id = %admin.id))]
pub async fn advance(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(form): Json<AdvanceForm>,
) -> Result<Json<AdvanceOutcome>, AppError> {
    let outcome = state
        .orders()
        .advance_status(&id, &form.current_status)
        .await?;

    if let AdvanceOutcome::Advanced { to, .. } = &outcome {
        state.invalidate_orders().await;
        add_breadcrumb(
            "admin",
            "Order advanced",
            Some(&[("order_id", id.as_str()), ("status", to.as_str())]),
        );
    }
    Ok(Json(outcome))
}
