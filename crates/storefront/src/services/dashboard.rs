//! Back-office dashboard figures.

use serde::Serialize;

use crate::backend::{DocumentStore, Query, StoreError};
use crate::models::collections::{MEDICINES, USERS};
use crate::services::orders::{OrderError, OrderPipeline};

/// Counts shown on the admin landing page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub medicines: usize,
    pub orders: usize,
    /// Orders not yet delivered.
    pub open_orders: usize,
    pub users: usize,
}

/// Compute the dashboard figures.
///
/// # Errors
///
/// Returns `StoreError` if any query fails.
#[tracing::instrument(skip(store))]
pub async fn stats(store: &dyn DocumentStore) -> Result<DashboardStats, StoreError> {
    let medicines = store.query(MEDICINES, &Query::new()).await?.len();
    let users = store.query(USERS, &Query::new()).await?.len();
    let book = OrderPipeline::new(store, false)
        .list_all_orders()
        .await
        .map_err(|e| match e {
            OrderError::BackendUnavailable(inner) => inner,
            other => StoreError::Unavailable(other.to_string()),
        })?;

    Ok(DashboardStats {
        medicines,
        orders: book.len(),
        open_orders: book.open_count(),
        users,
    })
}
