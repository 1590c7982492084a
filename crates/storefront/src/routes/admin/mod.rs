//! Back-office route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so
//! anonymous requests get 401 and non-admins 403.

pub mod dashboard;
pub mod medicines;
pub mod orders;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

/// Largest accepted medicine form, image included.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/advance", post(orders::advance))
        .route(
            "/medicines",
            get(medicines::index)
                .post(medicines::create)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/medicines/{id}",
            post(medicines::update)
                .delete(medicines::delete)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/users", get(users::index))
        .route("/users/{id}/suspend", post(users::suspend))
}
