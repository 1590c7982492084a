//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (document store reachable)
//!
//! # Catalog
//! GET  /medicines              - Medicine listing
//!
//! # Cart (session-local)
//! GET  /cart                   - Current cart
//! POST /cart/add               - Add a medicine
//! POST /cart/update            - Set a quantity
//! POST /cart/remove            - Remove an entry
//! POST /cart/clear             - Empty the cart
//!
//! # Orders
//! POST /checkout               - Submit the cart as an order
//! GET  /orders                 - Own orders, newest first
//!
//! # Auth
//! POST /auth/register          - Create an account and sign in
//! POST /auth/login             - Sign in
//! POST /auth/logout            - Sign out
//! GET  /auth/me                - Current user, if any
//!
//! # Account (requires auth)
//! GET  /account                - Profile
//! POST /account                - Update profile
//!
//! # Admin (requires admin)
//! GET    /admin                          - Dashboard figures
//! GET    /admin/orders?q=                - All orders, filtered
//! POST   /admin/orders/{id}/advance      - Advance shipment status
//! GET    /admin/medicines                - Catalog
//! POST   /admin/medicines                - Add medicine (multipart)
//! POST   /admin/medicines/{id}           - Update medicine (multipart)
//! DELETE /admin/medicines/{id}           - Delete medicine
//! GET    /admin/users                    - Users with their orders
//! POST   /admin/users/{id}/suspend       - Suspend or reinstate
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;

use std::fmt::Display;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;

/// A list response. A failed read yields an empty list and a `notice`
/// instead of an error status.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> Listing<T> {
    #[must_use]
    pub const fn new(items: Vec<T>) -> Self {
        Self {
            items,
            notice: None,
        }
    }

    /// Wrap a read result, degrading failures to an empty list.
    pub fn from_read<E: Display>(what: &str, result: Result<Vec<T>, E>) -> Self {
        match result {
            Ok(items) => Self::new(items),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load {what}");
                Self {
                    items: Vec::new(),
                    notice: Some(unavailable_notice(what)),
                }
            }
        }
    }
}

/// The message shown when a read fails.
#[must_use]
pub fn unavailable_notice(what: &str) -> String {
    format!("Could not load {what} right now. Please try again.")
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/medicines", get(catalog::index))
        .nest("/cart", cart_routes())
        .route("/checkout", post(orders::checkout))
        .route("/orders", get(orders::index))
        .route("/account", get(account::show).post(account::update))
        .nest("/auth", auth_routes())
        .nest("/admin", admin::routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the document store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.documents().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
