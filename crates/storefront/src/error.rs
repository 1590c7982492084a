//! HTTP error responses.
//!
//! Every handler failure becomes an [`AppError`], rendered as
//! `{"error": "<message>"}` with a status chosen per condition. An unreachable
//! backend surfaces as 503 with a generic retry message, bad stored data as
//! 500; 5xx errors are sent to Sentry.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use devgon_core::CartError;

use crate::backend::{BlobError, StoreError};
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::orders::OrderError;
use crate::services::users::UserAdminError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication or profile operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Checkout, order listing or status change failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Catalog operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// User administration failed.
    #[error("User admin error: {0}")]
    Users(#[from] UserAdminError),

    /// Cart mutation rejected.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Document store call failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Session could not be read or written.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const UNAVAILABLE: &str = "Service temporarily unavailable, please try again";
const INTERNAL: &str = "Internal server error";

impl AppError {
    /// Status code and client-facing message.
    fn classify(&self) -> (StatusCode, String) {
        match self {
            Self::Auth(err) => classify_auth(err),
            Self::Order(err) => classify_order(err),
            Self::Catalog(err) => match err {
                CatalogError::MissingName | CatalogError::InvalidPrice => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                CatalogError::Upload(BlobError::InvalidPath(_)) => {
                    (StatusCode::BAD_REQUEST, "Invalid image file name".to_string())
                }
                CatalogError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                CatalogError::Upload(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Image upload failed".to_string(),
                ),
                CatalogError::Backend(store) => classify_store(store),
            },
            Self::Users(err) => match err {
                UserAdminError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                UserAdminError::Backend(store) => classify_store(store),
            },
            Self::Cart(err) => match err {
                CartError::NotInCart(_) => (StatusCode::NOT_FOUND, err.to_string()),
                CartError::ZeroQuantity | CartError::QuantityOverflow => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
            },
            Self::Store(store) => classify_store(store),
            Self::Session(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into())
            }
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

fn classify_auth(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidEmail(_) => (StatusCode::BAD_REQUEST, "Invalid email address".into()),
        AuthError::PasswordMismatch
        | AuthError::InvalidPhone
        | AuthError::MissingField(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials".into()),
        AuthError::UserAlreadyExists => (
            StatusCode::CONFLICT,
            "An account with this email already exists".into(),
        ),
        AuthError::ProfileMissing => (StatusCode::NOT_FOUND, "User data not found".into()),
        AuthError::Suspended => (
            StatusCode::FORBIDDEN,
            "This account has been suspended".into(),
        ),
        AuthError::Repository(store) => classify_store(store),
        AuthError::Identity(_) => (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.into()),
    }
}

/// A record that exists but cannot be read back is a server fault, not an
/// outage, and retrying will not help.
fn classify_store(err: &StoreError) -> (StatusCode, String) {
    match err {
        StoreError::Corrupt { .. } | StoreError::Encoding(_) | StoreError::InvalidQuery(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.into())
        }
        _ => (StatusCode::SERVICE_UNAVAILABLE, UNAVAILABLE.into()),
    }
}

fn classify_order(err: &OrderError) -> (StatusCode, String) {
    let status = match err {
        OrderError::Unauthenticated => StatusCode::UNAUTHORIZED,
        OrderError::Suspended => StatusCode::FORBIDDEN,
        OrderError::EmptyCart | OrderError::MissingAddress => StatusCode::BAD_REQUEST,
        OrderError::NotFound(_) => StatusCode::NOT_FOUND,
        OrderError::Conflict { .. } => StatusCode::CONFLICT,
        OrderError::BackendUnavailable(store) => return classify_store(store),
    };
    (status, err.to_string())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.classify();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Attach the signed-in customer to subsequent Sentry events.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}

/// Record a storefront action (cart change, checkout, status advance) as a
/// Sentry breadcrumb with optional string data.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let data = data
        .unwrap_or_default()
        .iter()
        .map(|(key, value)| ((*key).to_owned(), serde_json::Value::from(*value)))
        .collect();

    sentry::add_breadcrumb(sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        data,
        ..Default::default()
    });
}
