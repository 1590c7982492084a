//! Checkout and order history handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Serialize;
use tower_sessions::Session;
use tracing::instrument;

use devgon_core::{DeliveryInfo, Order, TimelineStep};

use super::Listing;
use super::cart::{load_cart, save_cart};
use crate::error::{AppError, add_breadcrumb};
use crate::middleware::{OptionalAuth, RequireAuth};
use crate::state::AppState;

/// An order with its shipment timeline.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub timeline: Vec<TimelineStep>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let timeline = order.status().timeline();
        Self { order, timeline }
    }
}

/// Submit the session cart as an order.
///
/// The cart is only written back (emptied) once the order is stored; on any
/// failure the session still holds the same cart.
#[instrument(skip(state, session, user, delivery))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(delivery): Json<DeliveryInfo>,
) -> Result<(StatusCode, Json<OrderView>), AppError> {
    let mut cart = load_cart(&session).await?;

    let order = state
        .orders()
        .submit_order(&mut cart, user.as_ref(), &delivery)
        .await?;

    save_cart(&session, &cart).await?;
    state.invalidate_orders().await;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", order.id.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(OrderView::from(order))))
}

/// The signed-in user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Json<Listing<OrderView>> {
    let result = state
        .orders()
        .list_orders(&user.id)
        .await
        .map(|orders| orders.into_iter().map(OrderView::from).collect());
    Json(Listing::from_read("your orders", result))
}
