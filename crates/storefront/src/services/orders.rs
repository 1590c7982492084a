//! Order pipeline.
//!
//! Turns a session cart into a persisted order, lists orders for their owner
//! and for the back office, and advances shipment status one stage at a time.
//!
//! Nothing here retries. Every failure leaves the cart and the stored orders
//! as they were so the user can try again.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use devgon_core::order::fields;
use devgon_core::{
    Cart, DeliveryInfo, Order, OrderBook, OrderId, OrderOwner, OrderRecord, OrderStatus, UserId,
    timestamp,
};

use crate::backend::{
    Direction, Document, DocumentStore, Query, Record, StoreError, decode_listing, to_record,
};
use crate::models::collections::{ORDERS, USERS};
use crate::models::{SessionUser, UserProfile};

/// Errors from the order pipeline.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No signed-in user; the caller should prompt for login.
    #[error("please sign in to place an order")]
    Unauthenticated,

    /// The account has been suspended by an administrator.
    #[error("this account is suspended")]
    Suspended,

    #[error("your cart is empty")]
    EmptyCart,

    #[error("a delivery address is required")]
    MissingAddress,

    #[error("order {0} not found")]
    NotFound(OrderId),

    /// The order's status is no longer the one the caller saw.
    #[error("order {order_id} is no longer {expected}")]
    Conflict {
        order_id: OrderId,
        expected: OrderStatus,
        /// The stored status, when known.
        actual: Option<OrderStatus>,
    },

    #[error("order service unavailable: {0}")]
    BackendUnavailable(#[from] StoreError),
}

/// Result of [`OrderPipeline::advance_status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdvanceOutcome {
    /// The order moved one stage forward.
    Advanced {
        from: OrderStatus,
        to: OrderStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        delivered_at: Option<DateTime<Utc>>,
    },
    /// Nothing to do: the status was unrecognised or already terminal.
    Unchanged,
}

/// Decode a stored order document.
pub(crate) fn order_from_document(doc: &Document) -> Result<Order, StoreError> {
    Ok(Order {
        id: OrderId::new(doc.id.clone()),
        version: doc.version,
        record: doc.decode()?,
    })
}

/// The order pipeline over a document store.
pub struct OrderPipeline<'a> {
    store: &'a dyn DocumentStore,
    require_address: bool,
}

impl<'a> OrderPipeline<'a> {
    /// Create a pipeline. With `require_address`, checkout needs a non-blank
    /// delivery address.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, require_address: bool) -> Self {
        Self {
            store,
            require_address,
        }
    }

    /// Submit `cart` as an order for `identity`.
    ///
    /// The cart is cleared only when the order is stored. A resubmission of
    /// the same cart (same checkout token) returns the order already stored
    /// for it instead of creating a second one.
    ///
    /// # Errors
    ///
    /// - `OrderError::Unauthenticated` if `identity` is `None`
    /// - `OrderError::EmptyCart` if the cart has no entries
    /// - `OrderError::MissingAddress` if an address is required and blank
    /// - `OrderError::Suspended` if the profile is suspended
    /// - `OrderError::BackendUnavailable` if the store call fails
    #[instrument(skip(self, cart, identity, delivery), fields(user_id = tracing::field::Empty))]
    pub async fn submit_order(
        &self,
        cart: &mut Cart,
        identity: Option<&SessionUser>,
        delivery: &DeliveryInfo,
    ) -> Result<Order, OrderError> {
        let user = identity.ok_or(OrderError::Unauthenticated)?;
        tracing::Span::current().record("user_id", user.id.as_str());

        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        if self.require_address && delivery.address().is_none() {
            return Err(OrderError::MissingAddress);
        }

        let display_name = match self.store.get(USERS, user.id.as_str()).await? {
            Some(doc) => {
                let profile: UserProfile = doc.decode()?;
                if profile.suspended {
                    return Err(OrderError::Suspended);
                }
                profile.name
            }
            None => user.name.clone(),
        };

        if let Some(existing) = self.find_submitted(&user.id, cart).await? {
            tracing::info!(order_id = %existing.id, "Checkout already recorded, returning it");
            cart.clear();
            return Ok(existing);
        }

        let record = OrderRecord::snapshot(
            cart,
            OrderOwner {
                user_id: user.id.clone(),
                display_name,
                contact: user.email.clone(),
            },
            delivery,
            Utc::now(),
        );
        let doc = self.store.create(ORDERS, to_record(&record)?).await?;
        let order = order_from_document(&doc)?;

        cart.clear();
        tracing::info!(order_id = %order.id, total = %order.record.total, "Order placed");
        Ok(order)
    }

    async fn find_submitted(&self, owner: &UserId, cart: &Cart) -> Result<Option<Order>, StoreError> {
        let query = Query::new()
            .filter_eq(fields::USER_ID, owner.as_str())
            .filter_eq(fields::IDEMPOTENCY_KEY, cart.checkout_token().to_string());

        self.store
            .query(ORDERS, &query)
            .await?
            .first()
            .map(order_from_document)
            .transpose()
    }

    /// Orders placed by `owner`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::BackendUnavailable` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self, owner: &UserId) -> Result<Vec<Order>, OrderError> {
        let query = Query::new()
            .filter_eq(fields::USER_ID, owner.as_str())
            .order_by(fields::CREATED_AT, Direction::Descending);

        let docs = self.store.query(ORDERS, &query).await?;
        let orders = decode_listing(&docs, order_from_document);
        Ok(orders)
    }

    /// Every order, newest first, as a filterable snapshot.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::BackendUnavailable` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_all_orders(&self) -> Result<OrderBook, OrderError> {
        let query = Query::new().order_by(fields::CREATED_AT, Direction::Descending);

        let docs = self.store.query(ORDERS, &query).await?;
        let orders = decode_listing(&docs, order_from_document);
        Ok(OrderBook::new(orders))
    }

    /// Move an order from `current_status` to the next stage.
    ///
    /// An unrecognised or terminal `current_status` is a no-op that never
    /// contacts the store. Only `status` (and `deliveredAt` on reaching the
    /// terminal stage) are written.
    ///
    /// # Errors
    ///
    /// - `OrderError::NotFound` if the order does not exist
    /// - `OrderError::Conflict` if the stored status is not `current_status`,
    ///   or another write landed between the read and the update
    /// - `OrderError::BackendUnavailable` if a store call fails
    #[instrument(skip(self))]
    pub async fn advance_status(
        &self,
        order_id: &OrderId,
        current_status: &str,
    ) -> Result<AdvanceOutcome, OrderError> {
        let Ok(current) = current_status.parse::<OrderStatus>() else {
            tracing::debug!("Unrecognised status, nothing to advance");
            return Ok(AdvanceOutcome::Unchanged);
        };
        let Some(next) = current.next() else {
            return Ok(AdvanceOutcome::Unchanged);
        };

        let doc = self
            .store
            .get(ORDERS, order_id.as_str())
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.clone()))?;
        let order = order_from_document(&doc)?;

        if order.status() != current {
            return Err(OrderError::Conflict {
                order_id: order_id.clone(),
                expected: current,
                actual: Some(order.status()),
            });
        }

        let mut update = Record::new();
        update.insert(fields::STATUS.to_owned(), Value::from(next.as_str()));
        let delivered_at = next.is_terminal().then(Utc::now);
        if let Some(at) = &delivered_at {
            update.insert(
                fields::DELIVERED_AT.to_owned(),
                Value::from(timestamp::format(at)),
            );
        }

        self.store
            .update(ORDERS, order_id.as_str(), update, Some(doc.version))
            .await
            .map_err(|e| match e {
                StoreError::Conflict { .. } => OrderError::Conflict {
                    order_id: order_id.clone(),
                    expected: current,
                    actual: None,
                },
                StoreError::NotFound { .. } => OrderError::NotFound(order_id.clone()),
                other => OrderError::BackendUnavailable(other),
            })?;

        tracing::info!(from = %current, to = %next, "Order status advanced");
        Ok(AdvanceOutcome::Advanced {
            from: current,
            to: next,
            delivered_at,
        })
    }
}
