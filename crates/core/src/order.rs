//! Order snapshot types.
//!
//! An order is an immutable copy of the cart at submission time plus a
//! mutable shipment status. `total` is computed once, when the snapshot is
//! taken, and is never recomputed from the line items afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartItem};
use crate::timestamp;
use crate::types::{Email, MedicineId, OrderId, OrderStatus, Price, UserId};

/// A line of an order, copied from a cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: MedicineId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl LineItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        Self {
            id: item.item_id.clone(),
            name: item.name.clone(),
            price: item.unit_price,
            quantity: item.quantity,
            image_url: item.image_url.clone(),
        }
    }
}

/// Who placed the order, as stamped onto the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderOwner {
    pub user_id: UserId,
    pub display_name: String,
    pub contact: Email,
}

/// Delivery details supplied at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub alternate_contact: Option<String>,
}

impl DeliveryInfo {
    /// The trimmed address, or `None` when missing or blank.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        non_blank(self.address.as_deref())
    }

    /// The trimmed alternate contact, or `None` when missing or blank.
    #[must_use]
    pub fn alternate_contact(&self) -> Option<&str> {
        non_blank(self.alternate_contact.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// The persisted body of an order (everything except its id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    pub user_email: Email,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_contact: Option<String>,
    pub items: Vec<LineItem>,
    pub total: Price,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<Uuid>,
}

/// Persisted field names, for partial updates and queries.
pub mod fields {
    pub const USER_ID: &str = "userId";
    pub const CREATED_AT: &str = "createdAt";
    pub const STATUS: &str = "status";
    pub const DELIVERED_AT: &str = "deliveredAt";
    pub const IDEMPOTENCY_KEY: &str = "idempotencyKey";
}

/// Alias used at the submission boundary.
pub type NewOrder = OrderRecord;

impl OrderRecord {
    /// Take a snapshot of `cart` for `owner`.
    ///
    /// The status is the initial stage, `total` is the cart total right now,
    /// and the cart's checkout token becomes the idempotency key.
    #[must_use]
    pub fn snapshot(
        cart: &Cart,
        owner: OrderOwner,
        delivery: &DeliveryInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: owner.user_id,
            user_name: owner.display_name,
            user_email: owner.contact,
            delivery_address: delivery.address().map(str::to_owned),
            alternate_contact: delivery.alternate_contact().map(str::to_owned),
            items: cart.items().iter().map(LineItem::from).collect(),
            total: cart.total(),
            created_at: now,
            status: OrderStatus::INITIAL,
            delivered_at: None,
            idempotency_key: Some(cart.checkout_token()),
        }
    }
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Store revision, bumped by every write.
    pub version: u64,
    #[serde(flatten)]
    pub record: OrderRecord,
}

impl Order {
    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.record.status
    }

    /// Whether the order has not yet been delivered.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !self.record.status.is_terminal()
    }

    /// Case-insensitive substring match against id, owner name and contact.
    ///
    /// `needle` must already be lower-cased.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        self.id.as_str().to_lowercase().contains(needle)
            || self.record.user_name.to_lowercase().contains(needle)
            || self.record.user_email.as_str().to_lowercase().contains(needle)
    }
}

/// A fetched set of orders, newest first, that can be filtered without
/// going back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBook {
    orders: Vec<Order>,
}

impl OrderBook {
    #[must_use]
    pub const fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Orders matching `text`; blank text matches everything.
    #[must_use]
    pub fn filter(&self, text: &str) -> Vec<&Order> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self.orders.iter().collect();
        }
        self.orders.iter().filter(|o| o.matches(&needle)).collect()
    }

    /// Number of orders not yet delivered.
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.orders.iter().filter(|o| o.is_open()).count()
    }

    /// Orders placed by `user_id`, keeping newest-first order.
    #[must_use]
    pub fn for_user(&self, user_id: &UserId) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| &o.record.user_id == user_id)
            .collect()
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<Order> {
        self.orders
    }
}
