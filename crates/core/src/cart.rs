//! Session-local cart manager.
//!
//! A [`Cart`] is owned by one browsing session. It is never written to the
//! document store: it lives in the HTTP session and is emptied either on an
//! explicit clear or after a successful order submission.
//!
//! The total is always derived from the current entries; nothing is cached.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::{MedicineId, Price};

/// Errors from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Quantities must be at least one.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// The resulting quantity does not fit.
    #[error("quantity too large")]
    QuantityOverflow,

    /// The item is not in the cart.
    #[error("item {0} is not in the cart")]
    NotInCart(MedicineId),
}

/// The catalog fields a cart entry is created from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartProduct {
    pub id: MedicineId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: Option<String>,
}

/// One cart entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Catalog item this entry refers to.
    #[serde(rename = "id")]
    pub item_id: MedicineId,
    /// Name at the time the item was added.
    pub name: String,
    /// Unit price at the time the item was added.
    #[serde(rename = "price")]
    pub unit_price: Price,
    /// Always at least 1.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartItem {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// A shopping cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
    checkout_token: Uuid,
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

impl Cart {
    /// Create an empty cart with a fresh checkout token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            checkout_token: Uuid::new_v4(),
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity is increased and the
    /// name/price captured when it was first added are kept.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` if `quantity` is 0 and
    /// `CartError::QuantityOverflow` if the new quantity does not fit in `u32`.
    pub fn add(&mut self, product: CartProduct, quantity: u32) -> Result<&CartItem, CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let id = product.id.clone();
        let pos = match self.position(&id) {
            Some(pos) => {
                let entry = self
                    .items
                    .get_mut(pos)
                    .ok_or_else(|| CartError::NotInCart(id.clone()))?;
                entry.quantity = entry
                    .quantity
                    .checked_add(quantity)
                    .ok_or(CartError::QuantityOverflow)?;
                pos
            }
            None => {
                self.items.push(CartItem {
                    item_id: product.id,
                    name: product.name,
                    unit_price: product.unit_price,
                    quantity,
                    image_url: product.image_url,
                });
                self.items.len() - 1
            }
        };

        self.renew_token();
        self.items.get(pos).ok_or(CartError::NotInCart(id))
    }

    /// Set the quantity of an existing entry.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` for 0 (use [`Cart::remove`]) and
    /// `CartError::NotInCart` if the item is absent.
    pub fn update_quantity(&mut self, item_id: &MedicineId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let entry = self
            .items
            .iter_mut()
            .find(|item| &item.item_id == item_id)
            .ok_or_else(|| CartError::NotInCart(item_id.clone()))?;
        if entry.quantity != quantity {
            entry.quantity = quantity;
            self.renew_token();
        }
        Ok(())
    }

    /// Remove an entry. Returns whether anything was removed.
    pub fn remove(&mut self, item_id: &MedicineId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.item_id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.renew_token();
        }
        removed
    }

    /// Empty the cart and issue a new checkout token.
    pub fn clear(&mut self) {
        self.items.clear();
        self.renew_token();
    }

    /// Σ(unit price × quantity) over the current entries.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Σ quantity.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Entries in the order they were first added.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Token identifying the cart's current contents.
    ///
    /// Every change to the contents issues a new token, so only a retry of
    /// exactly the submitted contents maps back to an already stored order.
    #[must_use]
    pub const fn checkout_token(&self) -> Uuid {
        self.checkout_token
    }

    fn renew_token(&mut self) {
        self.checkout_token = Uuid::new_v4();
    }

    fn position(&self, item_id: &MedicineId) -> Option<usize> {
        self.items.iter().position(|item| &item.item_id == item_id)
    }
}
