//! Devgon Core - Shared domain types.
//!
//! This crate provides the types shared by every Devgon component:
//! - `storefront` - Customer pages and the admin back office
//! - `cli` - Migrations, catalog seeding and role management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP. The cart, the order snapshot and the shipment status
//! machine live here so they can be tested without any backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, roles and statuses
//! - [`cart`] - Session-local cart manager
//! - [`order`] - Order snapshot, line items and the admin order filter
//! - [`timestamp`] - Serde helpers for persisted timestamps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order;
pub mod timestamp;
pub mod types;

pub use cart::{Cart, CartError, CartItem, CartProduct};
pub use order::{DeliveryInfo, LineItem, NewOrder, Order, OrderBook, OrderOwner, OrderRecord};
pub use types::*;
