//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login and the customer's own profile
//! - `catalog` - Medicine catalog with image uploads
//! - `orders` - Checkout, order history and shipment status
//! - `users` - Back-office user management
//! - `dashboard` - Back-office summary figures
//!
//! Services borrow their backends for the duration of one call; build them
//! from [`AppState`](crate::state::AppState) inside a handler.

pub mod auth;
pub mod catalog;
pub mod dashboard;
pub mod orders;
pub mod users;
