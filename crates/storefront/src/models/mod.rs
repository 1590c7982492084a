//! Storefront models.
//!
//! Record types mirror the persisted field names of the document-store
//! collections so that records written by other clients stay readable.

pub mod medicine;
pub mod session;
pub mod user;

pub use medicine::{Medicine, MedicineRecord};
pub use session::{SessionUser, keys as session_keys};
pub use user::{User, UserProfile};

/// Collection names in the document store.
pub mod collections {
    pub const MEDICINES: &str = "medicines";
    pub const ORDERS: &str = "orders";
    pub const USERS: &str = "users";
}
