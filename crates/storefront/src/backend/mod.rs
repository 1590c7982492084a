//! Ports to the managed backend.
//!
//! The storefront owns no persistence of its own. Every read and write goes
//! through one of three collaborators:
//!
//! - [`DocumentStore`] - schemaless collections of JSON records
//! - [`IdentityProvider`] - email/password accounts
//! - [`BlobStore`] - file uploads with a public URL
//!
//! # Adapters
//!
//! - [`postgres`] - JSONB document table and identity table via `sqlx`
//! - [`memory`] - in-process maps for local development and tests
//! - [`blob`] - local-disk and in-memory blob stores

pub mod blob;
pub mod memory;
pub mod password;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

use devgon_core::{Email, UserId};

/// A record body: a JSON object keyed by field name.
pub type Record = Map<String, Value>;

// =============================================================================
// Document Store
// =============================================================================

/// Errors returned by a [`DocumentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or rejected the call.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// No record with that id.
    #[error("{collection}/{id} not found")]
    NotFound { collection: String, id: String },

    /// The record changed since it was read.
    #[error("{collection}/{id} was modified concurrently (expected version {expected})")]
    Conflict {
        collection: String,
        id: String,
        expected: u64,
    },

    /// A collection or field name that cannot be used in a query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A stored record does not have the expected shape.
    #[error("corrupt record {collection}/{id}: {reason}")]
    Corrupt {
        collection: String,
        id: String,
        reason: String,
    },

    /// A value could not be encoded as a JSON object.
    #[error("record encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub collection: String,
    pub id: String,
    /// Starts at 1 and increases by one on every write.
    pub version: u64,
    pub data: Record,
}

impl Document {
    /// Decode the record body into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Corrupt` if the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| StoreError::Corrupt {
            collection: self.collection.clone(),
            id: self.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Encode a value as a record body.
///
/// # Errors
///
/// Returns `StoreError::Encoding` if serialization fails, and
/// `StoreError::Corrupt` if the value is not a JSON object.
pub fn to_record<T: Serialize>(value: &T) -> Result<Record, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Corrupt {
            collection: String::new(),
            id: String::new(),
            reason: format!("expected a JSON object, got {other}"),
        }),
    }
}

/// Decode a query result, skipping records that do not decode.
///
/// Skipped records are logged with their id so they can be repaired.
pub(crate) fn decode_listing<T>(
    docs: &[Document],
    decode: impl Fn(&Document) -> Result<T, StoreError>,
) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| match decode(doc) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(
                    collection = %doc.collection,
                    id = %doc.id,
                    error = %e,
                    "Skipping undecodable record"
                );
                None
            }
        })
        .collect()
}

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A filtered, ordered query over one collection.
///
/// Filters are field equality only; they are ANDed together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<(String, Value)>,
    pub order_by: Option<(String, Direction)>,
}

impl Query {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep records whose `field` equals `value`.
    #[must_use]
    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_owned(), value.into()));
        self
    }

    #[must_use]
    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_owned(), direction));
        self
    }
}

/// A schemaless collection-of-records store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a record under a store-assigned id.
    async fn create(&self, collection: &str, record: Record) -> Result<Document, StoreError>;

    /// Insert or replace a record under a caller-chosen id.
    async fn put(&self, collection: &str, id: &str, record: Record)
    -> Result<Document, StoreError>;

    /// Point read.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Filtered, ordered read.
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Merge `fields` into an existing record and return the new version.
    ///
    /// With `expected_version`, the write only happens if the stored version
    /// still matches; otherwise `StoreError::Conflict` is returned.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError>;

    /// Remove a record.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Cheap connectivity check used by the readiness endpoint.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// =============================================================================
// Identity Provider
// =============================================================================

/// An authenticated principal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub email: Email,
}

/// Errors returned by an [`IdentityProvider`].
#[derive(Debug, Error)]
pub enum IdentityError {
    /// An account with that email already exists.
    #[error("email already registered")]
    EmailTaken,

    /// Unknown email or wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Email/password account management.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, email: &Email, password: &str) -> Result<Identity, IdentityError>;

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError>;

    /// End the provider-side session for `identity`.
    async fn sign_out(&self, identity: &Identity) -> Result<(), IdentityError>;

    /// Find an account by email without authenticating.
    async fn lookup(&self, email: &Email) -> Result<Option<Identity>, IdentityError>;
}

// =============================================================================
// Blob Store
// =============================================================================

/// Errors returned by a [`BlobStore`].
#[derive(Debug, Error)]
pub enum BlobError {
    /// The path is empty, absolute, or escapes the store root.
    #[error("invalid blob path: {0}")]
    InvalidPath(String),

    /// Writing the blob failed.
    #[error("blob write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Binary uploads with durable, publicly retrievable URLs.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` and return its public URL.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, BlobError>;
}
