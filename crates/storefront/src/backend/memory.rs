//! In-process backend adapters.
//!
//! Used by `STOREFRONT_BACKEND=memory` for local development and by the test
//! suites. Both adapters keep everything in `tokio::sync::RwLock` maps and
//! lose it on restart.
//!
//! [`MemoryDocumentStore`] also counts every call it receives and can be
//! switched into an unavailable state, so tests can assert which operations
//! reached the store and how failures propagate.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use devgon_core::{Email, UserId, generate_record_id};

use super::password::{HashCost, hash_password, verify_password};
use super::{
    Direction, Document, DocumentStore, Identity, IdentityError, IdentityProvider, Query, Record,
    StoreError,
};

// =============================================================================
// Document Store
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    version: u64,
    /// Insertion sequence, used as the ordering tie-break.
    seq: u64,
    data: Record,
}

/// Number of calls a [`MemoryDocumentStore`] has received, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub creates: u64,
    pub puts: u64,
    pub gets: u64,
    pub queries: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl StoreCalls {
    /// Calls that modify data.
    #[must_use]
    pub const fn writes(&self) -> u64 {
        self.creates + self.puts + self.updates + self.deletes
    }

    /// Calls that only read data.
    #[must_use]
    pub const fn reads(&self) -> u64 {
        self.gets + self.queries
    }

    #[must_use]
    pub const fn total(&self) -> u64 {
        self.writes() + self.reads()
    }
}

#[derive(Debug, Default)]
struct CallCounters {
    creates: AtomicU64,
    puts: AtomicU64,
    gets: AtomicU64,
    queries: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

impl CallCounters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, AtomicOrdering::Relaxed);
    }

    fn snapshot(&self) -> StoreCalls {
        StoreCalls {
            creates: self.creates.load(AtomicOrdering::Relaxed),
            puts: self.puts.load(AtomicOrdering::Relaxed),
            gets: self.gets.load(AtomicOrdering::Relaxed),
            queries: self.queries.load(AtomicOrdering::Relaxed),
            updates: self.updates.load(AtomicOrdering::Relaxed),
            deletes: self.deletes.load(AtomicOrdering::Relaxed),
        }
    }
}

/// A [`DocumentStore`] backed by in-process maps.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, HashMap<String, Entry>>>,
    next_seq: AtomicU64,
    calls: CallCounters,
    unavailable: AtomicBool,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, including ones rejected while unavailable.
    #[must_use]
    pub fn calls(&self) -> StoreCalls {
        self.calls.snapshot()
    }

    /// Make every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, AtomicOrdering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Unavailable(
                "in-memory store switched off".to_owned(),
            ));
        }
        Ok(())
    }

    fn seq(&self) -> u64 {
        self.next_seq.fetch_add(1, AtomicOrdering::Relaxed)
    }

    fn document(collection: &str, id: &str, entry: &Entry) -> Document {
        Document {
            collection: collection.to_owned(),
            id: id.to_owned(),
            version: entry.version,
            data: entry.data.clone(),
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, record: Record) -> Result<Document, StoreError> {
        CallCounters::bump(&self.calls.creates);
        self.check_available()?;

        let id = generate_record_id();
        let entry = Entry {
            version: 1,
            seq: self.seq(),
            data: record,
        };
        let doc = Self::document(collection, &id, &entry);

        self.collections
            .write()
            .await
            .entry(collection.to_owned())
            .or_default()
            .insert(id, entry);
        Ok(doc)
    }

    async fn put(
        &self,
        collection: &str,
        id: &str,
        record: Record,
    ) -> Result<Document, StoreError> {
        CallCounters::bump(&self.calls.puts);
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_owned()).or_default();
        let entry = match docs.get(id) {
            Some(existing) => Entry {
                version: existing.version + 1,
                seq: existing.seq,
                data: record,
            },
            None => Entry {
                version: 1,
                seq: self.seq(),
                data: record,
            },
        };
        let doc = Self::document(collection, id, &entry);
        docs.insert(id.to_owned(), entry);
        Ok(doc)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        CallCounters::bump(&self.calls.gets);
        self.check_available()?;

        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|entry| Self::document(collection, id, entry)))
    }

    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        CallCounters::bump(&self.calls.queries);
        self.check_available()?;

        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(&String, &Entry)> = docs
            .iter()
            .filter(|(_, entry)| {
                query
                    .filters
                    .iter()
                    .all(|(field, value)| entry.data.get(field) == Some(value))
            })
            .collect();

        match &query.order_by {
            Some((field, direction)) => matched.sort_by(|(_, a), (_, b)| {
                let ord = compare_fields(a.data.get(field), b.data.get(field))
                    .then(a.seq.cmp(&b.seq));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            }),
            None => matched.sort_by_key(|(_, entry)| entry.seq),
        }

        Ok(matched
            .into_iter()
            .map(|(id, entry)| Self::document(collection, id, entry))
            .collect())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        CallCounters::bump(&self.calls.updates);
        self.check_available()?;

        let mut collections = self.collections.write().await;
        let entry = collections
            .get_mut(collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            })?;

        if let Some(expected) = expected_version
            && entry.version != expected
        {
            return Err(StoreError::Conflict {
                collection: collection.to_owned(),
                id: id.to_owned(),
                expected,
            });
        }

        entry.data.extend(fields);
        entry.version += 1;
        Ok(entry.version)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        CallCounters::bump(&self.calls.deletes);
        self.check_available()?;

        if let Some(docs) = self.collections.write().await.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

/// Order two optional JSON field values. Missing and null sort first.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

// =============================================================================
// Identity Provider
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    id: UserId,
    email: Email,
    password_hash: String,
}

/// An [`IdentityProvider`] keeping accounts in memory.
///
/// Passwords are hashed with a light Argon2 cost.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_up(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let password_hash = hash_password(password, HashCost::Light)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email.as_str()) {
            return Err(IdentityError::EmailTaken);
        }

        let account = Account {
            id: UserId::new(generate_record_id()),
            email: email.clone(),
            password_hash,
        };
        let identity = Identity {
            user_id: account.id.clone(),
            email: account.email.clone(),
        };
        accounts.insert(email.as_str().to_owned(), account);
        Ok(identity)
    }

    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let account = self
            .accounts
            .read()
            .await
            .get(email.as_str())
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;

        Ok(Identity {
            user_id: account.id,
            email: account.email,
        })
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), IdentityError> {
        Ok(())
    }

    async fn lookup(&self, email: &Email) -> Result<Option<Identity>, IdentityError> {
        Ok(self
            .accounts
            .read()
            .await
            .get(email.as_str())
            .map(|account| Identity {
                user_id: account.id.clone(),
                email: account.email.clone(),
            }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_create_get_update() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .create("orders", record(json!({"status": "placed", "total": 250})))
            .await
            .unwrap();
        assert_eq!(doc.version, 1);
        assert_eq!(doc.id.len(), 32);

        let version = store
            .update(
                "orders",
                &doc.id,
                record(json!({"status": "processing"})),
                Some(1),
            )
            .await
            .unwrap();
        assert_eq!(version, 2);

        let fetched = store.get("orders", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.data["status"], "processing");
        assert_eq!(fetched.data["total"], 250);
    }

    #[tokio::test]
    async fn test_update_version_guard() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .create("orders", record(json!({"status": "placed"})))
            .await
            .unwrap();
        store
            .update("orders", &doc.id, record(json!({"status": "processing"})), None)
            .await
            .unwrap();

        let err = store
            .update("orders", &doc.id, record(json!({"status": "shipped"})), Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: 1, .. }));

        let current = store.get("orders", &doc.id).await.unwrap().unwrap();
        assert_eq!(current.data["status"], "processing");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryDocumentStore::new();
        let err = store
            .update("orders", "nope", Record::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let store = MemoryDocumentStore::new();
        for (user, created) in [
            ("u1", "2026-01-01T00:00:00.000Z"),
            ("u2", "2026-01-02T00:00:00.000Z"),
            ("u1", "2026-01-03T00:00:00.000Z"),
        ] {
            store
                .create("orders", record(json!({"userId": user, "createdAt": created})))
                .await
                .unwrap();
        }

        let docs = store
            .query(
                "orders",
                &Query::new()
                    .filter_eq("userId", "u1")
                    .order_by("createdAt", Direction::Descending),
            )
            .await
            .unwrap();
        let created: Vec<&str> = docs
            .iter()
            .map(|d| d.data["createdAt"].as_str().unwrap())
            .collect();
        assert_eq!(
            created,
            vec!["2026-01-03T00:00:00.000Z", "2026-01-01T00:00:00.000Z"]
        );

        assert!(
            store
                .query("missing", &Query::new())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_query_orders_numbers_numerically() {
        let store = MemoryDocumentStore::new();
        for price in [120, 9, 45] {
            store
                .create("medicines", record(json!({"price": price})))
                .await
                .unwrap();
        }
        let docs = store
            .query("medicines", &Query::new().order_by("price", Direction::Ascending))
            .await
            .unwrap();
        let prices: Vec<i64> = docs
            .iter()
            .map(|d| d.data["price"].as_i64().unwrap())
            .collect();
        assert_eq!(prices, vec![9, 45, 120]);
    }

    #[tokio::test]
    async fn test_put_replaces_and_bumps_version() {
        let store = MemoryDocumentStore::new();
        store
            .put("users", "u1", record(json!({"name": "Asha", "role": "user"})))
            .await
            .unwrap();
        let doc = store
            .put("users", "u1", record(json!({"name": "Asha V"})))
            .await
            .unwrap();
        assert_eq!(doc.version, 2);
        assert!(doc.data.get("role").is_none());
    }

    #[tokio::test]
    async fn test_unavailable_switch_and_counters() {
        let store = MemoryDocumentStore::new();
        store.set_unavailable(true);

        let err = store.create("orders", Record::new()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.ping().await.is_err());

        store.set_unavailable(false);
        store.query("orders", &Query::new()).await.unwrap();

        let calls = store.calls();
        assert_eq!(calls.creates, 1);
        assert_eq!(calls.queries, 1);
        assert_eq!(calls.total(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        let doc = store.create("medicines", Record::new()).await.unwrap();
        store.delete("medicines", &doc.id).await.unwrap();
        store.delete("medicines", &doc.id).await.unwrap();
        assert!(store.get("medicines", &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_identity_sign_up_and_in() {
        let provider = MemoryIdentityProvider::new();
        let email = Email::parse("asha@devgon.in").unwrap();

        let created = provider.sign_up(&email, "triphala-99").await.unwrap();
        assert!(matches!(
            provider.sign_up(&email, "other-pass").await,
            Err(IdentityError::EmailTaken)
        ));

        let signed_in = provider.sign_in(&email, "triphala-99").await.unwrap();
        assert_eq!(signed_in, created);
        assert!(matches!(
            provider.sign_in(&email, "wrong").await,
            Err(IdentityError::InvalidCredentials)
        ));

        let stranger = Email::parse("nobody@devgon.in").unwrap();
        assert!(matches!(
            provider.sign_in(&stranger, "x").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert_eq!(provider.lookup(&email).await.unwrap(), Some(created));
        assert_eq!(provider.lookup(&stranger).await.unwrap(), None);
    }
}
