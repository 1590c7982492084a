//! Back-office user management.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::instrument;

use devgon_core::{Email, Order, UserId, UserRole};

use crate::backend::{
    Direction, Document, DocumentStore, Query, Record, StoreError, decode_listing,
};
use crate::models::collections::USERS;
use crate::models::user::fields;
use crate::models::{User, UserProfile};
use crate::services::orders::OrderPipeline;

/// Errors from user administration.
#[derive(Debug, Error)]
pub enum UserAdminError {
    #[error("user {0} not found")]
    NotFound(UserId),

    #[error("user store unavailable: {0}")]
    Backend(#[from] StoreError),
}

impl From<super::orders::OrderError> for UserAdminError {
    fn from(err: super::orders::OrderError) -> Self {
        match err {
            super::orders::OrderError::BackendUnavailable(e) => Self::Backend(e),
            other => Self::Backend(StoreError::Unavailable(other.to_string())),
        }
    }
}

/// A user with the orders they placed, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithOrders {
    #[serde(flatten)]
    pub user: User,
    pub orders: Vec<Order>,
}

fn user_from_document(doc: &Document) -> Result<User, StoreError> {
    let profile: UserProfile = doc.decode()?;
    Ok(User {
        id: UserId::new(doc.id.clone()),
        profile,
    })
}

/// User administration over the `users` collection.
pub struct UserAdmin<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserAdmin<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// All profiles ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `UserAdminError::Backend` if the query fails.
    pub async fn list_users(&self) -> Result<Vec<User>, UserAdminError> {
        let query = Query::new().order_by(fields::NAME, Direction::Ascending);
        let docs = self.store.query(USERS, &query).await?;
        Ok(decode_listing(&docs, user_from_document))
    }

    /// Every profile together with its orders.
    ///
    /// # Errors
    ///
    /// Returns `UserAdminError::Backend` if either query fails.
    #[instrument(skip(self))]
    pub async fn list_users_with_orders(&self) -> Result<Vec<UserWithOrders>, UserAdminError> {
        let users = self.list_users().await?;
        let book = OrderPipeline::new(self.store, false).list_all_orders().await?;

        Ok(users
            .into_iter()
            .map(|user| {
                let orders = book.for_user(&user.id).into_iter().cloned().collect();
                UserWithOrders { user, orders }
            })
            .collect())
    }

    /// Find a profile by email.
    ///
    /// # Errors
    ///
    /// Returns `UserAdminError::Backend` if the query fails.
    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, UserAdminError> {
        let query = Query::new().filter_eq("email", email.as_str());
        let docs = self.store.query(USERS, &query).await?;
        Ok(docs.first().map(user_from_document).transpose()?)
    }

    /// Suspend or reinstate a user.
    ///
    /// # Errors
    ///
    /// Returns `UserAdminError::NotFound` if there is no such profile.
    #[instrument(skip(self))]
    pub async fn set_suspended(
        &self,
        user_id: &UserId,
        suspended: bool,
    ) -> Result<User, UserAdminError> {
        self.write(user_id, fields::SUSPENDED, Value::Bool(suspended))
            .await?;
        tracing::info!(suspended, "User suspension changed");
        self.get(user_id).await
    }

    /// Change a user's role.
    ///
    /// # Errors
    ///
    /// Returns `UserAdminError::NotFound` if there is no such profile.
    #[instrument(skip(self))]
    pub async fn set_role(&self, user_id: &UserId, role: UserRole) -> Result<User, UserAdminError> {
        self.write(user_id, fields::ROLE, Value::from(role.to_string()))
            .await?;
        tracing::info!(%role, "User role changed");
        self.get(user_id).await
    }

    async fn get(&self, user_id: &UserId) -> Result<User, UserAdminError> {
        let doc = self
            .store
            .get(USERS, user_id.as_str())
            .await?
            .ok_or_else(|| UserAdminError::NotFound(user_id.clone()))?;
        Ok(user_from_document(&doc)?)
    }

    async fn write(&self, user_id: &UserId, field: &str, value: Value) -> Result<(), UserAdminError> {
        let mut changes = Record::new();
        changes.insert(field.to_owned(), value);
        self.store
            .update(USERS, user_id.as_str(), changes, None)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => UserAdminError::NotFound(user_id.clone()),
                other => UserAdminError::Backend(other),
            })?;
        Ok(())
    }
}
