//! `PostgreSQL` backend adapters.
//!
//! # Tables
//!
//! - `storefront.document` - every collection, one JSONB row per record
//! - `storefront.identity` - accounts with Argon2id password hashes
//!
//! Queries are built at runtime with `sqlx::QueryBuilder`; equality filters
//! become JSONB containment (`data @> {"field": value}`). Ordering compares
//! the field's text byte-wise (`COLLATE "C"`) with missing values first, the
//! same order the in-memory store produces. Collection and field names are
//! written into the SQL as literals so the planner can match the partial
//! `createdAt` index; both must be plain identifiers.

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use devgon_core::{Email, UserId, generate_record_id};

use super::password::{HashCost, hash_password, verify_password};
use super::{
    Direction, Document, DocumentStore, Identity, IdentityError, IdentityProvider, Query, Record,
    StoreError,
};

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn version_from_db(collection: &str, id: &str, version: i64) -> Result<u64, StoreError> {
    u64::try_from(version).map_err(|_| StoreError::Corrupt {
        collection: collection.to_owned(),
        id: id.to_owned(),
        reason: format!("negative version {version}"),
    })
}

/// Accept `name` for use as a SQL literal.
fn identifier(name: &str) -> Result<&str, StoreError> {
    let plain = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Ok(name)
    } else {
        Err(StoreError::InvalidQuery(format!("{name:?} is not a plain identifier")))
    }
}

fn order_clause(order_by: Option<&(String, Direction)>) -> Result<String, StoreError> {
    let Some((field, direction)) = order_by else {
        return Ok(" ORDER BY created_at ASC".to_owned());
    };
    let field = identifier(field)?;
    let (dir, nulls) = match direction {
        Direction::Ascending => ("ASC", "FIRST"),
        Direction::Descending => ("DESC", "LAST"),
    };
    Ok(format!(
        " ORDER BY (data ->> '{field}') COLLATE \"C\" {dir} NULLS {nulls}, created_at {dir}"
    ))
}

// =============================================================================
// Document Store
// =============================================================================

/// A [`DocumentStore`] over a single JSONB table.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_document(collection: &str, row: &PgRow) -> Result<Document, StoreError> {
        let id: String = row.try_get("id").map_err(unavailable)?;
        let version: i64 = row.try_get("version").map_err(unavailable)?;
        let Json(data): Json<Value> = row.try_get("data").map_err(unavailable)?;

        let Value::Object(data) = data else {
            return Err(StoreError::Corrupt {
                collection: collection.to_owned(),
                id,
                reason: "record body is not a JSON object".to_owned(),
            });
        };

        Ok(Document {
            collection: collection.to_owned(),
            version: version_from_db(collection, &id, version)?,
            id,
            data,
        })
    }
}

#[async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[tracing::instrument(skip(self, record))]
    async fn create(&self, collection: &str, record: Record) -> Result<Document, StoreError> {
        let id = generate_record_id();
        let data = Value::Object(record);

        let row = sqlx::query(
            r"
            INSERT INTO storefront.document (collection, id, data)
            VALUES ($1, $2, $3)
            RETURNING id, version, data
            ",
        )
        .bind(collection)
        .bind(&id)
        .bind(Json(&data))
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Self::row_to_document(collection, &row)
    }

    #[tracing::instrument(skip(self, record))]
    async fn put(
        &self,
        collection: &str,
        id: &str,
        record: Record,
    ) -> Result<Document, StoreError> {
        let data = Value::Object(record);

        let row = sqlx::query(
            r"
            INSERT INTO storefront.document (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id) DO UPDATE
               SET data = EXCLUDED.data,
                   version = storefront.document.version + 1,
                   updated_at = now()
            RETURNING id, version, data
            ",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(&data))
        .fetch_one(&self.pool)
        .await
        .map_err(unavailable)?;

        Self::row_to_document(collection, &row)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, version, data
            FROM storefront.document
            WHERE collection = $1 AND id = $2
            ",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(|row| Self::row_to_document(collection, &row))
            .transpose()
    }

    #[tracing::instrument(skip(self))]
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT id, version, data FROM storefront.document WHERE collection = '{}'",
            identifier(collection)?
        ));

        for (field, value) in &query.filters {
            let mut containment = Map::new();
            containment.insert(field.clone(), value.clone());
            builder.push(" AND data @> ");
            builder.push_bind(Json(Value::Object(containment)));
        }
        builder.push(order_clause(query.order_by.as_ref())?);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter()
            .map(|row| Self::row_to_document(collection, row))
            .collect()
    }

    #[tracing::instrument(skip(self, fields))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Record,
        expected_version: Option<u64>,
    ) -> Result<u64, StoreError> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE storefront.document SET data = data || ");
        builder.push_bind(Json(Value::Object(fields)));
        builder.push(", version = version + 1, updated_at = now() WHERE collection = ");
        builder.push_bind(collection);
        builder.push(" AND id = ");
        builder.push_bind(id);

        if let Some(expected) = expected_version {
            let expected_db = i64::try_from(expected).map_err(|_| StoreError::Conflict {
                collection: collection.to_owned(),
                id: id.to_owned(),
                expected,
            })?;
            builder.push(" AND version = ");
            builder.push_bind(expected_db);
        }
        builder.push(" RETURNING version");

        let updated = builder
            .build()
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        if let Some(row) = updated {
            let version: i64 = row.try_get("version").map_err(unavailable)?;
            return version_from_db(collection, id, version);
        }

        // Nothing matched: either the record is gone or the guard failed.
        match (self.get(collection, id).await?, expected_version) {
            (Some(_), Some(expected)) => Err(StoreError::Conflict {
                collection: collection.to_owned(),
                id: id.to_owned(),
                expected,
            }),
            _ => Err(StoreError::NotFound {
                collection: collection.to_owned(),
                id: id.to_owned(),
            }),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM storefront.document WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(unavailable)?;
        Ok(())
    }
}

// =============================================================================
// Identity Provider
// =============================================================================

/// An [`IdentityProvider`] over the `storefront.identity` table.
#[derive(Debug, Clone)]
pub struct PostgresIdentityProvider {
    pool: PgPool,
}

impl PostgresIdentityProvider {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_unavailable(e: sqlx::Error) -> IdentityError {
    IdentityError::Unavailable(e.to_string())
}

#[async_trait]
impl IdentityProvider for PostgresIdentityProvider {
    #[tracing::instrument(skip(self, password))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let password_hash = hash_password(password, HashCost::Standard)?;
        let id = generate_record_id();

        sqlx::query(
            r"
            INSERT INTO storefront.identity (id, email, password_hash)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(&id)
        .bind(email.as_str())
        .bind(&password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return IdentityError::EmailTaken;
            }
            identity_unavailable(e)
        })?;

        Ok(Identity {
            user_id: UserId::new(id),
            email: email.clone(),
        })
    }

    #[tracing::instrument(skip(self, password))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Identity, IdentityError> {
        let row = sqlx::query("SELECT id, password_hash FROM storefront.identity WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(identity_unavailable)?
            .ok_or(IdentityError::InvalidCredentials)?;

        let id: String = row.try_get("id").map_err(identity_unavailable)?;
        let password_hash: String = row.try_get("password_hash").map_err(identity_unavailable)?;

        verify_password(password, &password_hash)?;

        Ok(Identity {
            user_id: UserId::new(id),
            email: email.clone(),
        })
    }

    async fn sign_out(&self, _identity: &Identity) -> Result<(), IdentityError> {
        // Sessions are server-side; dropping the session ends the login.
        Ok(())
    }

    async fn lookup(&self, email: &Email) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query("SELECT id FROM storefront.identity WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(identity_unavailable)?;

        row.map(|row| {
            let id: String = row.try_get("id").map_err(identity_unavailable)?;
            Ok(Identity {
                user_id: UserId::new(id),
                email: email.clone(),
            })
        })
        .transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_embeds_field() {
        assert_eq!(
            order_clause(Some(&("createdAt".to_owned(), Direction::Descending))).unwrap(),
            r#" ORDER BY (data ->> 'createdAt') COLLATE "C" DESC NULLS LAST, created_at DESC"#
        );
        assert_eq!(
            order_clause(Some(&("name".to_owned(), Direction::Ascending))).unwrap(),
            r#" ORDER BY (data ->> 'name') COLLATE "C" ASC NULLS FIRST, created_at ASC"#
        );
        assert_eq!(order_clause(None).unwrap(), " ORDER BY created_at ASC");
    }

    #[test]
    fn test_rejects_names_that_are_not_identifiers() {
        for bad in ["", "x'; DROP TABLE storefront.document; --", "user id", "naïve"] {
            assert!(
                matches!(identifier(bad), Err(StoreError::InvalidQuery(_))),
                "{bad}"
            );
            let order_by = (bad.to_owned(), Direction::Ascending);
            assert!(order_clause(Some(&order_by)).is_err(), "{bad}");
        }
        assert_eq!(identifier("user_id2").unwrap(), "user_id2");
    }
}
