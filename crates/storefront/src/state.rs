//! Application state shared across handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use moka::future::Cache;
use sqlx::PgPool;

use devgon_core::OrderBook;

use crate::backend::blob::{LocalBlobStore, MemoryBlobStore};
use crate::backend::memory::{MemoryDocumentStore, MemoryIdentityProvider};
use crate::backend::postgres::{PostgresDocumentStore, PostgresIdentityProvider};
use crate::backend::{BlobStore, DocumentStore, IdentityProvider};
use crate::config::StorefrontConfig;
use crate::services::auth::AuthService;
use crate::services::catalog::CatalogService;
use crate::services::orders::{OrderError, OrderPipeline};
use crate::services::users::UserAdmin;

/// The three backend collaborators.
#[derive(Clone)]
pub struct Backends {
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// `PostgreSQL` documents and identities, uploads on local disk.
    #[must_use]
    pub fn postgres(pool: &PgPool, config: &StorefrontConfig) -> Self {
        Self {
            documents: Arc::new(PostgresDocumentStore::new(pool.clone())),
            identity: Arc::new(PostgresIdentityProvider::new(pool.clone())),
            blobs: Arc::new(LocalBlobStore::new(&config.upload_dir, &config.base_url)),
        }
    }

    /// In-memory documents and identities, uploads on local disk.
    #[must_use]
    pub fn memory(config: &StorefrontConfig) -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            identity: Arc::new(MemoryIdentityProvider::new()),
            blobs: Arc::new(LocalBlobStore::new(&config.upload_dir, &config.base_url)),
        }
    }

    /// Fully in-memory, including uploads.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self {
            documents: Arc::new(MemoryDocumentStore::new()),
            identity: Arc::new(MemoryIdentityProvider::new()),
            blobs: Arc::new(MemoryBlobStore::new()),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the backends, configuration and the admin order cache.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backends: Backends,
    order_book: Cache<(), Arc<OrderBook>>,
    /// Bumped by every invalidation; a fetch only caches its result if no
    /// invalidation happened while it ran.
    orders_generation: AtomicU64,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, backends: Backends) -> Self {
        let order_book = Cache::builder()
            .max_capacity(1)
            .time_to_live(config.order_cache_ttl)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                order_book,
                orders_generation: AtomicU64::new(0),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn documents(&self) -> &dyn DocumentStore {
        self.inner.backends.documents.as_ref()
    }

    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.backends.identity.as_ref()
    }

    #[must_use]
    pub fn blobs(&self) -> &dyn BlobStore {
        self.inner.backends.blobs.as_ref()
    }

    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.identity(), self.documents())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogService<'_> {
        CatalogService::new(self.documents(), self.blobs())
    }

    #[must_use]
    pub fn orders(&self) -> OrderPipeline<'_> {
        OrderPipeline::new(self.documents(), self.config().require_delivery_address)
    }

    #[must_use]
    pub fn users(&self) -> UserAdmin<'_> {
        UserAdmin::new(self.documents())
    }

    /// The admin order list, served from cache while it is fresh.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::BackendUnavailable` if the list has to be fetched
    /// and the query fails. Failures are not cached.
    pub async fn order_book(&self) -> Result<Arc<OrderBook>, OrderError> {
        if let Some(book) = self.inner.order_book.get(&()).await {
            return Ok(book);
        }

        let generation = self.orders_generation();
        let book = Arc::new(self.orders().list_all_orders().await?);
        self.cache_order_book(generation, Arc::clone(&book)).await;
        Ok(book)
    }

    /// Drop the cached admin order list after an order write.
    pub async fn invalidate_orders(&self) {
        self.inner.orders_generation.fetch_add(1, Ordering::AcqRel);
        self.inner.order_book.invalidate(&()).await;
    }

    fn orders_generation(&self) -> u64 {
        self.inner.orders_generation.load(Ordering::Acquire)
    }

    /// Cache a book fetched at `generation` unless it has been invalidated since.
    async fn cache_order_book(&self, generation: u64, book: Arc<OrderBook>) {
        if self.orders_generation() != generation {
            tracing::debug!("Order list changed during fetch, not caching");
            return;
        }
        self.inner.order_book.insert((), book).await;
        // An invalidation between the check and the insert must still win.
        if self.orders_generation() != generation {
            self.inner.order_book.invalidate(&()).await;
        }
    }
}
