//! Shared application state.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AppState (cloned into every handler)                                  │
//! │  ├── db            Database          (pool, shared)                    │
//! │  ├── sessions      Arc<dyn SessionProvider>                            │
//! │  ├── listing_cache Arc<SalesListingCache>                              │
//! │  └── config        Arc<DashboardConfig>                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::Serialize;
use tally_core::SaleSummary;
use tally_db::Database;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::DashboardConfig;
use crate::recorder::SaleRecorder;
use crate::session::SessionProvider;

/// One page of the sales listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesPage {
    pub query: String,
    pub page: u32,
    pub total_pages: u32,
    pub sales: Vec<SaleSummary>,
}

/// Cached listing pages keyed by `(query, page)`.
///
/// Holds at most `capacity` pages; the oldest entry is evicted first.
/// Every [`invalidate`](Self::invalidate) starts a new generation, and a
/// page read under an older generation is never stored.
#[derive(Debug)]
pub struct SalesListingCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    generation: u64,
    pages: HashMap<(String, u32), SalesPage>,
    /// Insertion order, oldest first.
    order: VecDeque<(String, u32)>,
}

impl SalesListingCache {
    pub fn new(capacity: usize) -> Self {
        SalesListingCache {
            inner: RwLock::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    pub async fn get(&self, query: &str, page: u32) -> Option<SalesPage> {
        self.inner
            .read()
            .await
            .pages
            .get(&(query.to_string(), page))
            .cloned()
    }

    /// Current generation. Capture it before reading the database.
    pub async fn generation(&self) -> u64 {
        self.inner.read().await.generation
    }

    /// Stores a page read under `generation`.
    ///
    /// Returns `false` without storing when the cache was invalidated since.
    pub async fn insert(&self, generation: u64, page: SalesPage) -> bool {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if inner.generation != generation {
            debug!(query = %page.query, page = page.page, "Discarding listing read before invalidation");
            return false;
        }

        let key = (page.query.clone(), page.page);
        if inner.pages.insert(key.clone(), page).is_none() {
            inner.order.push_back(key);
            while inner.order.len() > self.capacity {
                let Some(oldest) = inner.order.pop_front() else {
                    break;
                };
                inner.pages.remove(&oldest);
            }
        }
        true
    }

    /// Drops every cached page and starts a new generation.
    pub async fn invalidate(&self) {
        let mut inner = self.inner.write().await;
        debug!(entries = inner.pages.len(), "Invalidating sales listing cache");
        inner.pages.clear();
        inner.order.clear();
        inner.generation += 1;
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.pages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: Arc<dyn SessionProvider>,
    pub listing_cache: Arc<SalesListingCache>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(db: Database, sessions: Arc<dyn SessionProvider>, config: DashboardConfig) -> Self {
        AppState {
            db,
            sessions,
            listing_cache: Arc::new(SalesListingCache::new(config.listing_cache_capacity)),
            config: Arc::new(config),
        }
    }

    /// A recorder bound to this state's database and listing cache.
    pub fn recorder(&self) -> SaleRecorder {
        SaleRecorder::new(self.db.clone(), self.listing_cache.clone())
    }
}
