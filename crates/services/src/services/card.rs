use std::{sync::Arc, time::Duration};

use db::models::card::CardRecord;
use deck::{Card, CardCatalog, CardId, CatalogSnapshot};
use moka::future::Cache;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, warn};

const CATALOG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Error)]
pub enum CardServiceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Serves the card catalog from the `cards` table, cached as a single
/// immutable snapshot tagged with the catalog revision it was read at.
#[derive(Clone)]
pub struct CardService {
    pool: SqlitePool,
    cache: Cache<(), CachedCatalog>,
}

#[derive(Clone)]
struct CachedCatalog {
    revision: i64,
    snapshot: Arc<CatalogSnapshot>,
}

impl CardService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_ttl(pool, CATALOG_TTL)
    }

    pub fn with_ttl(pool: SqlitePool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// The whole catalog. The cached copy is reused only while the stored
    /// catalog revision is unchanged, so ingestion from any process is seen
    /// on the next read.
    pub async fn snapshot(&self) -> Result<Arc<CatalogSnapshot>, CardServiceError> {
        let revision = CardRecord::catalog_revision(&self.pool).await?;
        if let Some(cached) = self.cache.get(&()).await.filter(|c| c.revision == revision) {
            return Ok(cached.snapshot);
        }

        let snapshot = Arc::new(self.load().await?);
        debug!(revision, cards = snapshot.len(), "Loaded card catalog");
        self.cache
            .insert(
                (),
                CachedCatalog {
                    revision,
                    snapshot: snapshot.clone(),
                },
            )
            .await;
        Ok(snapshot)
    }

    async fn load(&self) -> Result<CatalogSnapshot, CardServiceError> {
        let records = CardRecord::find_all(&self.pool).await?;
        let cards = records.into_iter().filter_map(|record| {
            Card::try_from(record)
                .inspect_err(|e| warn!(error = %e, "Skipping unreadable card row"))
                .ok()
        });
        Ok(CatalogSnapshot::from_cards(cards))
    }

    pub async fn list_cards(&self) -> Result<Vec<Card>, CardServiceError> {
        Ok(self.snapshot().await?.cards().cloned().collect())
    }

    pub async fn get_card(&self, id: CardId) -> Result<Option<Card>, CardServiceError> {
        Ok(self.snapshot().await?.lookup_card(id).cloned())
    }
}
