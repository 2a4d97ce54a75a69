//! Saved decks: validation against the live catalog plus per-user persistence.

use chrono::{DateTime, Utc};
use db::models::deck::{DeckRecord, DeckWrite};
use deck::{
    Card, CardCatalog, CatalogSnapshot, Deck, DeckError, DeckRules, DeckSlots, DeckValidator,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::card::{CardService, CardServiceError};

pub const DEFAULT_MAX_DECKS_PER_USER: usize = 20;

#[derive(Debug, Error)]
pub enum DeckServiceError {
    #[error(transparent)]
    Validation(#[from] DeckError),
    #[error("deck not found")]
    NotFound,
    #[error("deck limit of {limit} reached")]
    LimitExceeded { limit: usize },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Catalog(#[from] CardServiceError),
}

/// Incoming deck as submitted by the builder.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeckPayload {
    pub name: String,
    #[ts(as = "Vec<deck::DeckSlot>")]
    pub slots: DeckSlots,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeckSlotView {
    pub position: usize,
    pub card: Option<Card>,
    pub is_evolution: bool,
}

/// A saved deck with every slot's card expanded from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DeckView {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
    pub slots: Vec<DeckSlotView>,
    pub average_elixir: f64,
    pub evolution_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeckView {
    fn build(
        record: DeckRecord,
        slots: &DeckSlots,
        catalog: &CatalogSnapshot,
    ) -> Self {
        let slot_views = slots
            .iter()
            .map(|slot| DeckSlotView {
                position: slot.position,
                card: slot
                    .card_id
                    .and_then(|id| catalog.lookup_card(id))
                    .cloned(),
                is_evolution: slot.is_evolution,
            })
            .collect();
        Self {
            id: record.id,
            name: record.name,
            user_id: record.user_id,
            slots: slot_views,
            average_elixir: record.average_elixir,
            evolution_count: slots.evolution_count(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct DeckService {
    pool: SqlitePool,
    cards: CardService,
    rules: DeckRules,
    max_decks_per_user: usize,
}

impl DeckService {
    pub fn new(
        pool: SqlitePool,
        cards: CardService,
        rules: DeckRules,
        max_decks_per_user: usize,
    ) -> Self {
        Self {
            pool,
            cards,
            rules,
            max_decks_per_user,
        }
    }

    pub fn rules(&self) -> DeckRules {
        self.rules
    }

    /// Validate a complete deck and compute the average stored with it.
    fn prepare_write(
        &self,
        catalog: &CatalogSnapshot,
        user_id: Uuid,
        payload: DeckPayload,
    ) -> Result<DeckWrite, DeckError> {
        let deck = Deck::with_slots(payload.name, payload.slots).owned_by(user_id);
        let validator = DeckValidator::new(catalog, self.rules);
        validator.ensure_save_eligible(&deck)?;
        let average_elixir = validator.average_elixir(&deck.slots)?;
        Ok(DeckWrite {
            name: deck.name.trim().to_string(),
            slots: deck.slots,
            average_elixir,
        })
    }

    /// Limit check, validation and insert commit together.
    pub async fn create(
        &self,
        user_id: Uuid,
        payload: DeckPayload,
    ) -> Result<DeckView, DeckServiceError> {
        let catalog = self.cards.snapshot().await?;
        let mut tx = self.pool.begin().await?;

        let existing = DeckRecord::count_for_user(&mut *tx, user_id).await?;
        if existing >= self.max_decks_per_user as i64 {
            return Err(DeckServiceError::LimitExceeded {
                limit: self.max_decks_per_user,
            });
        }

        let write = self.prepare_write(&catalog, user_id, payload)?;
        let record = DeckRecord::create(&mut *tx, Uuid::new_v4(), Some(user_id), &write).await?;
        tx.commit().await?;

        info!(deck_id = %record.id, user_id = %user_id, "Deck created");
        Ok(DeckView::build(record, &write.slots, &catalog))
    }

    pub async fn update(
        &self,
        user_id: Uuid,
        deck_id: Uuid,
        payload: DeckPayload,
    ) -> Result<DeckView, DeckServiceError> {
        let catalog = self.cards.snapshot().await?;
        let mut tx = self.pool.begin().await?;

        if DeckRecord::find_by_id_for_user(&mut *tx, deck_id, user_id)
            .await?
            .is_none()
        {
            return Err(DeckServiceError::NotFound);
        }

        let write = self.prepare_write(&catalog, user_id, payload)?;
        let record = DeckRecord::update(&mut *tx, deck_id, user_id, &write)
            .await?
            .ok_or(DeckServiceError::NotFound)?;
        tx.commit().await?;

        info!(deck_id = %deck_id, user_id = %user_id, "Deck updated");
        Ok(DeckView::build(record, &write.slots, &catalog))
    }

    pub async fn get(&self, user_id: Uuid, deck_id: Uuid) -> Result<DeckView, DeckServiceError> {
        let catalog = self.cards.snapshot().await?;
        let record = DeckRecord::find_by_id_for_user(&self.pool, deck_id, user_id)
            .await?
            .ok_or(DeckServiceError::NotFound)?;
        let slots = record.parsed_slots().map_err(|e| {
            warn!(deck_id = %deck_id, error = %e, "Stored deck slots are unreadable");
            DeckServiceError::NotFound
        })?;
        Ok(DeckView::build(record, &slots, &catalog))
    }

    /// Newest first. Rows whose slots no longer decode are skipped.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<DeckView>, DeckServiceError> {
        let catalog = self.cards.snapshot().await?;
        let records = DeckRecord::find_by_user(&self.pool, user_id).await?;
        let views = records
            .into_iter()
            .filter_map(|record| match record.parsed_slots() {
                Ok(slots) => Some(DeckView::build(record, &slots, &catalog)),
                Err(e) => {
                    warn!(deck_id = %record.id, error = %e, "Skipping deck with unreadable slots");
                    None
                }
            })
            .collect();
        Ok(views)
    }

    pub async fn delete(&self, user_id: Uuid, deck_id: Uuid) -> Result<(), DeckServiceError> {
        let removed = DeckRecord::delete(&self.pool, deck_id, user_id).await?;
        if removed == 0 {
            return Err(DeckServiceError::NotFound);
        }
        info!(deck_id = %deck_id, user_id = %user_id, "Deck deleted");
        Ok(())
    }

    pub async fn count(&self, user_id: Uuid) -> Result<usize, DeckServiceError> {
        Ok(DeckRecord::count_for_user(&self.pool, user_id).await? as usize)
    }
}

#[cfg(test)]
mod tests {
    use db::models::user::{CreateUser, User};
    use deck::SlotEdit;

    use super::*;
    use crate::services::card::test_support::*;

    async fn setup(max_decks: usize) -> (DeckService, Uuid) {
        let db = seeded_db().await;
        let user_id = Uuid::new_v4();
        User::create(
            &db.pool,
            user_id,
            &CreateUser {
                google_id: "google-carol".to_string(),
                email: "carol@example.com".to_string(),
                name: "Carol".to_string(),
                avatar: None,
            },
        )
        .await
        .unwrap();
        let service = DeckService::new(
            db.pool.clone(),
            CardService::new(db.pool.clone()),
            DeckRules::default(),
            max_decks,
        );
        (service, user_id)
    }

    fn full_payload(name: &str) -> DeckPayload {
        DeckPayload {
            name: name.to_string(),
            slots: DeckSlots::from_card_ids(FULL_DECK.map(Some)),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (service, user_id) = setup(DEFAULT_MAX_DECKS_PER_USER).await;
        let mut payload = full_payload("  Beatdown  ");
        let catalog = service.cards.snapshot().await.unwrap();
        payload
            .slots
            .apply(SlotEdit::ToggleEvolution { position: 0 }, &*catalog, &service.rules)
            .unwrap();

        let created = service.create(user_id, payload.clone()).await.unwrap();
        assert_eq!(created.name, "Beatdown");
        assert_eq!(created.average_elixir, 4.13);
        assert_eq!(created.evolution_count, 1);
        assert_eq!(
            created.slots[4].card.as_ref().map(|c| c.name.as_str()),
            Some("P.E.K.K.A")
        );

        let loaded = service.get(user_id, created.id).await.unwrap();
        assert_eq!(loaded.average_elixir, 4.13);
        assert!(loaded.slots[0].is_evolution);
        let loaded_ids: Vec<_> = loaded
            .slots
            .iter()
            .map(|s| s.card.as_ref().map(|c| c.id))
            .collect();
        assert_eq!(loaded_ids, FULL_DECK.map(Some).to_vec());
    }

    #[tokio::test]
    async fn incomplete_deck_is_rejected() {
        let (service, user_id) = setup(DEFAULT_MAX_DECKS_PER_USER).await;
        let mut ids = FULL_DECK.map(Some);
        ids[7] = None;
        let payload = DeckPayload {
            name: "Seven".to_string(),
            slots: DeckSlots::from_card_ids(ids),
        };
        let err = service.create(user_id, payload).await.unwrap_err();
        assert!(matches!(
            err,
            DeckServiceError::Validation(DeckError::IncompleteDeck { filled: 7, .. })
        ));
        assert_eq!(service.count(user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn deck_limit_is_enforced() {
        let (service, user_id) = setup(2).await;
        service.create(user_id, full_payload("one")).await.unwrap();
        service.create(user_id, full_payload("two")).await.unwrap();
        let err = service
            .create(user_id, full_payload("three"))
            .await
            .unwrap_err();
        assert!(matches!(err, DeckServiceError::LimitExceeded { limit: 2 }));
        assert_eq!(service.count(user_id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn update_and_delete_require_ownership() {
        let (service, user_id) = setup(DEFAULT_MAX_DECKS_PER_USER).await;
        let created = service.create(user_id, full_payload("mine")).await.unwrap();
        let stranger = Uuid::new_v4();

        assert!(matches!(
            service
                .update(stranger, created.id, full_payload("theirs"))
                .await,
            Err(DeckServiceError::NotFound)
        ));
        assert!(matches!(
            service.delete(stranger, created.id).await,
            Err(DeckServiceError::NotFound)
        ));

        let mut ids = FULL_DECK.map(Some);
        ids[4] = Some(SKELETONS);
        let renamed = service
            .update(
                user_id,
                created.id,
                DeckPayload {
                    name: "cheaper".to_string(),
                    slots: DeckSlots::from_card_ids(ids),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "cheaper");
        assert_eq!(renamed.average_elixir, 3.38);

        service.delete(user_id, created.id).await.unwrap();
        assert!(matches!(
            service.get(user_id, created.id).await,
            Err(DeckServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_skips_rows_with_corrupt_slots() {
        let (service, user_id) = setup(DEFAULT_MAX_DECKS_PER_USER).await;
        let good = service.create(user_id, full_payload("good")).await.unwrap();
        let bad = service.create(user_id, full_payload("bad")).await.unwrap();

        let broken = serde_json::to_string(&vec![deck::DeckSlot::empty(0); 8]).unwrap();
        sqlx::query("UPDATE decks SET slots = $1 WHERE id = $2")
            .bind(broken)
            .bind(bad.id)
            .execute(&service.pool)
            .await
            .unwrap();

        let decks = service.list(user_id).await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].id, good.id);
    }
}
