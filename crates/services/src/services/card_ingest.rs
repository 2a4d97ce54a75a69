//! Loads raw card JSON (a file export or the live API) into the `cards` table.

use std::{path::Path, str::FromStr};

use db::models::card::{CardRecord, UpsertOutcome};
use deck::{Card, CardId, CardType, Rarity, card::MAX_ELIXIR_COST};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

use super::clash_api::{CardsResponse, ClashApiClient, ClashApiError};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    ClashApi(#[from] ClashApiError),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid card JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a raw entry was left out of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("entry is not a card object: {0}")]
    Malformed(String),
    #[error("card has no id")]
    MissingId,
    #[error("card {0} is missing name, elixir cost or rarity")]
    MissingFields(CardId),
    #[error("card {id} has unknown rarity {rarity:?}")]
    UnknownRarity { id: CardId, rarity: String },
    #[error("card {id} has elixir cost {cost} outside 0-10")]
    ElixirCost { id: CardId, cost: i64 },
    #[error("card {0} has no image url")]
    MissingImage(CardId),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIconUrls {
    medium: Option<String>,
    evolution_medium: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCard {
    id: Option<CardId>,
    name: Option<String>,
    elixir_cost: Option<i64>,
    rarity: Option<String>,
    #[serde(default)]
    icon_urls: RawIconUrls,
    max_evolution_level: Option<i64>,
    arena: Option<serde_json::Value>,
}

/// Turn one API card entry into a catalog card.
pub fn transform_card(raw: &serde_json::Value) -> Result<Card, SkipReason> {
    let raw: RawCard =
        serde_json::from_value(raw.clone()).map_err(|e| SkipReason::Malformed(e.to_string()))?;
    let id = raw.id.ok_or(SkipReason::MissingId)?;

    let name = raw.name.filter(|n| !n.trim().is_empty());
    let rarity_raw = raw.rarity.filter(|r| !r.trim().is_empty());
    let (Some(name), Some(cost), Some(rarity_raw)) = (name, raw.elixir_cost, rarity_raw) else {
        return Err(SkipReason::MissingFields(id));
    };

    let rarity = Rarity::from_str(rarity_raw.trim()).map_err(|_| SkipReason::UnknownRarity {
        id,
        rarity: rarity_raw.clone(),
    })?;
    let elixir_cost = u8::try_from(cost)
        .ok()
        .filter(|c| *c <= MAX_ELIXIR_COST)
        .ok_or(SkipReason::ElixirCost { id, cost })?;

    let card_type = CardType::for_card_id(id).unwrap_or_else(|| {
        warn!(card_id = id, "Card id outside known ranges, defaulting to Troop");
        CardType::Troop
    });

    let image_url = raw
        .icon_urls
        .medium
        .filter(|u| !u.is_empty())
        .ok_or(SkipReason::MissingImage(id))?;
    let image_url_evo = raw.icon_urls.evolution_medium.filter(|u| !u.is_empty());
    let can_evolve = image_url_evo.is_some() || raw.max_evolution_level.is_some();

    Ok(Card {
        id,
        name,
        elixir_cost,
        rarity,
        card_type,
        arena: raw.arena.as_ref().and_then(arena_name),
        image_url,
        image_url_evo,
        can_evolve,
    })
}

/// Arena is either a plain name or an object with a `name` field.
fn arena_name(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(name) => Some(name.clone()),
        serde_json::Value::Object(map) => map.get("name")?.as_str().map(str::to_string),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
pub struct IngestReport {
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl IngestReport {
    pub fn processed(&self) -> usize {
        self.inserted + self.updated
    }
}

pub struct CardIngestor {
    pool: SqlitePool,
}

impl CardIngestor {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Read an `all_cards.json` style export (`{"items": [...]}`).
    pub async fn load_file(path: &Path) -> Result<Vec<serde_json::Value>, IngestError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| IngestError::Io {
                path: path.display().to_string(),
                source,
            })?;
        let parsed: CardsResponse = serde_json::from_str(&contents)?;
        Ok(parsed.items)
    }

    pub async fn load_api(client: &ClashApiClient) -> Result<Vec<serde_json::Value>, IngestError> {
        Ok(client.get_cards().await?.items)
    }

    /// Transform and upsert every entry in one transaction. Bad entries are
    /// skipped; a card the database refuses is counted as failed.
    pub async fn ingest(&self, items: &[serde_json::Value]) -> Result<IngestReport, IngestError> {
        let mut report = IngestReport::default();
        let mut cards = Vec::with_capacity(items.len());
        for item in items {
            match transform_card(item) {
                Ok(card) => cards.push(card),
                Err(reason) => {
                    warn!(%reason, "Skipping card");
                    report.skipped += 1;
                }
            }
        }

        let mut tx = self.pool.begin().await?;
        for card in &cards {
            match CardRecord::upsert(&mut *tx, card).await {
                Ok(UpsertOutcome::Inserted) => report.inserted += 1,
                Ok(UpsertOutcome::Updated) => report.updated += 1,
                Err(e) => {
                    warn!(card_id = card.id, name = %card.name, error = %e, "Failed to store card");
                    report.failed += 1;
                }
            }
        }
        tx.commit().await?;

        info!(
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            failed = report.failed,
            "Card ingestion complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use db::DBService;
    use serde_json::json;

    use super::*;

    fn knight() -> serde_json::Value {
        json!({
            "id": 26000000,
            "name": "Knight",
            "elixirCost": 3,
            "rarity": "common",
            "maxLevel": 16,
            "maxEvolutionLevel": 1,
            "iconUrls": {
                "medium": "https://api-assets.clashroyale.com/cards/300/knight.png",
                "evolutionMedium": "https://api-assets.clashroyale.com/cardevolutions/300/knight.png"
            }
        })
    }

    #[test]
    fn transforms_api_card() {
        let card = transform_card(&knight()).unwrap();
        assert_eq!(card.id, 26_000_000);
        assert_eq!(card.elixir_cost, 3);
        assert_eq!(card.rarity, Rarity::Common);
        assert_eq!(card.card_type, CardType::Troop);
        assert!(card.can_evolve);
        assert!(card.image_url_evo.is_some());
    }

    #[test]
    fn type_comes_from_id_range() {
        let fireball = json!({
            "id": 28000000, "name": "Fireball", "elixirCost": 4, "rarity": "rare",
            "iconUrls": {"medium": "https://x/fireball.png"}
        });
        let card = transform_card(&fireball).unwrap();
        assert_eq!(card.card_type, CardType::Spell);
        assert_eq!(card.rarity, Rarity::Rare);
        assert!(!card.can_evolve);

        let odd = json!({
            "id": 99, "name": "Odd", "elixirCost": 1, "rarity": "epic",
            "iconUrls": {"medium": "https://x/odd.png"}
        });
        assert_eq!(transform_card(&odd).unwrap().card_type, CardType::Troop);
    }

    #[test]
    fn evolution_level_alone_marks_capability() {
        let raw = json!({
            "id": 26000010, "name": "Skeletons", "elixirCost": 1, "rarity": "common",
            "maxEvolutionLevel": 1,
            "iconUrls": {"medium": "https://x/skeletons.png"}
        });
        assert!(transform_card(&raw).unwrap().can_evolve);
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let mirror = json!({
            "id": 28000006, "name": "Mirror", "rarity": "epic",
            "iconUrls": {"medium": "https://x/mirror.png"}
        });
        assert_eq!(
            transform_card(&mirror),
            Err(SkipReason::MissingFields(28_000_006))
        );

        let no_image = json!({
            "id": 26000001, "name": "Archers", "elixirCost": 3, "rarity": "common"
        });
        assert_eq!(
            transform_card(&no_image),
            Err(SkipReason::MissingImage(26_000_001))
        );

        assert_eq!(transform_card(&json!({"name": "Nobody"})), Err(SkipReason::MissingId));
        assert!(matches!(
            transform_card(&json!("not a card")),
            Err(SkipReason::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn ingest_counts_inserts_updates_and_skips() {
        let db = DBService::new_in_memory().await.unwrap();
        let ingestor = CardIngestor::new(db.pool.clone());
        let items = vec![knight(), json!({"id": 1})];

        let first = ingestor.ingest(&items).await.unwrap();
        assert_eq!(
            first,
            IngestReport {
                inserted: 1,
                updated: 0,
                skipped: 1,
                failed: 0
            }
        );

        let second = ingestor.ingest(&items).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 1);
        assert_eq!(CardRecord::count(&db.pool).await.unwrap(), 1);
    }
}
