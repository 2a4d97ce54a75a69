use std::str::FromStr;

use chrono::{DateTime, Utc};
use deck::{Card, CardId, CardType, Rarity};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use thiserror::Error;

const CARD_COLUMNS: &str = "id, name, elixir_cost, rarity, card_type, arena, image_url, \
                            image_url_evo, can_evolve, created_at, updated_at";

#[derive(Debug, Error)]
pub enum CardRecordError {
    #[error("card {id} has unknown rarity {value:?}")]
    Rarity { id: CardId, value: String },
    #[error("card {id} has unknown type {value:?}")]
    CardType { id: CardId, value: String },
    #[error("card {id} has elixir cost {value} outside 0-10")]
    ElixirCost { id: CardId, value: i64 },
}

/// Cached copy of a card as stored in the `cards` table.
#[derive(Debug, Clone, FromRow)]
pub struct CardRecord {
    pub id: CardId,
    pub name: String,
    pub elixir_cost: i64,
    pub rarity: String,
    pub card_type: String,
    pub arena: Option<String>,
    pub image_url: String,
    pub image_url_evo: Option<String>,
    pub can_evolve: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

impl TryFrom<CardRecord> for Card {
    type Error = CardRecordError;

    fn try_from(record: CardRecord) -> Result<Self, Self::Error> {
        let rarity = Rarity::from_str(&record.rarity).map_err(|_| CardRecordError::Rarity {
            id: record.id,
            value: record.rarity.clone(),
        })?;
        let card_type =
            CardType::from_str(&record.card_type).map_err(|_| CardRecordError::CardType {
                id: record.id,
                value: record.card_type.clone(),
            })?;
        let elixir_cost = u8::try_from(record.elixir_cost)
            .ok()
            .filter(|cost| *cost <= deck::card::MAX_ELIXIR_COST)
            .ok_or(CardRecordError::ElixirCost {
                id: record.id,
                value: record.elixir_cost,
            })?;

        Ok(Card {
            id: record.id,
            name: record.name,
            elixir_cost,
            rarity,
            card_type,
            arena: record.arena,
            image_url: record.image_url,
            image_url_evo: record.image_url_evo,
            can_evolve: record.can_evolve,
        })
    }
}

impl CardRecord {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CardRecord>(&format!("SELECT {CARD_COLUMNS} FROM cards ORDER BY id"))
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards")
            .fetch_one(pool)
            .await
    }

    /// Counter bumped by every insert, update or delete on `cards`, from any
    /// connection or process.
    pub async fn catalog_revision(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT revision FROM catalog_revision WHERE id = 1")
            .fetch_one(pool)
            .await
    }

    /// Inserts the card or overwrites every attribute of an existing one.
    pub async fn upsert(conn: &mut SqliteConnection, card: &Card) -> Result<UpsertOutcome, sqlx::Error> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cards WHERE id = $1")
            .bind(card.id)
            .fetch_one(&mut *conn)
            .await?
            > 0;

        sqlx::query(
            r#"INSERT INTO cards (id, name, elixir_cost, rarity, card_type, arena, image_url, image_url_evo, can_evolve)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
               ON CONFLICT(id) DO UPDATE SET
                   name = excluded.name,
                   elixir_cost = excluded.elixir_cost,
                   rarity = excluded.rarity,
                   card_type = excluded.card_type,
                   arena = excluded.arena,
                   image_url = excluded.image_url,
                   image_url_evo = excluded.image_url_evo,
                   can_evolve = excluded.can_evolve,
                   updated_at = datetime('now', 'subsec')"#,
        )
        .bind(card.id)
        .bind(&card.name)
        .bind(i64::from(card.elixir_cost))
        .bind(card.rarity.to_string())
        .bind(card.card_type.to_string())
        .bind(&card.arena)
        .bind(&card.image_url)
        .bind(&card.image_url_evo)
        .bind(card.can_evolve)
        .execute(&mut *conn)
        .await?;

        Ok(if exists {
            UpsertOutcome::Updated
        } else {
            UpsertOutcome::Inserted
        })
    }
}
