use chrono::{DateTime, Utc};
use deck::DeckSlots;
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

const DECK_COLUMNS: &str =
    "id, user_id, name, slots, evolution_count, average_elixir, created_at, updated_at";

/// A saved deck row. `slots` holds the JSON-serialized [`DeckSlots`].
#[derive(Debug, Clone, FromRow)]
pub struct DeckRecord {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub slots: String,
    pub evolution_count: i64,
    pub average_elixir: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything written when a deck is saved. Built only from validated decks.
#[derive(Debug, Clone)]
pub struct DeckWrite {
    pub name: String,
    pub slots: DeckSlots,
    pub average_elixir: f64,
}

impl DeckWrite {
    fn slots_json(&self) -> Result<String, sqlx::Error> {
        serde_json::to_string(&self.slots).map_err(|e| sqlx::Error::Protocol(e.to_string()))
    }
}

impl DeckRecord {
    /// Parse the slots JSON back into a slot collection
    pub fn parsed_slots(&self) -> Result<DeckSlots, serde_json::Error> {
        serde_json::from_str(&self.slots)
    }

    pub async fn create<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Option<Uuid>,
        data: &DeckWrite,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let slots = data.slots_json()?;
        sqlx::query_as::<_, DeckRecord>(&format!(
            "INSERT INTO decks (id, user_id, name, slots, evolution_count, average_elixir)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {DECK_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(data.name.trim())
        .bind(slots)
        .bind(data.slots.evolution_count() as i64)
        .bind(data.average_elixir)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DeckRecord>(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Only finds the deck if `user_id` owns it.
    pub async fn find_by_id_for_user<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DeckRecord>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Newest first.
    pub async fn find_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, DeckRecord>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks
             WHERE user_id = $1
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    /// Replaces name and slots of a deck owned by `user_id`; `None` if there is
    /// no such deck.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        user_id: Uuid,
        data: &DeckWrite,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let slots = data.slots_json()?;
        sqlx::query_as::<_, DeckRecord>(&format!(
            "UPDATE decks
             SET name = $3,
                 slots = $4,
                 evolution_count = $5,
                 average_elixir = $6,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND user_id = $2
             RETURNING {DECK_COLUMNS}"
        ))
        .bind(id)
        .bind(user_id)
        .bind(data.name.trim())
        .bind(slots)
        .bind(data.slots.evolution_count() as i64)
        .bind(data.average_elixir)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM decks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn count_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM decks WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(executor)
            .await
    }
}
