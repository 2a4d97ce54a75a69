//! Startup and health checks that the schema the services rely on is present.

use db::models::card::CardRecord;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;

pub const REQUIRED_TABLES: [&str; 4] = ["users", "cards", "catalog_revision", "decks"];

#[derive(Debug, Error)]
pub enum DatabaseValidationError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("required tables missing: {0}")]
    MissingTables(String),
}

pub struct DatabaseValidator {
    pool: SqlitePool,
}

impl DatabaseValidator {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Migration bookkeeping, required tables and whether the card catalog has
    /// been ingested yet.
    pub async fn validate(&self) -> Result<ValidationResult, DatabaseValidationError> {
        let migrations_table_exists = self.table_exists("_sqlx_migrations").await?;
        if !migrations_table_exists {
            warn!("Database not initialized - _sqlx_migrations table does not exist");
            return Ok(ValidationResult {
                is_initialized: false,
                migrations_applied: 0,
                latest_migration: None,
                missing_tables: REQUIRED_TABLES.iter().map(|t| t.to_string()).collect(),
                card_count: 0,
                warnings: vec!["Database has not been initialized. Run migrations.".to_string()],
            });
        }

        let migrations_applied =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
                .fetch_one(&self.pool)
                .await?;
        let latest_migration = self.latest_migration().await?;
        let missing_tables = self.missing_tables(&REQUIRED_TABLES).await?;

        let mut warnings = Vec::new();
        let card_count = if missing_tables.iter().any(|t| t == "cards") {
            0
        } else {
            CardRecord::count(&self.pool).await?
        };
        if !missing_tables.is_empty() {
            warnings.push(format!("Missing tables: {}", missing_tables.join(", ")));
        }
        if card_count == 0 {
            warnings.push("Card catalog is empty. Run ingest_cards.".to_string());
        }

        info!(
            migrations_applied,
            card_count,
            warnings = warnings.len(),
            "Database validation complete"
        );

        Ok(ValidationResult {
            is_initialized: true,
            migrations_applied: migrations_applied as usize,
            latest_migration,
            missing_tables,
            card_count: card_count as usize,
            warnings,
        })
    }

    /// Fails when any table the services depend on is absent.
    pub async fn ensure_schema(&self) -> Result<(), DatabaseValidationError> {
        let missing = self.missing_tables(&REQUIRED_TABLES).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DatabaseValidationError::MissingTables(missing.join(", ")))
        }
    }

    async fn table_exists(&self, table: &str) -> Result<bool, DatabaseValidationError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn missing_tables(
        &self,
        required_tables: &[&str],
    ) -> Result<Vec<String>, DatabaseValidationError> {
        let mut missing_tables = Vec::new();
        for table in required_tables {
            if !self.table_exists(table).await? {
                missing_tables.push(table.to_string());
            }
        }
        Ok(missing_tables)
    }

    async fn latest_migration(&self) -> Result<Option<String>, DatabaseValidationError> {
        let migration = sqlx::query_scalar::<_, String>(
            "SELECT description FROM _sqlx_migrations WHERE success = 1 ORDER BY version DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(migration)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ValidationResult {
    pub is_initialized: bool,
    pub migrations_applied: usize,
    pub latest_migration: Option<String>,
    pub missing_tables: Vec<String>,
    pub card_count: usize,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Schema usable. An empty catalog is a warning, not a failure.
    pub fn is_ok(&self) -> bool {
        self.is_initialized && self.missing_tables.is_empty()
    }

    pub fn summary(&self) -> String {
        if !self.is_initialized {
            "Database not initialized - migrations need to be run".to_string()
        } else if !self.warnings.is_empty() {
            format!("Database validation warnings: {}", self.warnings.join(", "))
        } else {
            format!(
                "Database OK - {} migrations applied, {} cards",
                self.migrations_applied, self.card_count
            )
        }
    }
}
