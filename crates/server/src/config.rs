use std::{env, str::FromStr};

use chrono::Duration;
use deck::{DeckRules, rules::DEFAULT_MAX_EVOLUTION_SLOTS};
use services::services::{
    auth::AuthSettings, clash_api::DEFAULT_BASE_URL, deck::DEFAULT_MAX_DECKS_PER_USER,
};
use thiserror::Error;

pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    pub google_client_id: String,
    pub clash_api_key: Option<String>,
    pub clash_api_base_url: String,
    pub max_decks_per_user: usize,
    pub max_evolution_slots: usize,
    pub sentry_dsn: Option<String>,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET",
                value: "<redacted>".to_string(),
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} bytes"),
            });
        }
        let google_client_id =
            get("GOOGLE_CLIENT_ID").ok_or(ConfigError::Missing("GOOGLE_CLIENT_ID"))?;

        let access_token_expire_minutes =
            parse_positive(get("JWT_ACCESS_TOKEN_EXPIRE_MINUTES"), "JWT_ACCESS_TOKEN_EXPIRE_MINUTES", 30)?;
        let refresh_token_expire_days =
            parse_positive(get("JWT_REFRESH_TOKEN_EXPIRE_DAYS"), "JWT_REFRESH_TOKEN_EXPIRE_DAYS", 7)?;

        let max_evolution_slots = parse_or(
            get("MAX_EVOLUTION_SLOTS"),
            "MAX_EVOLUTION_SLOTS",
            DEFAULT_MAX_EVOLUTION_SLOTS,
        )?;
        if max_evolution_slots > deck::DECK_SIZE {
            return Err(ConfigError::Invalid {
                var: "MAX_EVOLUTION_SLOTS",
                value: max_evolution_slots.to_string(),
                reason: format!("must be at most {}", deck::DECK_SIZE),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://deckbuilder.db".to_string()),
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(get("PORT"), "PORT", 8000)?,
            cors_origins: get("CORS_ORIGINS")
                .unwrap_or_else(|| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            jwt_secret,
            access_token_expire_minutes,
            refresh_token_expire_days,
            google_client_id,
            clash_api_key: get("CLASH_ROYALE_API_KEY"),
            clash_api_base_url: get("CLASH_ROYALE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_decks_per_user: parse_or(
                get("MAX_DECKS_PER_USER"),
                "MAX_DECKS_PER_USER",
                DEFAULT_MAX_DECKS_PER_USER,
            )?,
            max_evolution_slots,
            sentry_dsn: get("SENTRY_DSN"),
            environment: get("APP_ENV").unwrap_or_else(|| "development".to_string()),
        })
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            jwt_secret: self.jwt_secret.clone(),
            access_token_ttl: Duration::minutes(self.access_token_expire_minutes),
            refresh_token_ttl: Duration::days(self.refresh_token_expire_days),
        }
    }

    pub fn deck_rules(&self) -> DeckRules {
        DeckRules::with_max_evolution_slots(self.max_evolution_slots)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(raw: Option<String>, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn parse_positive(raw: Option<String>, var: &'static str, default: i64) -> Result<i64, ConfigError> {
    let value = parse_or(raw, var, default)?;
    if value <= 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(value)
}
