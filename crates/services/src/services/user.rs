use std::sync::LazyLock;

use db::models::user::{CreateUser, UpdateUser, User};
use deck::{CardCatalog, CardId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::card::{CardService, CardServiceError};

pub const MAX_PROFILE_NAME_LEN: usize = 50;
pub const MAX_AVATAR_LEN: usize = 50;

static PROFILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9 ]+$").expect("profile name pattern"));

#[derive(Debug, Error)]
pub enum UserServiceError {
    #[error("user not found")]
    NotFound,
    #[error("{0}")]
    InvalidProfile(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Catalog(#[from] CardServiceError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl From<User> for Profile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            avatar: user.avatar,
        }
    }
}

/// Returns the trimmed name, or why it was refused.
pub fn validate_profile_name(name: &str) -> Result<String, UserServiceError> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length == 0 || length > MAX_PROFILE_NAME_LEN {
        return Err(UserServiceError::InvalidProfile(format!(
            "name must be between 1 and {MAX_PROFILE_NAME_LEN} characters"
        )));
    }
    if !PROFILE_NAME.is_match(trimmed) {
        return Err(UserServiceError::InvalidProfile(
            "name may only contain letters, digits and spaces".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
    cards: CardService,
}

impl UserService {
    pub fn new(pool: SqlitePool, cards: CardService) -> Self {
        Self { pool, cards }
    }

    pub async fn get(&self, user_id: Uuid) -> Result<User, UserServiceError> {
        User::find_by_id(&self.pool, user_id)
            .await?
            .ok_or(UserServiceError::NotFound)
    }

    /// Sign-in upsert keyed by Google id. Returning users get their name
    /// refreshed from Google.
    pub async fn create_or_update(
        &self,
        google_id: &str,
        email: &str,
        name: &str,
    ) -> Result<User, UserServiceError> {
        if let Some(existing) = User::find_by_google_id(&self.pool, google_id).await? {
            let update = UpdateUser {
                name: Some(name.to_string()).filter(|n| !n.trim().is_empty()),
                avatar: None,
            };
            let user = User::update(&self.pool, existing.id, &update)
                .await?
                .ok_or(UserServiceError::NotFound)?;
            info!(user_id = %user.id, "Updated existing user");
            return Ok(user);
        }

        let display_name = if name.trim().is_empty() {
            email.split('@').next().unwrap_or(email).to_string()
        } else {
            name.to_string()
        };
        let user = User::create(
            &self.pool,
            Uuid::new_v4(),
            &CreateUser {
                google_id: google_id.to_string(),
                email: email.to_string(),
                name: display_name,
                avatar: None,
            },
        )
        .await?;
        info!(user_id = %user.id, "Created new user");
        Ok(user)
    }

    async fn validate_avatar(&self, avatar: &str) -> Result<String, UserServiceError> {
        let avatar = avatar.trim();
        if avatar.is_empty() || avatar.chars().count() > MAX_AVATAR_LEN {
            return Err(UserServiceError::InvalidProfile(format!(
                "avatar must be between 1 and {MAX_AVATAR_LEN} characters"
            )));
        }
        let card_id: CardId = avatar.parse().map_err(|_| {
            UserServiceError::InvalidProfile("avatar must be a card id".to_string())
        })?;
        if self.cards.snapshot().await?.lookup_card(card_id).is_none() {
            return Err(UserServiceError::InvalidProfile(format!(
                "card {card_id} does not exist"
            )));
        }
        Ok(avatar.to_string())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, UserServiceError> {
        if update.name.is_none() && update.avatar.is_none() {
            return Err(UserServiceError::InvalidProfile(
                "at least one of name or avatar must be provided".to_string(),
            ));
        }

        let name = update.name.as_deref().map(validate_profile_name).transpose()?;
        let avatar = match update.avatar.as_deref() {
            Some(avatar) => Some(self.validate_avatar(avatar).await?),
            None => None,
        };

        let user = User::update(&self.pool, user_id, &UpdateUser { name, avatar })
            .await?
            .ok_or(UserServiceError::NotFound)?;
        info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }
}
