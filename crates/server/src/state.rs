use std::sync::Arc;

use db::DBService;
use deck::DeckRules;
use services::services::{
    auth::{AuthService, GoogleTokenVerifier},
    card::CardService,
    deck::DeckService,
    onboarding::OnboardingService,
    user::UserService,
};

use crate::config::AppConfig;

/// Shared handles to every service, cloned into each request.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    auth: AuthService,
    users: UserService,
    cards: CardService,
    decks: DeckService,
    onboarding: OnboardingService,
}

impl AppState {
    pub fn new(config: &AppConfig, db: DBService, verifier: Arc<dyn GoogleTokenVerifier>) -> Self {
        let pool = db.pool.clone();
        let cards = CardService::new(pool.clone());
        let decks = DeckService::new(
            pool.clone(),
            cards.clone(),
            config.deck_rules(),
            config.max_decks_per_user,
        );
        Self {
            auth: AuthService::new(pool.clone(), &config.auth_settings(), verifier),
            users: UserService::new(pool, cards.clone()),
            onboarding: OnboardingService::new(decks.clone()),
            cards,
            decks,
            db,
        }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn cards(&self) -> &CardService {
        &self.cards
    }

    pub fn decks(&self) -> &DeckService {
        &self.decks
    }

    pub fn onboarding(&self) -> &OnboardingService {
        &self.onboarding
    }

    pub fn deck_rules(&self) -> DeckRules {
        self.decks.rules()
    }
}
