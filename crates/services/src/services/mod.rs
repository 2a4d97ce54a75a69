pub mod auth;
pub mod card;
pub mod card_ingest;
pub mod clash_api;
pub mod database_validator;
pub mod deck;
pub mod onboarding;
pub mod user;
