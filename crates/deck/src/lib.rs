//! Deck composition model: the rules that decide what an 8-slot Clash Royale
//! deck may contain and when it can be saved.

pub mod card;
pub mod catalog;
pub mod deck;
pub mod error;
pub mod rules;
pub mod slots;
pub mod validator;

pub use card::{Card, CardId, CardType, Rarity};
pub use catalog::{CardCatalog, CatalogSnapshot};
pub use deck::Deck;
pub use error::DeckError;
pub use rules::{DECK_SIZE, DeckRules};
pub use slots::{DeckSlot, DeckSlots, SlotEdit};
pub use validator::{DeckAnalysis, DeckValidator};
