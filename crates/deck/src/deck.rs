use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::slots::{DeckSlot, DeckSlots};

/// A named deck in the making. Owner is absent for anonymous decks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Deck {
    pub name: String,
    #[ts(as = "Vec<DeckSlot>")]
    pub slots: DeckSlots,
    pub owner: Option<Uuid>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: DeckSlots::new(),
            owner: None,
        }
    }

    pub fn with_slots(name: impl Into<String>, slots: DeckSlots) -> Self {
        Self {
            name: name.into(),
            slots,
            owner: None,
        }
    }

    pub fn owned_by(mut self, owner: Uuid) -> Self {
        self.owner = Some(owner);
        self
    }
}
