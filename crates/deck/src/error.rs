use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use crate::card::CardId;

/// Deck validation and editing failures. All are recoverable: the deck stays
/// editable and the caller surfaces the message.
///
/// Serialized with a `kind` tag so clients can tell which rule failed and which
/// slots were involved.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeckError {
    #[error("slot position {position} is outside 0-7")]
    InvalidPosition { position: usize },
    #[error("card {card_id} appears in more than one slot: {positions:?}")]
    DuplicateCard {
        #[ts(type = "number")]
        card_id: CardId,
        positions: Vec<usize>,
    },
    #[error("card {card_id} in slot {position} cannot evolve")]
    NotEvolutionCapable {
        position: usize,
        #[ts(type = "number")]
        card_id: CardId,
    },
    #[error("at most {limit} evolution slots are allowed, got {positions:?}")]
    EvolutionLimitExceeded { limit: usize, positions: Vec<usize> },
    #[error("deck has only {filled} of 8 slots filled")]
    IncompleteDeck {
        filled: usize,
        empty_positions: Vec<usize>,
    },
    #[error("average elixir {value} is outside 0-10")]
    InvalidAverageElixir { value: f64 },
    #[error("card {card_id} is not in the catalog")]
    CardNotFound {
        #[ts(type = "number")]
        card_id: CardId,
        position: Option<usize>,
    },
    #[error("slot {position} is empty")]
    EmptySlot { position: usize },
    #[error("deck name must be between 1 and 255 characters, got {length}")]
    InvalidName { length: usize },
    #[error("a deck has exactly 8 slots, got {found}")]
    SlotCount { found: usize },
}

impl DeckError {
    /// Which of the four save invariants this error reports, if any.
    pub fn invariant(&self) -> Option<u8> {
        match self {
            Self::SlotCount { .. }
            | Self::InvalidPosition { .. }
            | Self::DuplicateCard { .. }
            | Self::CardNotFound { .. } => Some(1),
            Self::EvolutionLimitExceeded { .. } => Some(2),
            Self::NotEvolutionCapable { .. } | Self::EmptySlot { .. } => Some(3),
            Self::InvalidAverageElixir { .. } => Some(4),
            Self::IncompleteDeck { .. } | Self::InvalidName { .. } => None,
        }
    }
}
