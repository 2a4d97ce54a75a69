use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 8;
pub const DEFAULT_MAX_EVOLUTION_SLOTS: usize = 2;
pub const MAX_AVERAGE_ELIXIR: f64 = 10.0;
pub const MAX_DECK_NAME_LEN: usize = 255;

/// Tunable deck constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeckRules {
    pub max_evolution_slots: usize,
}

impl Default for DeckRules {
    fn default() -> Self {
        Self {
            max_evolution_slots: DEFAULT_MAX_EVOLUTION_SLOTS,
        }
    }
}

impl DeckRules {
    /// Clamped to the deck size.
    pub fn with_max_evolution_slots(max_evolution_slots: usize) -> Self {
        Self {
            max_evolution_slots: max_evolution_slots.min(DECK_SIZE),
        }
    }
}
