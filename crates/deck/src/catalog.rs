use std::collections::{BTreeMap, HashMap};

use crate::{
    card::{Card, CardId},
    error::DeckError,
};

/// Read-only card lookup by identifier.
pub trait CardCatalog {
    fn lookup_card(&self, id: CardId) -> Option<&Card>;

    /// Lookup that turns a miss into a refusal carrying the slot it was meant for.
    fn require_card(&self, id: CardId, position: Option<usize>) -> Result<&Card, DeckError> {
        self.lookup_card(id).ok_or(DeckError::CardNotFound {
            card_id: id,
            position,
        })
    }
}

impl CardCatalog for HashMap<CardId, Card> {
    fn lookup_card(&self, id: CardId) -> Option<&Card> {
        self.get(&id)
    }
}

impl CardCatalog for BTreeMap<CardId, Card> {
    fn lookup_card(&self, id: CardId) -> Option<&Card> {
        self.get(&id)
    }
}

/// Point-in-time copy of the whole catalog, ordered by card id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    cards: BTreeMap<CardId, Card>,
}

impl CatalogSnapshot {
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().map(|card| (card.id, card)).collect(),
        }
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl CardCatalog for CatalogSnapshot {
    fn lookup_card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }
}

/// The ten-card catalog shared by this workspace's tests.
#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures {
    use super::*;
    use crate::card::{CardType, Rarity};

    pub const KNIGHT: CardId = 26_000_000;
    pub const ARCHERS: CardId = 26_000_001;
    pub const GIANT: CardId = 26_000_003;
    pub const PEKKA: CardId = 26_000_004;
    pub const SKELETONS: CardId = 26_000_010;
    pub const WIZARD: CardId = 26_000_017;
    pub const ARCHER_QUEEN: CardId = 26_000_072;
    pub const CANNON: CardId = 27_000_000;
    pub const FIREBALL: CardId = 28_000_000;
    pub const ZAP: CardId = 28_000_008;

    fn card(id: CardId, name: &str, cost: u8, rarity: Rarity, can_evolve: bool) -> Card {
        Card {
            id,
            name: name.to_string(),
            elixir_cost: cost,
            rarity,
            card_type: CardType::for_card_id(id).unwrap_or(CardType::Troop),
            arena: None,
            image_url: format!("https://cards.test/{id}.png"),
            image_url_evo: can_evolve.then(|| format!("https://cards.test/{id}-evo.png")),
            can_evolve,
        }
    }

    /// Knight, Archers, Skeletons and Zap can evolve.
    pub fn cards() -> Vec<Card> {
        vec![
            card(KNIGHT, "Knight", 3, Rarity::Common, true),
            card(ARCHERS, "Archers", 3, Rarity::Common, true),
            card(GIANT, "Giant", 5, Rarity::Rare, false),
            card(PEKKA, "P.E.K.K.A", 7, Rarity::Epic, false),
            card(SKELETONS, "Skeletons", 1, Rarity::Common, true),
            card(WIZARD, "Wizard", 5, Rarity::Rare, false),
            card(ARCHER_QUEEN, "Archer Queen", 5, Rarity::Champion, false),
            card(CANNON, "Cannon", 3, Rarity::Common, false),
            card(FIREBALL, "Fireball", 4, Rarity::Rare, false),
            card(ZAP, "Zap", 2, Rarity::Common, true),
        ]
    }

    pub fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::from_cards(cards())
    }

    /// Costs [3, 3, 2, 5, 7, 3, 5, 5]; average 4.13.
    pub const FULL_DECK: [CardId; 8] = [
        KNIGHT,
        ARCHERS,
        ZAP,
        GIANT,
        PEKKA,
        CANNON,
        WIZARD,
        ARCHER_QUEEN,
    ];
}
