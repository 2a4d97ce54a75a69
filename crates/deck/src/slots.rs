use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    card::CardId,
    catalog::CardCatalog,
    error::DeckError,
    rules::{DECK_SIZE, DeckRules},
};

/// One of the eight placements in a deck. The slot only references its card by
/// id; card data stays in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DeckSlot {
    pub position: usize,
    #[ts(type = "number | null")]
    pub card_id: Option<CardId>,
    #[serde(default)]
    pub is_evolution: bool,
}

impl DeckSlot {
    pub fn empty(position: usize) -> Self {
        Self {
            position,
            card_id: None,
            is_evolution: false,
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.card_id.is_some()
    }
}

/// A single editing step, as sent by the deck builder UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SlotEdit {
    Place {
        position: usize,
        #[ts(type = "number")]
        card_id: CardId,
    },
    Remove {
        position: usize,
    },
    ToggleEvolution {
        position: usize,
    },
}

/// Fixed-size, ordered slot collection. Every mutation either fully applies or
/// leaves the collection untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<DeckSlot>", into = "Vec<DeckSlot>")]
pub struct DeckSlots {
    slots: [DeckSlot; DECK_SIZE],
}

impl Default for DeckSlots {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(DeckSlot::empty),
        }
    }
}

impl TryFrom<Vec<DeckSlot>> for DeckSlots {
    type Error = DeckError;

    /// Accepts slots in any order as long as positions 0-7 each appear once.
    fn try_from(mut slots: Vec<DeckSlot>) -> Result<Self, Self::Error> {
        if slots.len() != DECK_SIZE {
            return Err(DeckError::SlotCount { found: slots.len() });
        }
        slots.sort_by_key(|slot| slot.position);

        let mut collection = Self::default();
        for (index, slot) in slots.into_iter().enumerate() {
            if slot.position != index {
                return Err(DeckError::InvalidPosition {
                    position: slot.position,
                });
            }
            collection.slots[index] = slot;
        }
        Ok(collection)
    }
}

impl From<DeckSlots> for Vec<DeckSlot> {
    fn from(slots: DeckSlots) -> Self {
        slots.slots.to_vec()
    }
}

impl DeckSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from card ids in slot order, without evolution flags
    /// and without consulting a catalog.
    pub fn from_card_ids(card_ids: [Option<CardId>; DECK_SIZE]) -> Self {
        let mut collection = Self::default();
        for (slot, card_id) in collection.slots.iter_mut().zip(card_ids) {
            slot.card_id = card_id;
        }
        collection
    }

    pub fn get(&self, position: usize) -> Result<&DeckSlot, DeckError> {
        self.slots
            .get(position)
            .ok_or(DeckError::InvalidPosition { position })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeckSlot> {
        self.slots.iter()
    }

    pub fn occupied(&self) -> impl Iterator<Item = (usize, CardId)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.card_id.map(|id| (slot.position, id)))
    }

    pub fn position_of(&self, card_id: CardId) -> Option<usize> {
        self.occupied()
            .find(|(_, id)| *id == card_id)
            .map(|(position, _)| position)
    }

    pub fn filled_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_occupied()).count()
    }

    pub fn is_full(&self) -> bool {
        self.filled_count() == DECK_SIZE
    }

    pub fn empty_positions(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| !slot.is_occupied())
            .map(|slot| slot.position)
            .collect()
    }

    pub fn evolution_positions(&self) -> Vec<usize> {
        self.slots
            .iter()
            .filter(|slot| slot.is_evolution)
            .map(|slot| slot.position)
            .collect()
    }

    pub fn evolution_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_evolution).count()
    }

    /// Puts `card_id` into `position`, replacing whatever was there. The
    /// replaced slot loses its evolution flag.
    pub fn place_card<C: CardCatalog + ?Sized>(
        &mut self,
        position: usize,
        card_id: CardId,
        catalog: &C,
    ) -> Result<&Self, DeckError> {
        self.get(position)?;
        catalog.require_card(card_id, Some(position))?;

        match self.position_of(card_id) {
            Some(existing) if existing == position => return Ok(&*self),
            Some(existing) => {
                return Err(DeckError::DuplicateCard {
                    card_id,
                    positions: vec![existing, position],
                });
            }
            None => {}
        }

        self.slots[position] = DeckSlot {
            position,
            card_id: Some(card_id),
            is_evolution: false,
        };
        Ok(&*self)
    }

    pub fn remove_card(&mut self, position: usize) -> Result<&Self, DeckError> {
        self.get(position)?;
        self.slots[position] = DeckSlot::empty(position);
        Ok(&*self)
    }

    /// Flips the evolution flag of `position`. Switching a flag off always
    /// succeeds; switching it on requires an evolution-capable card and a free
    /// evolution slot.
    pub fn toggle_evolution<C: CardCatalog + ?Sized>(
        &mut self,
        position: usize,
        catalog: &C,
        rules: &DeckRules,
    ) -> Result<&Self, DeckError> {
        let slot = *self.get(position)?;
        let card_id = slot.card_id.ok_or(DeckError::EmptySlot { position })?;

        if slot.is_evolution {
            self.slots[position].is_evolution = false;
            return Ok(&*self);
        }

        let card = catalog.require_card(card_id, Some(position))?;
        if !card.can_evolve {
            return Err(DeckError::NotEvolutionCapable { position, card_id });
        }

        let mut positions = self.evolution_positions();
        if positions.len() >= rules.max_evolution_slots {
            positions.push(position);
            return Err(DeckError::EvolutionLimitExceeded {
                limit: rules.max_evolution_slots,
                positions,
            });
        }

        self.slots[position].is_evolution = true;
        Ok(&*self)
    }

    pub fn apply<C: CardCatalog + ?Sized>(
        &mut self,
        edit: SlotEdit,
        catalog: &C,
        rules: &DeckRules,
    ) -> Result<&Self, DeckError> {
        match edit {
            SlotEdit::Place { position, card_id } => self.place_card(position, card_id, catalog),
            SlotEdit::Remove { position } => self.remove_card(position),
            SlotEdit::ToggleEvolution { position } => {
                self.toggle_evolution(position, catalog, rules)
            }
        }
    }
}
