//! Derived deck properties and the checks a deck must pass before it is saved.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    card::CardId,
    catalog::CardCatalog,
    deck::Deck,
    error::DeckError,
    rules::{DeckRules, MAX_AVERAGE_ELIXIR, MAX_DECK_NAME_LEN},
    slots::DeckSlots,
};

/// Snapshot of everything the builder shows next to a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct DeckAnalysis {
    pub average_elixir: f64,
    pub filled_count: usize,
    pub evolution_count: usize,
    pub save_eligible: bool,
    pub violation: Option<DeckError>,
    /// Save invariant (1-4) the violation belongs to; `None` for completeness
    /// and name problems.
    pub violated_invariant: Option<u8>,
}

/// Validates decks against a catalog. Evolution capability is always read
/// from the catalog at call time.
pub struct DeckValidator<'a, C: CardCatalog + ?Sized> {
    catalog: &'a C,
    rules: DeckRules,
}

impl<'a, C: CardCatalog + ?Sized> DeckValidator<'a, C> {
    pub fn new(catalog: &'a C, rules: DeckRules) -> Self {
        Self { catalog, rules }
    }

    /// Mean elixir cost of the occupied slots, rounded half-up to two
    /// decimals. An empty deck averages 0.00.
    pub fn average_elixir(&self, slots: &DeckSlots) -> Result<f64, DeckError> {
        let mut total: u64 = 0;
        let mut count: u64 = 0;
        for (position, card_id) in slots.occupied() {
            let card = self.catalog.require_card(card_id, Some(position))?;
            total += u64::from(card.elixir_cost);
            count += 1;
        }
        Ok(round_half_up_hundredths(total, count))
    }

    /// Checks the save invariants in order and stops at the first failure:
    /// unique known cards, evolution slot count, evolution capability, average
    /// elixir range. The deck name is checked last.
    pub fn validate_for_save(&self, deck: &Deck) -> Result<(), DeckError> {
        self.check_unique_cards(&deck.slots)?;
        self.check_evolution_count(&deck.slots)?;
        self.check_evolution_capability(&deck.slots)?;

        let average = self.average_elixir(&deck.slots)?;
        if !(0.0..=MAX_AVERAGE_ELIXIR).contains(&average) {
            return Err(DeckError::InvalidAverageElixir { value: average });
        }

        let length = deck.name.trim().chars().count();
        if length == 0 || length > MAX_DECK_NAME_LEN {
            return Err(DeckError::InvalidName { length });
        }
        Ok(())
    }

    /// Like [`validate_for_save`](Self::validate_for_save), additionally
    /// requiring all eight slots to be filled.
    pub fn ensure_save_eligible(&self, deck: &Deck) -> Result<(), DeckError> {
        self.validate_for_save(deck)?;
        if !deck.slots.is_full() {
            return Err(DeckError::IncompleteDeck {
                filled: deck.slots.filled_count(),
                empty_positions: deck.slots.empty_positions(),
            });
        }
        Ok(())
    }

    pub fn is_save_eligible(&self, deck: &Deck) -> bool {
        self.ensure_save_eligible(deck).is_ok()
    }

    pub fn analyze(&self, deck: &Deck) -> DeckAnalysis {
        let violation = self.ensure_save_eligible(deck).err();
        DeckAnalysis {
            average_elixir: self.average_elixir(&deck.slots).unwrap_or(0.0),
            filled_count: deck.slots.filled_count(),
            evolution_count: deck.slots.evolution_count(),
            save_eligible: violation.is_none(),
            violated_invariant: violation.as_ref().and_then(DeckError::invariant),
            violation,
        }
    }

    fn check_unique_cards(&self, slots: &DeckSlots) -> Result<(), DeckError> {
        let mut seen: HashMap<CardId, usize> = HashMap::new();
        for (position, card_id) in slots.occupied() {
            if let Some(first) = seen.insert(card_id, position) {
                return Err(DeckError::DuplicateCard {
                    card_id,
                    positions: vec![first, position],
                });
            }
            self.catalog.require_card(card_id, Some(position))?;
        }
        Ok(())
    }

    fn check_evolution_count(&self, slots: &DeckSlots) -> Result<(), DeckError> {
        let positions = slots.evolution_positions();
        if positions.len() > self.rules.max_evolution_slots {
            return Err(DeckError::EvolutionLimitExceeded {
                limit: self.rules.max_evolution_slots,
                positions,
            });
        }
        Ok(())
    }

    fn check_evolution_capability(&self, slots: &DeckSlots) -> Result<(), DeckError> {
        for slot in slots.iter().filter(|slot| slot.is_evolution) {
            let position = slot.position;
            let card_id = slot.card_id.ok_or(DeckError::EmptySlot { position })?;
            let card = self.catalog.require_card(card_id, Some(position))?;
            if !card.can_evolve {
                return Err(DeckError::NotEvolutionCapable { position, card_id });
            }
        }
        Ok(())
    }
}

/// `total / count` in hundredths, halves rounded up, computed in integers so
/// that e.g. 33 / 8 = 4.125 reliably becomes 4.13.
fn round_half_up_hundredths(total: u64, count: u64) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let hundredths = (total * 200 + count) / (2 * count);
    hundredths as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        card::{Card, CardType, Rarity},
        catalog::{CatalogSnapshot, fixtures::*},
        slots::DeckSlot,
    };

    fn full_deck() -> Deck {
        Deck::with_slots("Beatdown", DeckSlots::from_card_ids(FULL_DECK.map(Some)))
    }

    fn flagged(deck: &Deck, positions: &[usize]) -> Deck {
        let mut slots: Vec<DeckSlot> = deck.slots.clone().into();
        for &position in positions {
            slots[position].is_evolution = true;
        }
        Deck::with_slots(deck.name.clone(), DeckSlots::try_from(slots).unwrap())
    }

    #[test]
    fn average_rounds_half_up() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        assert_eq!(validator.average_elixir(&full_deck().slots).unwrap(), 4.13);
    }

    #[test]
    fn average_of_empty_deck_is_zero() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        assert_eq!(validator.average_elixir(&DeckSlots::new()).unwrap(), 0.0);
    }

    #[test]
    fn average_of_partial_deck_uses_occupied_slots_only() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        // Knight 3 + Giant 5 + Skeletons 1 = 9 / 3
        let slots = DeckSlots::from_card_ids([
            Some(KNIGHT),
            None,
            Some(GIANT),
            None,
            None,
            Some(SKELETONS),
            None,
            None,
        ]);
        assert_eq!(validator.average_elixir(&slots).unwrap(), 3.0);
        // 3 + 5 = 8 / 2, then 3 + 5 + 5 = 13 / 3 = 4.333..
        let slots = DeckSlots::from_card_ids([
            Some(KNIGHT),
            Some(GIANT),
            Some(WIZARD),
            None,
            None,
            None,
            None,
            None,
        ]);
        assert_eq!(validator.average_elixir(&slots).unwrap(), 4.33);
    }

    #[test]
    fn rounding_helper() {
        assert_eq!(round_half_up_hundredths(33, 8), 4.13);
        assert_eq!(round_half_up_hundredths(2, 3), 0.67);
        assert_eq!(round_half_up_hundredths(1, 8), 0.13);
        assert_eq!(round_half_up_hundredths(80, 8), 10.0);
        assert_eq!(round_half_up_hundredths(0, 0), 0.0);
    }

    #[test]
    fn full_valid_deck_is_save_eligible() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let deck = flagged(&full_deck(), &[0, 2]);
        assert_eq!(validator.validate_for_save(&deck), Ok(()));
        assert!(validator.is_save_eligible(&deck));
    }

    #[test]
    fn incomplete_deck_is_not_eligible_until_last_slot_filled() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut deck = full_deck();
        deck.slots.remove_card(7).unwrap();

        assert_eq!(validator.validate_for_save(&deck), Ok(()));
        assert!(!validator.is_save_eligible(&deck));
        assert_eq!(
            validator.ensure_save_eligible(&deck),
            Err(DeckError::IncompleteDeck {
                filled: 7,
                empty_positions: vec![7]
            })
        );

        deck.slots.place_card(7, FIREBALL, &catalog).unwrap();
        assert!(validator.is_save_eligible(&deck));
    }

    #[test]
    fn duplicate_cards_are_reported_with_both_positions() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut ids = FULL_DECK.map(Some);
        ids[6] = Some(KNIGHT);
        let deck = Deck::with_slots("Dupes", DeckSlots::from_card_ids(ids));
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::DuplicateCard {
                card_id: KNIGHT,
                positions: vec![0, 6]
            })
        );
    }

    #[test]
    fn too_many_evolutions_fail_before_capability_check() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        // Giant at 3 cannot evolve, but the count check comes first
        let deck = flagged(&full_deck(), &[0, 1, 3]);
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::EvolutionLimitExceeded {
                limit: 2,
                positions: vec![0, 1, 3]
            })
        );
    }

    #[test]
    fn evolution_capability_comes_from_catalog() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let deck = flagged(&full_deck(), &[4]);
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::NotEvolutionCapable {
                position: 4,
                card_id: PEKKA
            })
        );

        // the same deck passes once the catalog marks P.E.K.K.A as evolvable
        let updated = CatalogSnapshot::from_cards(catalog.cards().cloned().map(|mut card| {
            if card.id == PEKKA {
                card.can_evolve = true;
            }
            card
        }));
        let validator = DeckValidator::new(&updated, DeckRules::default());
        assert_eq!(validator.validate_for_save(&deck), Ok(()));
    }

    #[test]
    fn evolution_flag_on_empty_slot_is_rejected() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let slots: Vec<DeckSlot> = (0..8)
            .map(|position| DeckSlot {
                position,
                card_id: None,
                is_evolution: position == 5,
            })
            .collect();
        let deck = Deck::with_slots("Ghost", DeckSlots::try_from(slots).unwrap());
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::EmptySlot { position: 5 })
        );
    }

    #[test]
    fn unknown_card_fails_validation() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut ids = FULL_DECK.map(Some);
        ids[2] = Some(12345);
        let deck = Deck::with_slots("Unknown", DeckSlots::from_card_ids(ids));
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::CardNotFound {
                card_id: 12345,
                position: Some(2)
            })
        );
    }

    #[test]
    fn out_of_range_average_is_rejected() {
        let broken = Card {
            id: 26_999_999,
            name: "Broken".to_string(),
            elixir_cost: 40,
            rarity: Rarity::Legendary,
            card_type: CardType::Troop,
            arena: None,
            image_url: String::new(),
            image_url_evo: None,
            can_evolve: false,
        };
        let catalog = CatalogSnapshot::from_cards([broken]);
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut ids = [None; 8];
        ids[0] = Some(26_999_999);
        let deck = Deck::with_slots("Broken", DeckSlots::from_card_ids(ids));
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::InvalidAverageElixir { value: 40.0 })
        );
    }

    #[test]
    fn name_length_is_checked() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut deck = full_deck();
        deck.name = "   ".to_string();
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::InvalidName { length: 0 })
        );
        deck.name = "x".repeat(256);
        assert_eq!(
            validator.validate_for_save(&deck),
            Err(DeckError::InvalidName { length: 256 })
        );
        deck.name = "x".repeat(255);
        assert_eq!(validator.validate_for_save(&deck), Ok(()));
    }

    #[test]
    fn analysis_reports_first_violation() {
        let catalog = catalog();
        let validator = DeckValidator::new(&catalog, DeckRules::default());
        let mut deck = full_deck();
        deck.slots.remove_card(4).unwrap();
        let analysis = validator.analyze(&deck);
        assert_eq!(analysis.filled_count, 7);
        assert_eq!(analysis.evolution_count, 0);
        assert!(!analysis.save_eligible);
        assert!(matches!(
            analysis.violation,
            Some(DeckError::IncompleteDeck { filled: 7, .. })
        ));
        assert_eq!(analysis.violated_invariant, None);
        // 26 / 7 = 3.714..
        assert_eq!(analysis.average_elixir, 3.71);

        let over_limit = flagged(&full_deck(), &[0, 1, 2]);
        let analysis = validator.analyze(&over_limit);
        assert!(matches!(
            analysis.violation,
            Some(DeckError::EvolutionLimitExceeded { .. })
        ));
        assert_eq!(analysis.violated_invariant, Some(2));
    }
}
