use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Card identifiers come from the Clash Royale API (e.g. `26000000` for Knight).
pub type CardId = i64;

pub const MAX_ELIXIR_COST: u8 = 10;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Champion,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CardType {
    Troop,
    Spell,
    Building,
}

impl CardType {
    /// Card ids encode their type in the leading digits:
    /// 26xxxxxx troops, 27xxxxxx buildings, 28xxxxxx spells.
    pub fn for_card_id(id: CardId) -> Option<Self> {
        match id {
            26_000_000..=26_999_999 => Some(Self::Troop),
            27_000_000..=27_999_999 => Some(Self::Building),
            28_000_000..=28_999_999 => Some(Self::Spell),
            _ => None,
        }
    }
}

/// Static card attributes as held by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct Card {
    #[ts(type = "number")]
    pub id: CardId,
    pub name: String,
    pub elixir_cost: u8,
    pub rarity: Rarity,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub arena: Option<String>,
    pub image_url: String,
    pub image_url_evo: Option<String>,
    /// Authoritative evolution capability; slots may only be flagged as
    /// evolution slots when this is set.
    pub can_evolve: bool,
}
