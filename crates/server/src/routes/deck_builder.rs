//! Stateless editing endpoints for the in-browser deck builder. Nothing here
//! touches saved decks.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::post};
use deck::{Deck, DeckAnalysis, DeckSlot, DeckSlots, DeckValidator, SlotEdit};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::json::ValidatedJson};

fn default_deck_name() -> String {
    "New Deck".to_string()
}

#[derive(Debug, Deserialize, TS)]
pub struct ApplyEditRequest {
    #[ts(as = "Vec<DeckSlot>")]
    pub slots: DeckSlots,
    pub edit: SlotEdit,
}

#[derive(Debug, Serialize, TS)]
pub struct ApplyEditResponse {
    #[ts(as = "Vec<DeckSlot>")]
    pub slots: DeckSlots,
    pub analysis: DeckAnalysis,
}

#[derive(Debug, Deserialize, TS)]
pub struct AnalyzeRequest {
    #[serde(default = "default_deck_name")]
    pub name: String,
    #[ts(as = "Vec<DeckSlot>")]
    pub slots: DeckSlots,
}

/// POST /api/deck-builder/apply
/// Apply one place/remove/toggle edit to a draft deck
pub async fn apply_edit(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ApplyEditRequest>,
) -> Result<ResponseJson<ApiResponse<ApplyEditResponse>>, ApiError> {
    let catalog = state.cards().snapshot().await?;
    let rules = state.deck_rules();
    let mut slots = payload.slots;
    slots.apply(payload.edit, &*catalog, &rules)?;

    let analysis =
        DeckValidator::new(&*catalog, rules).analyze(&Deck::with_slots(default_deck_name(), slots.clone()));
    Ok(ResponseJson(ApiResponse::success(ApplyEditResponse {
        slots,
        analysis,
    })))
}

/// POST /api/deck-builder/analyze
/// Average elixir, counts and the first rule a draft breaks
pub async fn analyze(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<AnalyzeRequest>,
) -> Result<ResponseJson<ApiResponse<DeckAnalysis>>, ApiError> {
    let catalog = state.cards().snapshot().await?;
    let deck = Deck::with_slots(payload.name, payload.slots);
    let analysis = DeckValidator::new(&*catalog, state.deck_rules()).analyze(&deck);
    Ok(ResponseJson(ApiResponse::success(analysis)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/deck-builder",
        Router::new()
            .route("/apply", post(apply_edit))
            .route("/analyze", post(analyze)),
    )
}
