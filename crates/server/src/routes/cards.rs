use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use deck::{Card, CardId};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// GET /api/cards
/// Full catalog ordered by card id
pub async fn list_cards(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Card>>>, ApiError> {
    let cards = state.cards().list_cards().await?;
    Ok(ResponseJson(ApiResponse::success(cards)))
}

/// GET /api/cards/{card_id}
pub async fn get_card(
    State(state): State<AppState>,
    Path(card_id): Path<CardId>,
) -> Result<ResponseJson<ApiResponse<Card>>, ApiError> {
    let card = state
        .cards()
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("card {card_id} not found")))?;
    Ok(ResponseJson(ApiResponse::success(card)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/cards", get(list_cards))
        .route("/cards/{card_id}", get(get_card))
}
