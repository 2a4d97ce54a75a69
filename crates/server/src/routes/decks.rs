use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use services::services::deck::{DeckPayload, DeckView};
use uuid::Uuid;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    middleware::{auth::AuthUser, json::ValidatedJson},
};

/// GET /api/decks
/// The caller's decks, newest first
pub async fn list_decks(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<DeckView>>>, ApiError> {
    let decks = state.decks().list(user.id).await?;
    Ok(ResponseJson(ApiResponse::success(decks)))
}

/// POST /api/decks
pub async fn create_deck(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<DeckPayload>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<DeckView>>), ApiError> {
    let deck = state.decks().create(user.id, payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(deck))))
}

/// GET /api/decks/{deck_id}
pub async fn get_deck(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<DeckView>>, ApiError> {
    let deck = state.decks().get(user.id, deck_id).await?;
    Ok(ResponseJson(ApiResponse::success(deck)))
}

/// PUT /api/decks/{deck_id}
pub async fn update_deck(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DeckPayload>,
) -> Result<ResponseJson<ApiResponse<DeckView>>, ApiError> {
    let deck = state.decks().update(user.id, deck_id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(deck)))
}

/// DELETE /api/decks/{deck_id}
pub async fn delete_deck(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(deck_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.decks().delete(user.id, deck_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/decks", get(list_decks).post(create_deck))
        .route(
            "/decks/{deck_id}",
            get(get_deck).put(update_deck).delete(delete_deck),
        )
}
