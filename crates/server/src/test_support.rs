use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use db::DBService;
use deck::catalog::fixtures;
use serde_json::{Value, json};
use services::services::{
    auth::{AuthError, GoogleIdentity, GoogleTokenVerifier},
    card_ingest::CardIngestor,
};
use tower::ServiceExt;

use crate::{AppState, config::AppConfig, routes};

pub use deck::catalog::fixtures::FULL_DECK;

/// Accepts `valid:<google_id>:<email>:<name>`.
pub struct FakeGoogleVerifier;

#[async_trait]
impl GoogleTokenVerifier for FakeGoogleVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleIdentity, AuthError> {
        match id_token.split(':').collect::<Vec<_>>().as_slice() {
            ["valid", google_id, email, name] => Ok(GoogleIdentity {
                google_id: google_id.to_string(),
                email: email.to_string(),
                name: name.to_string(),
                picture: None,
            }),
            _ => Err(AuthError::InvalidGoogleToken("rejected".to_string())),
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "JWT_SECRET" => Some("router-test-secret-0123456789abcdef".to_string()),
        "GOOGLE_CLIENT_ID" => Some("test-client".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn api_card(id: i64, name: &str, cost: u8, rarity: &str, evolves: bool) -> Value {
    let mut icons = json!({ "medium": format!("https://cards.test/{id}.png") });
    if evolves {
        icons["evolutionMedium"] = json!(format!("https://cards.test/{id}-evo.png"));
    }
    json!({
        "id": id,
        "name": name,
        "elixirCost": cost,
        "rarity": rarity,
        "iconUrls": icons,
    })
}

pub async fn test_app() -> (Router, AppState) {
    let db = DBService::new_in_memory().await.unwrap();
    let items: Vec<Value> = fixtures::cards()
        .iter()
        .map(|card| {
            let rarity = card.rarity.to_string().to_lowercase();
            api_card(card.id, &card.name, card.elixir_cost, &rarity, card.can_evolve)
        })
        .collect();
    CardIngestor::new(db.pool.clone())
        .ingest(&items)
        .await
        .unwrap();

    let config = test_config();
    let state = AppState::new(&config, db, Arc::new(FakeGoogleVerifier));
    (routes::router(state.clone(), &config.cors_origins), state)
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Signs in through the API and returns the access token.
pub async fn sign_in(app: &Router, google_id: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/auth/google",
        None,
        Some(json!({ "id_token": format!("valid:{google_id}:{google_id}@example.com:Player") })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

pub fn deck_body(name: &str, ids: [Option<i64>; 8], evolutions: &[usize]) -> Value {
    let slots: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(position, card_id)| {
            json!({
                "position": position,
                "card_id": card_id,
                "is_evolution": evolutions.contains(&position),
            })
        })
        .collect();
    json!({ "name": name, "slots": slots })
}
