use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::AppState;

pub mod auth;
pub mod cards;
pub mod deck_builder;
pub mod decks;
pub mod health;
pub mod profile;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .inspect_err(|_| warn!(%origin, "Ignoring invalid CORS origin"))
                .ok()
        })
        .collect();
    layer.allow_origin(origins).allow_credentials(true)
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let api_routes = Router::new()
        .merge(health::router(&state))
        .merge(cards::router(&state))
        .merge(auth::router(&state))
        .merge(profile::router(&state))
        .merge(decks::router(&state))
        .merge(deck_builder::router(&state));

    Router::new()
        .nest("/api", api_routes)
        .layer(cors_layer(cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
