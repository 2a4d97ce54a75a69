use axum::{
    Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use services::services::{
    auth::{AccessToken, TokenPair},
    onboarding::{OnboardingResult, OnboardingStatus, onboarding_status},
    user::Profile,
};
use tracing::info;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    middleware::{auth::AuthUser, json::ValidatedJson},
};

#[derive(Debug, Deserialize, TS)]
pub struct GoogleAuthRequest {
    pub id_token: String,
    /// Decks built before signing in, in the saved-deck payload shape.
    #[serde(default)]
    #[ts(type = "Array<unknown>")]
    pub migration_decks: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, TS)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub tokens: TokenPair,
    pub user: Profile,
    pub onboarding: OnboardingResult,
}

#[derive(Debug, Deserialize, TS)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/auth/google
/// Sign in with a Google ID token
pub async fn google_sign_in(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<GoogleAuthRequest>,
) -> Result<ResponseJson<ApiResponse<AuthResponse>>, ApiError> {
    let identity = state.auth().verify_google_token(&payload.id_token).await?;
    let user = state
        .users()
        .create_or_update(&identity.google_id, &identity.email, &identity.name)
        .await?;
    let tokens = state.auth().issue_tokens(&user)?;
    let onboarding = state
        .onboarding()
        .handle_sign_in(&user, payload.migration_decks)
        .await;

    info!(user_id = %user.id, "User signed in");
    Ok(ResponseJson(ApiResponse::success(AuthResponse {
        tokens,
        user: user.into(),
        onboarding,
    })))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RefreshRequest>,
) -> Result<ResponseJson<ApiResponse<AccessToken>>, ApiError> {
    let token = state
        .auth()
        .refresh_access_token(&payload.refresh_token)
        .await?;
    Ok(ResponseJson(ApiResponse::success(token)))
}

/// POST /api/auth/logout
/// Tokens are stateless; the client discards them.
pub async fn logout(AuthUser(user): AuthUser) -> ResponseJson<ApiResponse<()>> {
    info!(user_id = %user.id, "User logged out");
    ResponseJson(ApiResponse::success_with_message((), "Successfully logged out"))
}

/// GET /api/auth/me
pub async fn me(AuthUser(user): AuthUser) -> ResponseJson<ApiResponse<Profile>> {
    ResponseJson(ApiResponse::success(user.into()))
}

/// GET /api/auth/onboarding
pub async fn onboarding(AuthUser(user): AuthUser) -> ResponseJson<ApiResponse<OnboardingStatus>> {
    ResponseJson(ApiResponse::success(onboarding_status(&user)))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/google", post(google_sign_in))
            .route("/refresh", post(refresh))
            .route("/logout", post(logout))
            .route("/me", get(me))
            .route("/onboarding", get(onboarding)),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support::*;

    #[tokio::test]
    async fn sign_in_issues_tokens_and_onboarding() {
        let (app, _) = test_app().await;
        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/google",
            None,
            Some(json!({
                "id_token": "valid:g-1:jo@example.com:Jo",
                "migration_decks": [deck_body("Imported", FULL_DECK.map(Some), &[0])],
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let data = &body["data"];
        assert_eq!(data["token_type"], "bearer");
        assert_eq!(data["expires_in"], 1800);
        assert_eq!(data["user"]["email"], "jo@example.com");
        assert_eq!(data["onboarding"]["is_new_user"], true);
        assert_eq!(data["onboarding"]["steps"][0]["id"], "welcome");
        assert_eq!(data["onboarding"]["migration"]["migrated_count"], 1);

        let access = data["access_token"].as_str().unwrap();
        let (status, body) = send(&app, "GET", "/api/decks", Some(access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_google_token_is_unauthorized() {
        let (app, _) = test_app().await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/auth/google",
            None,
            Some(json!({ "id_token": "forged" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_and_me() {
        let (app, _) = test_app().await;
        let (_, body) = send(
            &app,
            "POST",
            "/api/auth/google",
            None,
            Some(json!({ "id_token": "valid:g-2:kai@example.com:Kai" })),
        )
        .await;
        let refresh_token = body["data"]["refresh_token"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            "/api/auth/refresh",
            None,
            Some(json!({ "refresh_token": refresh_token })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let access = body["data"]["access_token"].as_str().unwrap().to_string();

        let (status, body) = send(&app, "GET", "/api/auth/me", Some(&access), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Kai");

        // a refresh token is not accepted as an access token
        let (status, _) = send(&app, "GET", "/api/auth/me", Some(&refresh_token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn protected_routes_require_bearer_token() {
        let (app, _) = test_app().await;
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/auth/onboarding")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );

        let token = sign_in(&app, "g-3").await;
        let (status, body) = send(&app, "POST", "/api/auth/logout", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully logged out");
    }
}
