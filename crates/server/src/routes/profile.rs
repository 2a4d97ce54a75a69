use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use services::services::user::{Profile, ProfileUpdate};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    middleware::{auth::AuthUser, json::ValidatedJson},
};

/// GET /api/profile
pub async fn get_profile(AuthUser(user): AuthUser) -> ResponseJson<ApiResponse<Profile>> {
    ResponseJson(ApiResponse::success(user.into()))
}

/// PUT /api/profile
/// Update display name and/or avatar card
pub async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ProfileUpdate>,
) -> Result<ResponseJson<ApiResponse<Profile>>, ApiError> {
    let updated = state.users().update_profile(user.id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated.into())))
}

pub fn router(_state: &AppState) -> Router<AppState> {
    Router::new().route("/profile", get(get_profile).put(update_profile))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::test_support::*;

    #[tokio::test]
    async fn update_profile_validates_input() {
        let (app, _) = test_app().await;
        let token = sign_in(&app, "g-lee").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/api/profile",
            Some(&token),
            Some(json!({ "name": "  Lee 2 ", "avatar": "26000000" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["data"]["name"], "Lee 2");
        assert_eq!(body["data"]["avatar"], "26000000");

        let (status, _) = send(
            &app,
            "PUT",
            "/api/profile",
            Some(&token),
            Some(json!({ "name": "Lee!" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "PUT", "/api/profile", Some(&token), Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, "GET", "/api/profile", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Lee 2");
    }
}
