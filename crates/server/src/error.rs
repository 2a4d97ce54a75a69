use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use deck::DeckError;
use services::services::{
    auth::AuthError, card::CardServiceError, database_validator::DatabaseValidationError,
    deck::DeckServiceError, user::UserServiceError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Deck(#[from] DeckServiceError),
    #[error(transparent)]
    Validation(#[from] DeckError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    User(#[from] UserServiceError),
    #[error(transparent)]
    Card(#[from] CardServiceError),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    JsonBody(#[from] JsonRejection),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Deck(DeckServiceError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::JsonBody(rejection) => rejection.status(),
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Deck(DeckServiceError::NotFound) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Deck(DeckServiceError::LimitExceeded { .. }) => StatusCode::CONFLICT,
            ApiError::Auth(AuthError::GoogleUnavailable(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(AuthError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Auth(_) | ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::User(UserServiceError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::User(UserServiceError::InvalidProfile(_)) => StatusCode::BAD_REQUEST,
            ApiError::Deck(_)
            | ApiError::User(_)
            | ApiError::Card(_)
            | ApiError::DatabaseValidation(_)
            | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn deck_error(&self) -> Option<&DeckError> {
        match self {
            ApiError::Validation(err) | ApiError::Deck(DeckServiceError::Validation(err)) => {
                Some(err)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
            match status {
                StatusCode::BAD_GATEWAY => "Upstream service unavailable".to_string(),
                _ => "Internal server error".to_string(),
            }
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
            self.to_string()
        };

        let mut response = match self.deck_error() {
            Some(err) => (
                status,
                Json(ApiResponse::<(), DeckError>::error_with_data(
                    err.clone(),
                    &message,
                )),
            )
                .into_response(),
            None => (status, Json(ApiResponse::<()>::error(&message))).into_response(),
        };

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    #[tokio::test]
    async fn validation_error_carries_deck_error() {
        let err = ApiError::from(DeckServiceError::Validation(DeckError::EvolutionLimitExceeded {
            limit: 2,
            positions: vec![0, 1, 2],
        }));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_data"]["kind"], "evolution_limit_exceeded");
        assert_eq!(json["error_data"]["positions"], serde_json::json!([0, 1, 2]));
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::from(DeckServiceError::LimitExceeded { limit: 20 }).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(DeckServiceError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(UserServiceError::InvalidProfile("bad".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(AuthError::GoogleUnavailable("down".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::from(AuthError::UserNotFound).status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[tokio::test]
    async fn server_errors_hide_details() {
        let response = ApiError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Internal server error");
    }
}
