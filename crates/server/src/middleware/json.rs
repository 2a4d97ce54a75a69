use axum::{
    Json,
    extract::{FromRequest, Request},
};
use deck::{DeckError, DeckSlot, DeckSlots};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::ApiError;

/// JSON body extractor whose failures go through `ApiError`, so malformed
/// bodies still get the response envelope. A bad `slots` array is reported as
/// the `DeckError` it produces.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state).await?;
        match T::deserialize(&value) {
            Ok(payload) => Ok(ValidatedJson(payload)),
            Err(e) => Err(match slot_error(&value) {
                Some(deck_error) => ApiError::Validation(deck_error),
                None => ApiError::InvalidBody(e.to_string()),
            }),
        }
    }
}

fn slot_error(body: &Value) -> Option<DeckError> {
    let slots = Vec::<DeckSlot>::deserialize(body.get("slots")?).ok()?;
    DeckSlots::try_from(slots).err()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn short_slot_list_reports_slot_count() {
        let slots: Vec<Value> = (0..7)
            .map(|position| json!({ "position": position, "card_id": null }))
            .collect();
        assert_eq!(
            slot_error(&json!({ "name": "Seven", "slots": slots })),
            Some(DeckError::SlotCount { found: 7 })
        );
    }

    #[test]
    fn repeated_position_reports_invalid_position() {
        let mut slots: Vec<Value> = (0..8)
            .map(|position| json!({ "position": position }))
            .collect();
        slots[7] = json!({ "position": 9 });
        assert_eq!(
            slot_error(&json!({ "slots": slots })),
            Some(DeckError::InvalidPosition { position: 9 })
        );
    }

    #[test]
    fn other_shape_errors_are_not_slot_errors() {
        assert_eq!(slot_error(&json!({ "name": 3 })), None);
        assert_eq!(slot_error(&json!({ "slots": "nope" })), None);
    }
}
