//! Error types for collaborator calls and editor actions.

use crate::interaction::Mode;
use fp_core::id::StandId;
use serde_json::Value;

/// A failed call into the booking backend collaborator.
///
/// `payload` holds the JSON error body when the backend sent one; its
/// `message`/`error` field is what the user sees.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Raw failure text (network error, status line, exception message).
    pub message: String,
    pub status: Option<u16>,
    pub payload: Option<Value>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            payload: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// The backend's own message if the payload carries one, else the raw
    /// failure text.
    pub fn user_message(&self) -> String {
        self.payload
            .as_ref()
            .and_then(payload_message)
            .unwrap_or_else(|| self.message.clone())
    }
}

fn payload_message(payload: &Value) -> Option<String> {
    let direct = |v: &Value| {
        ["message", "error"]
            .iter()
            .find_map(|key| v.get(key).and_then(Value::as_str))
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
    };
    if let Some(s) = payload.as_str().filter(|s| !s.trim().is_empty()) {
        return Some(s.to_string());
    }
    direct(payload).or_else(|| {
        ["data", "response"]
            .iter()
            .filter_map(|key| payload.get(key))
            .find_map(|nested| direct(nested).or_else(|| nested.get("data").and_then(direct)))
    })
}

/// Why an editor action did not go through.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GatewayError {
    /// Bad form input, caught before any network call.
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    /// The stand only exists locally; the host has not refreshed yet.
    #[error("stand {0} is still being saved, try again once the map refreshes")]
    NotReady(StandId),

    /// Approve/reject could not find a pending booking for the stand.
    #[error("no pending booking found for stand {0}; the view may be out of date, refresh and try again")]
    NoBookingForStand(StandId),

    #[error("stand {0} is not available for booking")]
    NotBookable(StandId),

    #[error("a request for stand {0} is already in progress")]
    AlreadyRequested(StandId),

    #[error("stand {0} is not on this map")]
    UnknownStand(StandId),

    #[error("the stand is already being saved")]
    SubmitInFlight,

    #[error("click the map to place the stand first")]
    NoPlacement,

    #[error("no hall map is loaded")]
    NoHallMap,

    #[error("no exhibition selected")]
    NoExhibition,

    #[error("not available in {0} mode")]
    WrongMode(Mode),

    /// The collaborator call failed.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// The editor was torn down before the response arrived.
    #[error("the map was closed before the request finished")]
    Detached,
}

impl GatewayError {
    /// Form field the error points at, if any.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The human-readable message shown at the point of action.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_message_wins_over_raw_text() {
        let err = ApiError::new("Request failed with status code 409")
            .with_status(409)
            .with_payload(json!({ "message": "Stand number already exists" }));
        assert_eq!(err.user_message(), "Stand number already exists");
        assert_eq!(GatewayError::from(err).user_message(), "Stand number already exists");
    }

    #[test]
    fn nested_response_data_is_found() {
        let err = ApiError::new("Network Error")
            .with_payload(json!({ "response": { "data": { "error": "Stand is booked" } } }));
        assert_eq!(err.user_message(), "Stand is booked");
    }

    #[test]
    fn raw_text_without_payload() {
        let err = ApiError::new("Failed to fetch").with_payload(json!({ "code": 7 }));
        assert_eq!(err.user_message(), "Failed to fetch");
    }

    #[test]
    fn validation_points_at_field() {
        let err = GatewayError::Validation {
            field: "standNumber",
            message: "Stand number is required".into(),
        };
        assert_eq!(err.field(), Some("standNumber"));
        assert_eq!(err.user_message(), "Stand number is required");
    }
}
