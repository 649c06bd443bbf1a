//! API response handling

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ApiError, Result};
use crate::session::{TokenSlot, TokenUpdate};

/// Token routing applied to the session after a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenChange {
    pub slot: TokenSlot,
    pub update: TokenUpdate,
}

impl TokenChange {
    /// The token now stored in `slot`, if this change set one
    pub fn token(&self) -> Option<&str> {
        match &self.update {
            TokenUpdate::Set(token) => Some(token),
            _ => None,
        }
    }
}

/// A successful response, with the token change it caused
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub token_change: Option<TokenChange>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

/// Decode a response body: JSON when possible, the raw text otherwise,
/// `Null` when empty.
pub(crate) fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Map a non-2xx response to an error carrying the server's body
pub(crate) fn check_status(status: StatusCode, text: &str) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(ApiError::from_body(status, text).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TonicPowError;
    use serde_json::json;

    #[test]
    fn parse_body_variants() {
        assert_eq!(parse_body(""), Value::Null);
        assert_eq!(parse_body("{\"id\":1}"), json!({"id": 1}));
        assert_eq!(parse_body("ok"), Value::String("ok".to_string()));
    }

    #[test]
    fn check_status_maps_errors() {
        assert!(check_status(StatusCode::CREATED, "").is_ok());
        let err = check_status(StatusCode::UNAUTHORIZED, "{\"message\":\"denied\"}")
            .expect_err("401");
        match err {
            TonicPowError::Api(api) => {
                assert_eq!(api.status, StatusCode::UNAUTHORIZED);
                assert_eq!(api.body, json!({"message": "denied"}));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
