//! Error handling for tonicpow

use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Main error type for tonicpow operations
#[derive(Error, Debug)]
pub enum TonicPowError {
    #[error("invalid api key")]
    InvalidApiKey,

    #[error("invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("invalid api url: {0}")]
    InvalidApiUrl(String),

    #[error("user session must be set")]
    MissingUserSession,

    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("no session cookie in response")]
    MissingSessionCookie,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("{0}")]
    Api(ApiError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TonicPowError {
    /// True for errors raised while validating configuration.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            TonicPowError::InvalidApiKey
                | TonicPowError::InvalidEnvironment(_)
                | TonicPowError::InvalidApiUrl(_)
        )
    }

    /// The server's error body, when the failure came back from the API.
    pub fn api_body(&self) -> Option<&Value> {
        match self {
            TonicPowError::Api(err) => Some(&err.body),
            _ => None,
        }
    }
}

impl From<ApiError> for TonicPowError {
    fn from(err: ApiError) -> Self {
        TonicPowError::Api(err)
    }
}

/// A non-2xx response from the API.
///
/// `body` holds the structured error body when the server returned JSON, or
/// the raw text as a JSON string otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiError {
    pub fn from_body(status: StatusCode, text: &str) -> Self {
        let body = serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()));
        Self { status, body }
    }

    /// The `message` field of a structured error body, if any.
    pub fn message(&self) -> Option<&str> {
        match &self.body {
            Value::Object(map) => map.get("message").and_then(Value::as_str),
            Value::String(text) if !text.is_empty() => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.message() {
            Some(message) => write!(f, "API error ({}): {}", self.status, message),
            None => write!(f, "API error ({}): {}", self.status, self.body),
        }
    }
}

/// Result type alias for tonicpow operations
pub type Result<T> = std::result::Result<T, TonicPowError>;
