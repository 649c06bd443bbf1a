//! API request description

use reqwest::Method;
use serde_json::Value;

use crate::session::TokenSlot;

/// One call against the API, relative to `{api_url}v1`
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Resource path including any query string, e.g. `/campaigns/list`
    pub path: String,
    pub body: Option<Value>,
    /// Act as this user; a bare token or a cookie header
    pub session_token: Option<String>,
    intent: Option<TokenSlot>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            session_token: None,
            intent: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Send the call on behalf of a user. Empty tokens are ignored.
    pub fn with_session_token(mut self, token: Option<&str>) -> Self {
        self.session_token = token
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        self
    }

    /// Route any session cookie in the response to `slot`
    pub fn with_intent(mut self, slot: TokenSlot) -> Self {
        self.intent = Some(slot);
        self
    }

    /// The slot a response session cookie is routed to: explicit intent,
    /// else the user slot when acting as a user, else the API slot.
    pub fn intent(&self) -> TokenSlot {
        match (self.intent, &self.session_token) {
            (Some(slot), _) => slot,
            (None, Some(_)) => TokenSlot::User,
            (None, None) => TokenSlot::Api,
        }
    }
}
