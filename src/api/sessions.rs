//! API session endpoints (`/auth/session`)

use log::info;
use serde_json::{json, Value};

use super::TonicPow;
use crate::error::{Result, TonicPowError};
use crate::http::ApiRequest;
use crate::session::{extract_session_token_from_header, TokenSlot};

impl TonicPow {
    /// Make sure an API session exists, reusing a stored token if there is one.
    pub async fn auth(&mut self) -> Result<String> {
        if let Some(token) = self.session.api_token() {
            info!("{} api loaded with existing session", self.config.environment());
            return Ok(token.to_string());
        }
        self.create_session().await
    }

    /// Create a new API session; returns the API token.
    pub async fn create_session(&mut self) -> Result<String> {
        let body = json!({ "api_key": self.config.api_key() });
        let request = ApiRequest::post("/auth/session", body).with_intent(TokenSlot::Api);
        let response = self.request_raw(request).await?;

        let token = response
            .token_change
            .as_ref()
            .filter(|change| change.slot == TokenSlot::Api)
            .and_then(|change| change.token())
            .ok_or(TonicPowError::MissingSessionCookie)?;
        info!("{} api session created", self.config.environment());
        Ok(token.to_string())
    }

    /// Prolong the API session, or the given session token (bare or as a cookie header).
    pub async fn prolong_session(&mut self, session_token: Option<&str>) -> Result<Value> {
        let token = session_token
            .map(|raw| extract_session_token_from_header(raw, self.session.cookie_name()));
        self.request(ApiRequest::get("/auth/session").with_session_token(token.as_deref()))
            .await
    }

    /// End the API session. A given token replaces the stored API token first.
    pub async fn end_session(&mut self, session_token: Option<&str>) -> Result<Value> {
        if let Some(raw) = session_token {
            self.session.set_api_token(raw);
        }
        let request = ApiRequest::delete("/auth/session").with_intent(TokenSlot::Api);
        let body = self.request(request).await?;
        self.session.clear_token(TokenSlot::Api);
        info!("api session ended");
        Ok(body)
    }
}
