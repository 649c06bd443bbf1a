//! TonicPow API client
//!
//! [`TonicPow`] owns the configuration, the session and the HTTP client of one
//! identity. Resource endpoints live in the submodules as further `impl`
//! blocks on the same type.

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::config::{ClientOptions, Config};
use crate::error::{Result, TonicPowError};
use crate::http::{ApiRequest, ApiResponse, HttpClient};
use crate::session::{parse_token, Session, TokenUpdate};

mod advertisers;
mod campaigns;
mod conversions;
mod goals;
mod links;
mod rates;
mod sessions;
mod users;
mod visitors;

pub use campaigns::{CampaignSearch, FeedType};
pub use conversions::ConversionOptions;
pub use users::UserLookup;

/// Client for one API identity.
///
/// Calls take `&mut self`: the session is updated from every response, so a
/// client is never shared between concurrent calls. Use one client per
/// concurrent identity.
#[derive(Debug)]
pub struct TonicPow {
    config: Config,
    session: Session,
    http: HttpClient,
}

impl TonicPow {
    /// Create a client; fails on an invalid API key before any network call.
    pub fn new(api_key: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let config = Config::new(api_key, options.environment)?;
        let http = HttpClient::new(&options)?;
        Ok(Self::from_parts(config, Session::from_options(&options), http))
    }

    /// Assemble a client from explicit parts (e.g. an [`HttpClient`] pointed
    /// at a mock server).
    pub fn from_parts(config: Config, session: Session, http: HttpClient) -> Self {
        Self {
            config,
            session,
            http,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Configuration changes (e.g. a new environment) apply to the next call.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Base URL the next call is sent to
    pub fn api_base_url(&self) -> Result<Url> {
        self.http.base_url(&self.config)
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Dispatch a request and return the full response
    pub async fn request_raw(&mut self, request: ApiRequest) -> Result<ApiResponse> {
        self.http.send(&self.config, &mut self.session, request).await
    }

    /// Dispatch a request and return the response body
    pub async fn request(&mut self, request: ApiRequest) -> Result<Value> {
        Ok(self.request_raw(request).await?.into_body())
    }

    pub async fn get(&mut self, path: &str, session_token: Option<&str>) -> Result<Value> {
        self.request(ApiRequest::get(path).with_session_token(session_token))
            .await
    }

    pub async fn get_raw(&mut self, path: &str, session_token: Option<&str>) -> Result<ApiResponse> {
        self.request_raw(ApiRequest::get(path).with_session_token(session_token))
            .await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::post(path, body).with_session_token(session_token))
            .await
    }

    pub async fn put<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &T,
        session_token: Option<&str>,
    ) -> Result<Value> {
        let body = serde_json::to_value(body)?;
        self.request(ApiRequest::put(path, body).with_session_token(session_token))
            .await
    }

    pub async fn put_raw<T: Serialize + ?Sized>(
        &mut self,
        path: &str,
        body: &T,
        session_token: Option<&str>,
    ) -> Result<ApiResponse> {
        let body = serde_json::to_value(body)?;
        self.request_raw(ApiRequest::put(path, body).with_session_token(session_token))
            .await
    }

    pub async fn delete(&mut self, path: &str, session_token: Option<&str>) -> Result<Value> {
        self.request(ApiRequest::delete(path).with_session_token(session_token))
            .await
    }

    /// The explicit token if given, else the stored user token.
    ///
    /// An explicit value must parse to a token; a cookie header without the
    /// session cookie is rejected rather than falling back to another identity.
    fn user_session_token(&self, session_token: Option<&str>) -> Result<String> {
        match session_token.map(str::trim).filter(|raw| !raw.is_empty()) {
            Some(raw) => match parse_token(raw, self.session.cookie_name()) {
                TokenUpdate::Set(token) => Ok(token),
                _ => Err(TonicPowError::MissingUserSession),
            },
            None => self
                .session
                .user_token()
                .map(str::to_string)
                .ok_or(TonicPowError::MissingUserSession),
        }
    }
}
