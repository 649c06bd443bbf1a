//! HTTP dispatch module
//!
//! This module performs single API calls, moving session tokens in and out of
//! a per-client cookie jar around each one.

use std::sync::Arc;

use crate::config::{ClientOptions, Config};
use crate::error::{Result, TonicPowError};
use crate::session::{parse_token, Session, TokenUpdate};
use crate::utils::UrlUtils;
use log::{debug, warn};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder};
use url::Url;

pub mod interceptor;
pub mod request;
pub mod response;

pub use interceptor::{ResponseCookie, MARKER_SET, USER_SESSION_HEADER};
pub use request::ApiRequest;
pub use response::{ApiResponse, TokenChange};

/// HTTP client bound to one cookie jar
///
/// Requests go to the API URL of the [`Config`] passed to each call, unless
/// the client was built with an explicit base URL.
pub struct HttpClient {
    client: Client,
    jar: Arc<Jar>,
    base_url: Option<Url>,
}

impl HttpClient {
    /// Create a client that follows the environment of each call's config
    pub fn new(options: &ClientOptions) -> Result<Self> {
        Self::build(None, options)
    }

    /// Create a client that sends requests to `base_url`, e.g. a mock server
    pub fn with_base_url(base_url: &str, options: &ClientOptions) -> Result<Self> {
        Self::build(Some(UrlUtils::validate_base_url(base_url)?), options)
    }

    fn build(base_url: Option<Url>, options: &ClientOptions) -> Result<Self> {
        let jar = Arc::new(Jar::default());

        let mut builder = ClientBuilder::new().cookie_provider(Arc::clone(&jar));
        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TonicPowError::Http)?;

        Ok(Self {
            client,
            jar,
            base_url,
        })
    }

    /// The base URL requests for `config` are sent to
    pub fn base_url(&self, config: &Config) -> Result<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => UrlUtils::validate_base_url(config.api_url()),
        }
    }

    /// Execute one API call, updating `session` from its session cookie.
    ///
    /// An override token on the request must parse to a token; it is stored
    /// as the session's user token and carried to the request interceptor in
    /// the marker header. Non-2xx responses come back as
    /// [`TonicPowError::Api`] and leave the session tokens untouched.
    pub async fn send(
        &self,
        config: &Config,
        session: &mut Session,
        request: ApiRequest,
    ) -> Result<ApiResponse> {
        let url = UrlUtils::api_endpoint(&self.base_url(config)?, &request.path)?;
        let intent = request.intent();

        let mut headers = HeaderMap::new();
        if let Some(custom) = session.custom_headers() {
            for (name, value) in custom {
                headers.insert(header_name(name)?, header_value(name, value)?);
            }
        }
        if let Some(raw) = request.session_token.as_deref() {
            let TokenUpdate::Set(token) = parse_token(raw, session.cookie_name()) else {
                return Err(TonicPowError::MissingUserSession);
            };
            session.set_user_token(raw);
            headers.insert(USER_SESSION_HEADER, header_value(USER_SESSION_HEADER, &token)?);
        }

        let sent = interceptor::before_request(session, &self.jar, &url, &mut headers)?;

        debug!("{} {}", request.method, url.path());
        let mut builder = self
            .client
            .request(request.method.clone(), url.clone())
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let response = builder.send().await.map_err(TonicPowError::Http)?;
        session.clear_custom_headers();

        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await.map_err(TonicPowError::Http)?;
        if let Err(err) = response::check_status(status, &text) {
            warn!("{} {} failed with {}", request.method, url.path(), status);
            return Err(err);
        }

        let routed = interceptor::after_response(&self.jar, &url, &headers, sent.as_ref(), intent);
        let token_change = routed.map(|(slot, raw)| TokenChange {
            slot,
            update: session.set_token(slot, &raw),
        });

        Ok(ApiResponse {
            status,
            headers,
            body: response::parse_body(&text),
            token_change,
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .finish()
    }
}

fn header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| TonicPowError::InvalidHeader(format!("{}: {}", name, e)))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| TonicPowError::InvalidHeader(format!("{}: {}", name, e)))
}
