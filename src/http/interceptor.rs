//! Session cookie interception around each API call
//!
//! [`before_request`] moves the credential for a call into the client's
//! cookie jar, and [`after_response`] reads the session cookie from the
//! response's own `Set-Cookie` headers, deciding which token slot it belongs
//! to.

use chrono::{DateTime, Utc};
use log::debug;
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
use url::Url;

use crate::error::{Result, TonicPowError};
use crate::session::{Session, TokenSlot, API_COOKIE_NAME, DELETE_SENTINEL};

/// Client-side marker telling the interceptors a call acts as a user
pub const USER_SESSION_HEADER: &str = "x-user-session-token";

/// Value the marker header is rewritten to before transmission
pub const MARKER_SET: &str = "set";

/// The credential placed in the jar for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub slot: TokenSlot,
    pub token: String,
}

/// Attach the call's credential as a session cookie.
///
/// A marker header carrying a user token wins over the stored API token.
/// The marker value is replaced by [`MARKER_SET`] so the raw token only
/// travels as a cookie. With no credential at all the jar's session cookie
/// is expired so nothing stale is sent.
pub fn before_request(
    session: &Session,
    jar: &Jar,
    url: &Url,
    headers: &mut HeaderMap,
) -> Result<Option<Credential>> {
    if let Some(marker) = headers.get(USER_SESSION_HEADER) {
        let token = marker
            .to_str()
            .map_err(|e| TonicPowError::InvalidHeader(format!("{}: {}", USER_SESSION_HEADER, e)))?
            .to_string();
        jar.add_cookie_str(&session_cookie(&token, session.max_age()), url);
        headers.insert(USER_SESSION_HEADER, HeaderValue::from_static(MARKER_SET));
        debug!("{}: {} (user session cookie attached)", USER_SESSION_HEADER, MARKER_SET);
        return Ok(Some(Credential {
            slot: TokenSlot::User,
            token,
        }));
    }

    if let Some(token) = session.api_token() {
        jar.add_cookie_str(&session_cookie(token, session.max_age()), url);
        debug!("api session cookie attached");
        return Ok(Some(Credential {
            slot: TokenSlot::Api,
            token: token.to_string(),
        }));
    }

    expire_session_cookie(jar, url, "/");
    Ok(None)
}

/// Session cookie announced by a response's `Set-Cookie` headers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCookie {
    Issued { token: String, path: Option<String> },
    /// Empty value, `Max-Age<=0` or an `Expires` in the past
    Dropped { path: Option<String> },
}

impl ResponseCookie {
    pub fn path(&self) -> Option<&str> {
        match self {
            ResponseCookie::Issued { path, .. } | ResponseCookie::Dropped { path } => {
                path.as_deref()
            }
        }
    }
}

/// The last session cookie set by a response, if any.
pub fn response_session_cookie(headers: &HeaderMap, now: DateTime<Utc>) -> Option<ResponseCookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|raw| parse_set_cookie(raw, now))
        .last()
}

fn parse_set_cookie(raw: &str, now: DateTime<Utc>) -> Option<ResponseCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    if name.trim() != API_COOKIE_NAME {
        return None;
    }
    let value = value.trim();
    let token = urlencoding::decode(value)
        .map(|decoded| decoded.trim().to_string())
        .unwrap_or_else(|_| value.to_string());

    let mut path = None;
    let mut max_age = None;
    let mut expires = None;
    for attr in parts {
        let (key, val) = attr.split_once('=').unwrap_or((attr, ""));
        let val = val.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "path" if val.starts_with('/') => path = Some(val.to_string()),
            "max-age" => max_age = val.parse::<i64>().ok(),
            "expires" => {
                expires = DateTime::parse_from_rfc2822(val)
                    .ok()
                    .map(|at| at.with_timezone(&Utc))
            }
            _ => {}
        }
    }

    // Max-Age wins over Expires
    let expired = match (max_age, expires) {
        (Some(seconds), _) => seconds <= 0,
        (None, Some(at)) => at <= now,
        (None, None) => false,
    };
    if expired || token.is_empty() {
        Some(ResponseCookie::Dropped { path })
    } else {
        Some(ResponseCookie::Issued { token, path })
    }
}

/// Route the response's session cookie and keep a single session cookie in
/// the jar.
///
/// The jar only ever carries the session cookie at `Path=/`. A cookie the
/// server stored under another path is expired again, and a dropped session
/// also expires the `Path=/` cookie.
pub fn after_response(
    jar: &Jar,
    url: &Url,
    headers: &HeaderMap,
    sent: Option<&Credential>,
    intent: TokenSlot,
) -> Option<(TokenSlot, String)> {
    let cookie = response_session_cookie(headers, Utc::now());
    if let Some(cookie) = &cookie {
        let path = cookie
            .path()
            .map(str::to_string)
            .unwrap_or_else(|| default_cookie_path(url));
        if path != "/" {
            expire_session_cookie(jar, url, &path);
        }
        if matches!(cookie, ResponseCookie::Dropped { .. }) {
            expire_session_cookie(jar, url, "/");
        }
    }
    route_session_cookie(cookie.as_ref(), sent, intent)
}

/// Decide which slot a response session cookie belongs to.
///
/// Returns the slot and raw value to apply, or `None` when the response did
/// not change any session. A cookie identical to a credential sent from the
/// other slot means the server issued nothing new. A dropped cookie after a
/// credential was sent means the server ended that session. Without any
/// session cookie the credential sent for the intent slot stays in force.
pub fn route_session_cookie(
    cookie: Option<&ResponseCookie>,
    sent: Option<&Credential>,
    intent: TokenSlot,
) -> Option<(TokenSlot, String)> {
    match (cookie, sent) {
        (Some(ResponseCookie::Issued { token, .. }), Some(sent))
            if *token == sent.token && sent.slot != intent =>
        {
            None
        }
        (Some(ResponseCookie::Issued { token, .. }), _) => Some((intent, token.clone())),
        (Some(ResponseCookie::Dropped { .. }), Some(sent)) => {
            Some((sent.slot, DELETE_SENTINEL.to_string()))
        }
        (Some(ResponseCookie::Dropped { .. }), None) => None,
        (None, Some(sent)) if sent.slot == intent => Some((intent, sent.token.clone())),
        (None, _) => None,
    }
}

/// RFC 6265 default path: the request path up to its last `/`
fn default_cookie_path(url: &Url) -> String {
    match url.path().rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => url.path()[..index].to_string(),
    }
}

fn expire_session_cookie(jar: &Jar, url: &Url, path: &str) {
    jar.add_cookie_str(
        &format!("{}=; Max-Age=0; Path={}", API_COOKIE_NAME, path),
        url,
    );
}

fn session_cookie(token: &str, max_age: u64) -> String {
    // Max-Age=0 would expire the cookie before it is sent
    if max_age == 0 {
        return format!("{}={}; Path=/; HttpOnly", API_COOKIE_NAME, token);
    }
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly",
        API_COOKIE_NAME, token, max_age
    )
}
