//! Session token state for one client instance
//!
//! A [`Session`] holds the two credentials the API deals in: the API session
//! token representing the calling application, and the user session token
//! obtained by logging a user in. Both are usually received as cookie headers,
//! so every setter accepts either a bare token or a raw `Cookie:`/`Set-Cookie:`
//! header value and reports what it did through [`TokenUpdate`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use log::debug;

use crate::config::{ClientOptions, DEFAULT_MAX_AGE};
use crate::error::{Result, TonicPowError};

/// Cookie name the API reads and writes session tokens under
pub const API_COOKIE_NAME: &str = "session_token";

/// Cookie / query key used by the short link service for visitor sessions
pub const VISITOR_SESSION_KEY: &str = "tncpw_session";

/// Token value signalling that a session was terminated
pub const DELETE_SENTINEL: &str = "delete";

/// Headers shorter than this are never parsed
pub const MIN_HEADER_LENGTH: usize = 10;

const VISITOR_SESSION_LENGTH: usize = 64;
const EXPIRES_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const EXPIRED_COOKIE: &str = " Expires=Sat, 25 Nov 1995 00:00:00 GMT; Max-Age=-1;";

/// SameSite attribute for the generated user cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        };
        write!(f, "{}", value)
    }
}

impl FromStr for SameSite {
    type Err = TonicPowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            "none" => Ok(SameSite::None),
            _ => Err(TonicPowError::InvalidArgument(format!(
                "unknown SameSite value '{}'",
                s
            ))),
        }
    }
}

/// Which of the two token slots a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSlot {
    Api,
    User,
}

impl fmt::Display for TokenSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSlot::Api => write!(f, "api"),
            TokenSlot::User => write!(f, "user"),
        }
    }
}

/// Outcome of interpreting a raw token value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenUpdate {
    /// A token was found and stored
    Set(String),
    /// The value was the deletion sentinel; the slot is now empty
    Clear,
    /// Empty or unparseable input; the previous token is kept
    Unchanged,
}

/// Find the value of `cookie_name` in a cookie header.
///
/// The header may carry a `Cookie:` or `Set-Cookie:` prefix and any number of
/// other `name=value` pairs or attributes. Values are trimmed and
/// percent-decoded; the first pair with an exactly matching name wins. An
/// empty `cookie_name` means [`API_COOKIE_NAME`].
pub fn find_cookie_value(header: &str, cookie_name: &str) -> Option<String> {
    if header.len() < MIN_HEADER_LENGTH {
        return None;
    }
    let cookie_name = if cookie_name.is_empty() {
        API_COOKIE_NAME
    } else {
        cookie_name
    };

    header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        // "Set-Cookie: session_token" -> "session_token"
        let name = name.rsplit(':').next().unwrap_or(name).trim();
        (name == cookie_name).then(|| decode_cookie_value(value))
    })
}

/// Lenient form of [`find_cookie_value`]: returns `header` unchanged when the
/// cookie cannot be found, so callers must validate the result themselves.
pub fn extract_session_token_from_header(header: &str, cookie_name: &str) -> String {
    find_cookie_value(header, cookie_name).unwrap_or_else(|| header.to_string())
}

/// Interpret a raw token or cookie header destined for a token slot.
pub fn parse_token(raw: &str, cookie_name: &str) -> TokenUpdate {
    let raw = raw.trim();
    let value = if raw.contains(':') || raw.contains(';') {
        let found = find_cookie_value(raw, cookie_name).or_else(|| {
            (cookie_name != API_COOKIE_NAME)
                .then(|| find_cookie_value(raw, API_COOKIE_NAME))
                .flatten()
        });
        match found {
            Some(value) => value,
            None => return TokenUpdate::Unchanged,
        }
    } else {
        raw.to_string()
    };

    match strip_cookie_prefixes(&value, cookie_name) {
        "" => TokenUpdate::Unchanged,
        DELETE_SENTINEL => TokenUpdate::Clear,
        token => TokenUpdate::Set(token.to_string()),
    }
}

/// Interpret a raw visitor session identifier or cookie header.
///
/// Visitor sessions are exactly 64 characters; anything else clears the slot.
pub fn parse_visitor_session(raw: &str) -> TokenUpdate {
    if raw.len() == VISITOR_SESSION_LENGTH {
        return TokenUpdate::Set(raw.to_string());
    }
    if raw == DELETE_SENTINEL || !raw.contains(VISITOR_SESSION_KEY) {
        return TokenUpdate::Clear;
    }
    match find_cookie_value(raw, VISITOR_SESSION_KEY) {
        Some(value) if value.len() == VISITOR_SESSION_LENGTH => TokenUpdate::Set(value),
        _ => TokenUpdate::Clear,
    }
}

fn decode_cookie_value(value: &str) -> String {
    let value = value.trim();
    urlencoding::decode(value)
        .map(|decoded| decoded.trim().to_string())
        .unwrap_or_else(|_| value.to_string())
}

fn strip_cookie_prefixes<'a>(mut value: &'a str, cookie_name: &str) -> &'a str {
    loop {
        let stripped = value
            .strip_prefix(cookie_name)
            .and_then(|rest| rest.strip_prefix('='))
            .or_else(|| {
                value
                    .strip_prefix(API_COOKIE_NAME)
                    .and_then(|rest| rest.strip_prefix('='))
            });
        match stripped {
            Some(rest) => value = rest,
            None => return value,
        }
    }
}

/// Authentication state owned by one client instance
#[derive(Clone)]
pub struct Session {
    api_token: Option<String>,
    user_token: Option<String>,
    visitor_session: Option<String>,
    cookie_name: String,
    cookie_domain: Option<String>,
    max_age: u64,
    http_only: bool,
    secure_cookie: bool,
    same_site: Option<SameSite>,
    custom_headers: Option<HashMap<String, String>>,
}

impl Default for Session {
    fn default() -> Self {
        Session {
            api_token: None,
            user_token: None,
            visitor_session: None,
            cookie_name: API_COOKIE_NAME.to_string(),
            cookie_domain: None,
            max_age: DEFAULT_MAX_AGE,
            http_only: false,
            secure_cookie: false,
            same_site: None,
            custom_headers: None,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        let mut session = Session {
            max_age: options.max_age,
            http_only: options.http_only,
            secure_cookie: options.secure_cookie,
            ..Session::default()
        };
        if let Some(name) = &options.cookie_name {
            session.set_cookie_name(name);
        }
        if let Some(domain) = &options.cookie_domain {
            session.set_cookie_domain(domain);
        }
        if let Some(same_site) = options.same_site {
            session.set_same_site(same_site);
        }
        if let Some(token) = &options.token {
            session.set_api_token(token);
        }
        session
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn user_token(&self) -> Option<&str> {
        self.user_token.as_deref()
    }

    pub fn token(&self, slot: TokenSlot) -> Option<&str> {
        match slot {
            TokenSlot::Api => self.api_token(),
            TokenSlot::User => self.user_token(),
        }
    }

    /// Store an API token from a bare value or a cookie header.
    pub fn set_api_token(&mut self, raw: &str) -> TokenUpdate {
        self.set_token(TokenSlot::Api, raw)
    }

    /// Store a user token from a bare value or a cookie header.
    pub fn set_user_token(&mut self, raw: &str) -> TokenUpdate {
        self.set_token(TokenSlot::User, raw)
    }

    pub fn set_token(&mut self, slot: TokenSlot, raw: &str) -> TokenUpdate {
        let update = parse_token(raw, &self.cookie_name);
        let target = match slot {
            TokenSlot::Api => &mut self.api_token,
            TokenSlot::User => &mut self.user_token,
        };
        match &update {
            TokenUpdate::Set(token) => *target = Some(token.clone()),
            TokenUpdate::Clear => *target = None,
            TokenUpdate::Unchanged => {}
        }
        debug!("{} token update: {}", slot, update_kind(&update));
        update
    }

    pub fn clear_token(&mut self, slot: TokenSlot) {
        self.set_token(slot, DELETE_SENTINEL);
    }

    pub fn visitor_session(&self) -> Option<&str> {
        self.visitor_session.as_deref()
    }

    pub fn set_visitor_session(&mut self, raw: &str) -> TokenUpdate {
        let update = parse_visitor_session(raw);
        match &update {
            TokenUpdate::Set(session) => self.visitor_session = Some(session.clone()),
            TokenUpdate::Clear => self.visitor_session = None,
            TokenUpdate::Unchanged => {}
        }
        update
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Returns false (keeping the current name) for names under 2 characters
    pub fn set_cookie_name(&mut self, name: &str) -> bool {
        if name.len() < 2 {
            return false;
        }
        self.cookie_name = name.to_string();
        true
    }

    pub fn cookie_domain(&self) -> Option<&str> {
        self.cookie_domain.as_deref()
    }

    /// Returns false (keeping the current domain) for domains under 2 characters
    pub fn set_cookie_domain(&mut self, domain: &str) -> bool {
        if domain.len() < 2 {
            return false;
        }
        self.cookie_domain = Some(domain.to_string());
        true
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    pub fn set_max_age(&mut self, seconds: u64) {
        self.max_age = seconds;
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn set_http_only(&mut self, http_only: bool) {
        self.http_only = http_only;
    }

    pub fn secure_cookie(&self) -> bool {
        self.secure_cookie
    }

    pub fn set_secure_cookie(&mut self, secure: bool) {
        self.secure_cookie = secure;
    }

    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// `SameSite::None` also turns `secure_cookie` on.
    pub fn set_same_site(&mut self, same_site: SameSite) {
        if same_site == SameSite::None {
            self.secure_cookie = true;
        }
        self.same_site = Some(same_site);
    }

    /// Parse and apply a SameSite value such as `"lax"`
    pub fn set_same_site_str(&mut self, value: &str) -> Result<()> {
        self.set_same_site(value.parse()?);
        Ok(())
    }

    pub fn custom_headers(&self) -> Option<&HashMap<String, String>> {
        self.custom_headers.as_ref()
    }

    /// Headers sent with the next request only
    pub fn set_custom_headers(&mut self, headers: HashMap<String, String>) {
        self.custom_headers = if headers.is_empty() {
            None
        } else {
            Some(headers)
        };
    }

    pub fn clear_custom_headers(&mut self) {
        self.custom_headers = None;
    }

    /// `Set-Cookie` value carrying the user token for a browser, or an empty
    /// string when no cookie domain is configured.
    pub fn user_cookie(&self) -> String {
        self.user_cookie_at(Utc::now())
    }

    pub fn user_cookie_at(&self, now: DateTime<Utc>) -> String {
        let Some(domain) = self.cookie_domain.as_deref() else {
            return String::new();
        };

        // No user token means logout: hand out an already expired cookie
        let (token, max_age) = match self.user_token.as_deref() {
            Some(token) if !token.is_empty() => (token, self.max_age),
            _ => ("", 0),
        };

        let mut cookie = format!("{}={}; Domain={}; Path=/;", self.cookie_name, token, domain);
        if max_age > 0 {
            let expires = i64::try_from(max_age)
                .ok()
                .and_then(chrono::Duration::try_seconds)
                .and_then(|delta| now.checked_add_signed(delta));
            if let Some(expires) = expires {
                cookie.push_str(&format!(" Expires={};", expires.format(EXPIRES_FORMAT)));
            }
            cookie.push_str(&format!(" Max-Age={};", max_age));
        } else {
            cookie.push_str(EXPIRED_COOKIE);
        }
        if let Some(same_site) = self.same_site {
            cookie.push_str(&format!(" SameSite={};", same_site));
        }
        if self.secure_cookie {
            cookie.push_str(" Secure;");
        }
        if self.http_only {
            cookie.push_str(" HttpOnly;");
        }
        cookie
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |token: &Option<String>| token.as_ref().map(|_| "<redacted>");
        f.debug_struct("Session")
            .field("api_token", &redact(&self.api_token))
            .field("user_token", &redact(&self.user_token))
            .field("visitor_session", &self.visitor_session)
            .field("cookie_name", &self.cookie_name)
            .field("cookie_domain", &self.cookie_domain)
            .field("max_age", &self.max_age)
            .field("http_only", &self.http_only)
            .field("secure_cookie", &self.secure_cookie)
            .field("same_site", &self.same_site)
            .finish()
    }
}

fn update_kind(update: &TokenUpdate) -> &'static str {
    match update {
        TokenUpdate::Set(_) => "set",
        TokenUpdate::Clear => "cleared",
        TokenUpdate::Unchanged => "unchanged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const VISITOR: &str = "826d23410c230dc1a3c49b0a3b91ed52bc1096fbc6718aafa4809c967c5ac9bc";

    #[test]
    fn finds_cookie_regardless_of_position() {
        let headers = [
            "Cookie: session_token=abc-123; another_cookie=value; third=value",
            "another_cookie=value;session_token=abc-123",
            "  third=1 ;   session_token =  abc-123  ; x=y",
            "Set-Cookie: session_token=abc-123; Path=/; HttpOnly",
        ];
        for header in headers {
            assert_eq!(
                find_cookie_value(header, API_COOKIE_NAME).as_deref(),
                Some("abc-123"),
                "header: {}",
                header
            );
        }
    }

    #[test]
    fn decodes_values_and_keeps_inner_equals() {
        let header = "session_token=a%20b%3Dc==; other=1";
        assert_eq!(
            find_cookie_value(header, "session_token").as_deref(),
            Some("a b=c==")
        );
    }

    #[test]
    fn first_match_wins() {
        let header = "session_token=first; session_token=second";
        assert_eq!(find_cookie_value(header, "").as_deref(), Some("first"));
    }

    #[test]
    fn extraction_returns_input_when_short_or_missing() {
        assert_eq!(extract_session_token_from_header("a=b", "a"), "a=b");
        assert_eq!(extract_session_token_from_header("", "a"), "");
        let header = "Cookie: other_cookie=value; more=1";
        assert_eq!(extract_session_token_from_header(header, API_COOKIE_NAME), header);
    }

    #[test]
    fn custom_cookie_name_is_used_for_lookup() {
        let header = "my_session=custom; session_token=default";
        assert_eq!(
            extract_session_token_from_header(header, "my_session"),
            "custom"
        );
    }

    #[test]
    fn parse_token_variants() {
        assert_eq!(
            parse_token("plain-token", API_COOKIE_NAME),
            TokenUpdate::Set("plain-token".to_string())
        );
        assert_eq!(
            parse_token("session_token=plain-token", API_COOKIE_NAME),
            TokenUpdate::Set("plain-token".to_string())
        );
        assert_eq!(
            parse_token("session_token=session_token=twice", API_COOKIE_NAME),
            TokenUpdate::Set("twice".to_string())
        );
        assert_eq!(parse_token("delete", API_COOKIE_NAME), TokenUpdate::Clear);
        assert_eq!(
            parse_token("Set-Cookie: session_token=delete; Path=/", API_COOKIE_NAME),
            TokenUpdate::Clear
        );
        assert_eq!(parse_token("", API_COOKIE_NAME), TokenUpdate::Unchanged);
        assert_eq!(
            parse_token("Cookie: unrelated=1; other=2", API_COOKIE_NAME),
            TokenUpdate::Unchanged
        );
    }

    #[test]
    fn delete_sentinel_empties_slot() {
        let mut session = Session::new();
        session.set_api_token("api-token");
        session.set_user_token("user-token");

        assert_eq!(session.set_user_token("delete"), TokenUpdate::Clear);
        assert_eq!(session.user_token(), None);
        assert_eq!(session.api_token(), Some("api-token"));

        session.set_api_token("Set-Cookie: session_token=delete; Max-Age=0");
        assert_eq!(session.api_token(), None);
    }

    #[test]
    fn garbage_keeps_previous_token() {
        let mut session = Session::new();
        session.set_user_token("user-token");
        assert_eq!(session.set_user_token(""), TokenUpdate::Unchanged);
        assert_eq!(session.set_user_token("x: y; z"), TokenUpdate::Unchanged);
        assert_eq!(session.user_token(), Some("user-token"));
    }

    #[test]
    fn same_site_none_forces_secure() {
        let mut session = Session::new();
        session.set_secure_cookie(false);
        session.set_same_site_str("none").expect("valid");
        assert!(session.secure_cookie());
        assert_eq!(session.same_site(), Some(SameSite::None));

        session.set_same_site_str("LAX").expect("valid");
        assert_eq!(session.same_site(), Some(SameSite::Lax));
        assert!(session.set_same_site_str("sometimes").is_err());
        assert_eq!(session.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn short_names_and_domains_are_rejected() {
        let mut session = Session::new();
        assert!(!session.set_cookie_name("x"));
        assert_eq!(session.cookie_name(), API_COOKIE_NAME);
        assert!(!session.set_cookie_domain("x"));
        assert_eq!(session.cookie_domain(), None);
    }

    #[test]
    fn user_cookie_requires_domain() {
        let mut session = Session::new();
        session.set_user_token("user-token");
        assert_eq!(session.user_cookie(), "");
    }

    #[test]
    fn user_cookie_with_token_expires_in_future() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut session = Session::new();
        session.set_cookie_domain("example.com");
        session.set_max_age(3600);
        session.set_http_only(true);
        session.set_same_site(SameSite::Strict);
        session.set_user_token("user-token");

        assert_eq!(
            session.user_cookie_at(now),
            "session_token=user-token; Domain=example.com; Path=/; \
             Expires=Mon, 01 Jan 2024 01:00:00 GMT; Max-Age=3600; SameSite=Strict; HttpOnly;"
        );
    }

    #[test]
    fn user_cookie_without_token_is_expired() {
        let mut session = Session::new();
        session.set_cookie_domain("example.com");
        session.set_same_site(SameSite::None);

        assert_eq!(
            session.user_cookie(),
            "session_token=; Domain=example.com; Path=/; \
             Expires=Sat, 25 Nov 1995 00:00:00 GMT; Max-Age=-1; SameSite=None; Secure;"
        );
    }

    #[test]
    fn visitor_session_parsing() {
        let mut session = Session::new();
        session.set_visitor_session("not-valid");
        assert_eq!(session.visitor_session(), None);

        session.set_visitor_session(VISITOR);
        assert_eq!(session.visitor_session(), Some(VISITOR));

        let header = format!(
            "__cfduid=dd6545b872516b240cb6185c97; _ga=GA1.2.741780225.1580598550;  tncpw_session={}\n",
            VISITOR
        );
        session.set_visitor_session("delete");
        assert_eq!(session.visitor_session(), None);
        session.set_visitor_session(&header);
        assert_eq!(session.visitor_session(), Some(VISITOR));

        session.set_visitor_session("tncpw_session=too-short; x=1");
        assert_eq!(session.visitor_session(), None);
    }

    #[test]
    fn options_seed_session() {
        let options = ClientOptions {
            token: Some("Cookie: session_token=from-options".to_string()),
            cookie_name: Some("app_session".to_string()),
            cookie_domain: Some("example.com".to_string()),
            same_site: Some(SameSite::None),
            ..ClientOptions::default()
        };
        let session = Session::from_options(&options);
        assert_eq!(session.api_token(), Some("from-options"));
        assert_eq!(session.cookie_name(), "app_session");
        assert!(session.secure_cookie());
    }

    #[test]
    fn debug_redacts_tokens() {
        let mut session = Session::new();
        session.set_api_token("secret-api-token");
        assert!(!format!("{:?}", session).contains("secret-api-token"));
    }
}
