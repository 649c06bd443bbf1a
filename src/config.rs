//! Configuration management for tonicpow

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Result, TonicPowError};
use crate::session::SameSite;

/// Minimum accepted length of an API key
pub const MIN_API_KEY_LENGTH: usize = 30;

/// Default lifetime of a session cookie in seconds (48 hours)
pub const DEFAULT_MAX_AGE: u64 = 172_800;

/// TonicPow environments, each bound to a fixed base URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Live,
    Local,
    Staging,
    Mock,
}

impl Environment {
    pub const ALL: [Environment; 4] = [
        Environment::Live,
        Environment::Local,
        Environment::Staging,
        Environment::Mock,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Environment::Live => "live",
            Environment::Local => "local",
            Environment::Staging => "staging",
            Environment::Mock => "mock",
        }
    }

    /// Base URL for the environment (always ends with `/`)
    pub fn url(&self) -> &'static str {
        match self {
            Environment::Live => "https://api.tonicpow.com/",
            Environment::Local => "http://localhost:3000/",
            Environment::Staging => "https://api.staging.tonicpow.com/",
            Environment::Mock => "http://d9116720-5ac6-4c7f-a370-4ea578c63a66.mock.pstmn.io/",
        }
    }

    /// Map one of the known base URLs back to its environment
    pub fn from_url(url: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|env| env.url() == url)
            .ok_or_else(|| TonicPowError::InvalidApiUrl(url.to_string()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Environment {
    type Err = TonicPowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Environment::Live),
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "mock" => Ok(Environment::Mock),
            _ => Err(TonicPowError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// API key and environment for one client instance
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    api_key: String,
    environment: Environment,
}

impl Config {
    /// Surrounding whitespace is stripped from `api_key` before validation.
    pub fn new(api_key: impl Into<String>, environment: Environment) -> Result<Self> {
        let api_key = validate_api_key(api_key.into())?;
        Ok(Self {
            api_key,
            environment,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The base URL, derived from the environment
    pub fn api_url(&self) -> &'static str {
        self.environment.url()
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) -> Result<()> {
        self.api_key = validate_api_key(api_key.into())?;
        Ok(())
    }

    pub fn set_environment(&mut self, environment: Environment) {
        self.environment = environment;
    }

    /// Switch environments by name (`live`, `local`, `staging`, `mock`)
    pub fn set_environment_name(&mut self, name: &str) -> Result<()> {
        self.environment = name.parse()?;
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .finish()
    }
}

fn validate_api_key(api_key: String) -> Result<String> {
    let api_key = api_key.trim();
    if api_key.len() < MIN_API_KEY_LENGTH {
        return Err(TonicPowError::InvalidApiKey);
    }
    Ok(api_key.to_string())
}

/// Options applied when constructing a client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub environment: Environment,
    /// A previously issued API session token to reuse instead of creating one
    pub token: Option<String>,
    pub cookie_name: Option<String>,
    pub cookie_domain: Option<String>,
    pub max_age: u64,
    pub http_only: bool,
    pub secure_cookie: bool,
    pub same_site: Option<SameSite>,
    pub user_agent: Option<String>,
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptions {
            environment: Environment::Live,
            token: None,
            cookie_name: None,
            cookie_domain: None,
            max_age: DEFAULT_MAX_AGE,
            http_only: false,
            secure_cookie: false,
            same_site: None,
            user_agent: Some(format!("tonicpow-rs/{}", crate::VERSION)),
            timeout: None,
        }
    }
}
