//! Utility functions and helpers

use crate::error::{Result, TonicPowError};
use url::form_urlencoded;
use url::Url;

/// Current version segment for API requests
pub const API_VERSION: &str = "v1";

/// URL building utilities
pub struct UrlUtils;

impl UrlUtils {
    /// Validate a base URL and make sure it ends with `/`
    pub fn validate_base_url(input: &str) -> Result<Url> {
        let base = if input.ends_with('/') {
            input.to_string()
        } else {
            format!("{}/", input)
        };

        let url = Url::parse(&base)
            .map_err(|e| TonicPowError::InvalidUrl(format!("Invalid URL '{}': {}", input, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(TonicPowError::InvalidUrl(format!(
                "Unsupported scheme '{}' in '{}'",
                scheme, input
            ))),
        }
    }

    /// `{base}{API_VERSION}{path}`, where `path` starts with `/` and may carry a query
    pub fn api_endpoint(base: &Url, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        let raw = format!("{}{}/{}", base, API_VERSION, path);
        Url::parse(&raw)
            .map_err(|e| TonicPowError::InvalidUrl(format!("Invalid URL '{}': {}", raw, e)))
    }

    /// Percent-encode a caller supplied path segment
    pub fn segment(value: impl ToString) -> String {
        urlencoding::encode(&value.to_string()).into_owned()
    }
}

/// Query string builder that skips empty values
#[derive(Debug, Default)]
pub struct QueryBuilder {
    pairs: Vec<(String, String)>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.pairs.push((key.to_string(), value));
        }
        self
    }

    pub fn optional(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.pair(key, value),
            None => self,
        }
    }

    /// Append the encoded query to `path`
    pub fn apply(self, path: &str) -> String {
        if self.pairs.is_empty() {
            return path.to_string();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(&self.pairs)
            .finish();
        format!("{}?{}", path, query)
    }
}

/// String utilities
pub struct StringUtils;

impl StringUtils {
    /// Parse `Name: value` header lines
    pub fn parse_header(input: &str) -> Result<(String, String)> {
        let parts: Vec<&str> = input.splitn(2, ':').collect();
        match parts.as_slice() {
            [key, value] if !key.trim().is_empty() => {
                let key = key.trim().to_string();
                let value = value.trim().to_string();
                Ok((key, value))
            }
            _ => Err(TonicPowError::InvalidHeader(format!(
                "Invalid header format: '{}'. Expected 'key: value'",
                input
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{QueryBuilder, StringUtils, UrlUtils};
    use crate::error::TonicPowError;

    #[test]
    fn validate_base_url_adds_trailing_slash() {
        let url = UrlUtils::validate_base_url("http://127.0.0.1:8080").expect("valid url");
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/");
    }

    #[test]
    fn validate_base_url_rejects_invalid_input() {
        let err = UrlUtils::validate_base_url("not a url").expect_err("invalid url");
        assert!(matches!(err, TonicPowError::InvalidUrl(_)));

        let err = UrlUtils::validate_base_url("ftp://example.com").expect_err("scheme");
        assert!(matches!(err, TonicPowError::InvalidUrl(_)));
    }

    #[test]
    fn api_endpoint_joins_version_and_path() {
        let base = UrlUtils::validate_base_url("https://api.tonicpow.com/").expect("base");
        let url = UrlUtils::api_endpoint(&base, "/auth/session").expect("endpoint");
        assert_eq!(url.as_str(), "https://api.tonicpow.com/v1/auth/session");

        let url = UrlUtils::api_endpoint(&base, "/users/details?email=a%2Bb%40c.com")
            .expect("endpoint");
        assert_eq!(url.path(), "/v1/users/details");
        assert_eq!(url.query(), Some("email=a%2Bb%40c.com"));
    }

    #[test]
    fn segment_is_percent_encoded() {
        assert_eq!(UrlUtils::segment("a b/c"), "a%20b%2Fc");
        assert_eq!(UrlUtils::segment(42), "42");
    }

    #[test]
    fn query_builder_skips_empty_values() {
        let path = QueryBuilder::new()
            .pair("search_query", "coffee & tea")
            .pair("sort_by", "")
            .optional("current_page", Some(2))
            .optional("results_per_page", None::<u32>)
            .apply("/campaigns/find");
        assert_eq!(
            path,
            "/campaigns/find?search_query=coffee+%26+tea&current_page=2"
        );
        assert_eq!(QueryBuilder::new().apply("/campaigns/find"), "/campaigns/find");
    }

    #[test]
    fn parse_header_splits_key_value() {
        let (key, value) = StringUtils::parse_header("X-Test: value").expect("header");
        assert_eq!(key, "X-Test");
        assert_eq!(value, "value");

        let err = StringUtils::parse_header("missing").expect_err("invalid header");
        assert!(matches!(err, TonicPowError::InvalidHeader(_)));
    }
}
