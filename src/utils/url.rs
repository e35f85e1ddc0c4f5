//! URL utilities for consistent URL handling
//!
//! Base URLs come from user configuration and may or may not carry a
//! trailing slash; endpoint paths are written with or without a leading one.

use reqwest::Url;
use std::fmt;

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use kindred::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/api/"), "http://localhost:8000/api");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use kindred::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/api/", "/conversations"),
///     "http://localhost:8000/api/conversations"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Append a `token` query parameter, preserving any existing query string.
///
/// Event-stream transports cannot set an `Authorization` header, so the
/// bearer credential travels in the URL instead.
pub fn with_token_param(url: &str, token: &str) -> Result<String, InvalidUrl> {
    let mut parsed = Url::parse(url).map_err(|err| InvalidUrl {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    parsed.query_pairs_mut().append_pair("token", token);
    Ok(parsed.into())
}

#[derive(Debug, Clone)]
pub struct InvalidUrl {
    pub url: String,
    pub reason: String,
}

impl fmt::Display for InvalidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid URL '{}': {}", self.url, self.reason)
    }
}

impl std::error::Error for InvalidUrl {}
