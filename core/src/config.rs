//! Session configuration: the access token and the API base URL.
//!
//! # Design
//! The token is an explicit value handed to `Session::new` rather than
//! ambient state, so one process can hold sessions for several accounts and
//! tests can point a session at a local server. `AccessToken` redacts itself
//! in `Debug` output; the raw string is only reachable through `expose`.

use std::fmt;

use url::Url;

use crate::error::ApiError;

/// Base URL of the public v1 API.
pub const DEFAULT_BASE_URL: &str = "https://api.instagram.com/v1/";

/// Environment variable holding the access token for `SessionConfig::from_env`.
pub const TOKEN_ENV: &str = "INSTAGRAM_ACCESS_TOKEN";

/// Environment variable overriding the base URL for `SessionConfig::from_env`.
pub const BASE_URL_ENV: &str = "INSTAGRAM_API_URL";

/// Opaque bearer credential obtained out-of-band.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for placing into a query string or form body.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for AccessToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Everything a `Session` needs besides its transport.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub base_url: Url,
    pub access_token: AccessToken,
}

impl SessionConfig {
    /// Configuration against the public API.
    pub fn new(access_token: impl Into<AccessToken>) -> Result<Self, ApiError> {
        Self::for_base_url(DEFAULT_BASE_URL, access_token)
    }

    /// Configuration against the API rooted at `base_url`.
    pub fn for_base_url(base_url: &str, access_token: impl Into<AccessToken>) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            access_token: access_token.into(),
        })
    }

    /// Replace the base URL. A trailing slash is added when missing so that
    /// endpoint templates resolve beneath the base path.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Build a configuration from `INSTAGRAM_ACCESS_TOKEN` and the optional
    /// `INSTAGRAM_API_URL`.
    pub fn from_env() -> Result<Self, ApiError> {
        let token = std::env::var(TOKEN_ENV)
            .map_err(|_| ApiError::Config(format!("{TOKEN_ENV} is not set")))?;
        let config = Self::new(token)?;
        match std::env::var(BASE_URL_ENV) {
            Ok(base_url) => config.with_base_url(&base_url),
            Err(_) => Ok(config),
        }
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw).map_err(|e| ApiError::Config(format!("invalid base url {raw:?}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ApiError::Config(format!(
            "base url must be http or https, got {:?}",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    Ok(url)
}
