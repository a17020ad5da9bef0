//! Client configuration.
//!
//! Configuration comes from environment variables ([`Config::from_env`]) or is
//! assembled programmatically with the `with_*` builders.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use url::Url;

use crate::error::{CopperError, Result};

const DEFAULT_AUTH_URL: &str = "https://auth.copperlabs.com";
const DEFAULT_API_URL: &str = "https://api.copperlabs.com";

/// Public client id of the Copper mobile/web app.
pub const DEFAULT_APP_CLIENT_ID: &str = "s2FKWj80rK2HfBwOeacICoLGhbBxHCEl";

const ENTERPRISE_CACHE_FILE: &str = ".copper_cloud_cache";
const APP_CACHE_FILE: &str = ".copper_app_cache";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Which OAuth flow a command authenticates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    /// Machine-to-machine client-credentials grant (partner endpoints).
    Enterprise,
    /// Interactive authorization-code grant with PKCE (app endpoints).
    App,
}

/// Runtime configuration for a [`CopperClient`](crate::CopperClient).
#[derive(Debug, Clone)]
pub struct Config {
    pub flow: AuthFlow,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub enterprise_id: Option<String>,
    pub auth_url: String,
    pub api_url: String,
    pub cache_file: PathBuf,
    /// Forces the timezone used for date chunking instead of per-meter lookup.
    pub timezone: Option<Tz>,
    /// Dump full requests/responses to the `coppercloud::wire` tracing target.
    pub debug: bool,
    pub timeout: Duration,
}

impl Config {
    /// Configuration for the client-credentials flow.
    pub fn enterprise(client_id: &str, client_secret: &str, enterprise_id: &str) -> Self {
        Self {
            flow: AuthFlow::Enterprise,
            client_id: client_id.to_string(),
            client_secret: Some(client_secret.to_string()),
            enterprise_id: Some(enterprise_id.to_string()),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            cache_file: PathBuf::from(ENTERPRISE_CACHE_FILE),
            timezone: None,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Configuration for the authorization-code flow.
    pub fn app(client_id: &str) -> Self {
        Self {
            flow: AuthFlow::App,
            client_id: client_id.to_string(),
            client_secret: None,
            enterprise_id: None,
            auth_url: DEFAULT_AUTH_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            cache_file: PathBuf::from(APP_CACHE_FILE),
            timezone: None,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// The enterprise flow requires `COPPER_CLIENT_ID`, `COPPER_CLIENT_SECRET`
    /// and `COPPER_ENTERPRISE_ID`. The app flow reads `COPPER_APP_CLIENT_ID`
    /// and falls back to [`DEFAULT_APP_CLIENT_ID`]. Both honor
    /// `COPPER_AUTH_URL`, `COPPER_API_URL`, `COPPER_CACHE_FILE` and
    /// `COPPER_TIMEZONE`.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::ConfigMissing`] if a required variable is unset,
    /// or [`CopperError::InvalidArgument`] for an unknown `COPPER_TIMEZONE`.
    pub fn from_env(flow: AuthFlow) -> Result<Self> {
        let mut config = match flow {
            AuthFlow::Enterprise => Self::enterprise(
                &required_var("COPPER_CLIENT_ID")?,
                &required_var("COPPER_CLIENT_SECRET")?,
                &required_var("COPPER_ENTERPRISE_ID")?,
            ),
            AuthFlow::App => Self::app(
                &env::var("COPPER_APP_CLIENT_ID")
                    .unwrap_or_else(|_| DEFAULT_APP_CLIENT_ID.to_string()),
            ),
        };

        if let Ok(url) = env::var("COPPER_AUTH_URL") {
            config.auth_url = url;
        }
        if let Ok(url) = env::var("COPPER_API_URL") {
            config.api_url = url;
        }
        if let Ok(path) = env::var("COPPER_CACHE_FILE") {
            config.cache_file = PathBuf::from(path);
        }
        if let Ok(name) = env::var("COPPER_TIMEZONE") {
            config.timezone = Some(parse_timezone(&name)?);
        }

        Ok(config)
    }

    pub fn with_auth_url(mut self, url: &str) -> Self {
        self.auth_url = url.to_string();
        self
    }

    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = url.to_string();
        self
    }

    pub fn with_cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = path.into();
        self
    }

    pub fn with_timezone(mut self, timezone: Option<Tz>) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The OAuth audience: the API host without a trailing slash.
    pub fn audience(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Redirect URI registered for the authorization-code flow.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/v2", self.audience())
    }
}

fn required_var(name: &str) -> Result<String> {
    env::var(name)
        .map_err(|_| CopperError::ConfigMissing(format!("{name} environment variable not set")))
}

/// Parse a base URL, making sure it ends with `/` so relative joins append.
pub(crate) fn base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Ok(Url::parse(&with_slash)?)
}

/// Parse an IANA timezone name such as `America/Denver`.
///
/// # Errors
///
/// Returns [`CopperError::InvalidArgument`] if the name is unknown.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CopperError::InvalidArgument(format!("unknown timezone '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enterprise_defaults() {
        let config = Config::enterprise("id", "secret", "ent");
        assert_eq!(config.flow, AuthFlow::Enterprise);
        assert_eq!(config.enterprise_id.as_deref(), Some("ent"));
        assert_eq!(config.cache_file, PathBuf::from(".copper_cloud_cache"));
        assert_eq!(config.audience(), "https://api.copperlabs.com");
    }

    #[test]
    fn test_app_redirect_uri() {
        let config = Config::app("abc").with_api_url("https://api.example.com/");
        assert_eq!(config.audience(), "https://api.example.com");
        assert_eq!(config.redirect_uri(), "https://api.example.com/api/v2");
        assert!(config.client_secret.is_none());
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let a = base_url("https://api.example.com").unwrap();
        let b = base_url("https://api.example.com/").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.join("api/v2/").unwrap().as_str(), "https://api.example.com/api/v2/");
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("America/Denver").unwrap(), chrono_tz::America::Denver);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
