//! Copper Cloud API client.
//!
//! Resolves endpoint paths, attaches the current access token and performs the
//! single re-authentication retry allowed per run. Higher-level operations are
//! implemented via traits on entity types and in [`crate::chunking`].

use std::sync::Arc;

use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use crate::auth::{AuthCodePrompt, FileTokenStore, NoPrompt, StdinPrompt, TokenManager, TokenState, TokenStore};
use crate::config::{base_url, AuthFlow, Config};
use crate::error::{CopperError, Result};
use crate::http::HttpHelper;

/// Copper Cloud API client.
///
/// Wraps the [`HttpHelper`] with a [`TokenManager`]. The manager is loaded
/// lazily on the first request; [`CopperClient::authenticate`] does so eagerly
/// and probes the API to validate the token.
///
/// # Example
///
/// ```no_run
/// use coppercloud::{AuthFlow, Config, CopperClient};
///
/// # async fn example() -> coppercloud::Result<()> {
/// let config = Config::from_env(AuthFlow::Enterprise)?;
/// let client = CopperClient::connect(&config).await?;
/// # Ok(())
/// # }
/// ```
pub struct CopperClient {
    http: HttpHelper,
    api_root: Arc<Url>,
    api_v2: Arc<Url>,
    flow: AuthFlow,
    enterprise_id: Option<String>,
    timezone: Option<Tz>,
    tokens: Mutex<TokenManager>,
}

impl std::fmt::Debug for CopperClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CopperClient")
            .field("api_root", &self.api_root.as_str())
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}

impl CopperClient {
    /// Create a client with an explicit token store and login prompt.
    ///
    /// No network I/O happens until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if a base URL is invalid or the grant is incomplete.
    pub fn new(
        config: &Config,
        store: Box<dyn TokenStore>,
        prompt: Box<dyn AuthCodePrompt>,
    ) -> Result<Self> {
        let http = HttpHelper::new(config.timeout, config.debug)?;
        let api_root = base_url(&config.api_url)?;
        let api_v2 = api_root.join("api/v2/")?;
        let tokens = TokenManager::new(http.clone(), config, store, prompt)?;

        Ok(Self {
            http,
            api_root: Arc::new(api_root),
            api_v2: Arc::new(api_v2),
            flow: config.flow,
            enterprise_id: config.enterprise_id.clone(),
            timezone: config.timezone,
            tokens: Mutex::new(tokens),
        })
    }

    /// Create a client backed by the configured cache file, then authenticate.
    ///
    /// The app flow prompts on standard input when no token is cached.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or the probe request fails.
    pub async fn connect(config: &Config) -> Result<Self> {
        let store = Box::new(FileTokenStore::new(config.cache_file.clone()));
        let prompt: Box<dyn AuthCodePrompt> = match config.flow {
            AuthFlow::App => Box::new(StdinPrompt),
            AuthFlow::Enterprise => Box::new(NoPrompt),
        };
        let client = Self::new(config, store, prompt)?;
        client.authenticate().await?;
        Ok(client)
    }

    /// Load or acquire a token and validate it with a probe request.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be obtained or the probe fails
    /// after the single allowed re-authentication.
    #[tracing::instrument(skip(self))]
    pub async fn authenticate(&self) -> Result<()> {
        self.tokens.lock().await.load_or_create().await?;
        self.get_url(self.probe_url()?).await?;
        Ok(())
    }

    /// Endpoint used to check that the cached token is accepted.
    pub fn probe_url(&self) -> Result<Url> {
        match self.flow {
            AuthFlow::App => self.url("app/state", &[]),
            AuthFlow::Enterprise => {
                let path = self.partner_path("bulk")?;
                self.url(&path, &[("limit", "1".to_string())])
            }
        }
    }

    /// Lifecycle state of the token manager.
    pub async fn token_state(&self) -> TokenState {
        self.tokens.lock().await.state()
    }

    /// Timezone override for date chunking, if configured.
    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    /// The enterprise id, required by partner endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::ConfigMissing`] for clients without one.
    pub fn enterprise_id(&self) -> Result<&str> {
        self.enterprise_id
            .as_deref()
            .ok_or_else(|| CopperError::ConfigMissing("COPPER_ENTERPRISE_ID not set".to_string()))
    }

    /// `partner/{enterprise_id}/{rest}`.
    pub fn partner_path(&self, rest: &str) -> Result<String> {
        Ok(format!(
            "partner/{}/{}",
            urlencoding::encode(self.enterprise_id()?),
            rest
        ))
    }

    /// Resolve a path under `/api/v2/` and append query parameters.
    pub fn url(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self.api_v2.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Resolve a server-provided `next` link against the API host.
    pub fn resolve_next(&self, next: &str) -> Result<Url> {
        Ok(self.api_root.join(next)?)
    }

    /// GET a path under `/api/v2/` and deserialize the body.
    #[tracing::instrument(skip(self, query))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let value = self.get_url(self.url(path, query)?).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Authorized GET of an absolute URL.
    ///
    /// An unauthorized response triggers one re-authentication and a retry,
    /// but only once per client; afterwards it propagates. Other errors,
    /// including 400, are returned untouched.
    pub async fn get_url(&self, url: Url) -> Result<Value> {
        let header = self.authorization().await?;

        match self.http.get(url.clone(), Some(&header)).await {
            Ok(value) => {
                self.tokens.lock().await.mark_validated();
                Ok(value)
            }
            Err(err) if err.is_unauthorized() => {
                let header = {
                    let mut tokens = self.tokens.lock().await;
                    if !tokens.can_reauthenticate() {
                        return Err(err);
                    }
                    tokens.reauthenticate().await?;
                    tokens.header()?
                };
                let value = self.http.get(url, Some(&header)).await?;
                self.tokens.lock().await.mark_validated();
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }

    async fn authorization(&self) -> Result<String> {
        let mut tokens = self.tokens.lock().await;
        if tokens.state() == TokenState::Uninitialized {
            tokens.load_or_create().await?;
        }
        tokens.header()
    }
}
