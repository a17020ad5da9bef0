//! Token lifecycle: load, acquire, refresh, persist.

use std::io::{self, BufRead, Write};

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::auth::pkce::Pkce;
use crate::auth::store::TokenStore;
use crate::auth::token::TokenData;
use crate::config::{base_url, AuthFlow, Config};
use crate::error::{CopperError, Result};
use crate::http::HttpHelper;

const APP_SCOPE: &str = "app offline_access";

/// OAuth grant used for first-time acquisition and re-authentication.
#[derive(Clone)]
pub enum Grant {
    /// Interactive login; the user pastes back the `code` from the redirect.
    AuthorizationCode {
        client_id: String,
        scope: String,
        audience: String,
        redirect_uri: String,
    },
    /// Machine-to-machine login with a client secret.
    ClientCredentials {
        client_id: String,
        client_secret: String,
        audience: String,
    },
}

impl Grant {
    /// Build the grant matching the configured flow.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::ConfigMissing`] if the enterprise flow has no secret.
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.flow {
            AuthFlow::App => Ok(Self::AuthorizationCode {
                client_id: config.client_id.clone(),
                scope: APP_SCOPE.to_string(),
                audience: config.audience().to_string(),
                redirect_uri: config.redirect_uri(),
            }),
            AuthFlow::Enterprise => {
                let client_secret = config.client_secret.clone().ok_or_else(|| {
                    CopperError::ConfigMissing("client secret required".to_string())
                })?;
                Ok(Self::ClientCredentials {
                    client_id: config.client_id.clone(),
                    client_secret,
                    audience: config.audience().to_string(),
                })
            }
        }
    }

    fn client_id(&self) -> &str {
        match self {
            Self::AuthorizationCode { client_id, .. } | Self::ClientCredentials { client_id, .. } => {
                client_id
            }
        }
    }

    fn grant_type(&self) -> &'static str {
        match self {
            Self::AuthorizationCode { .. } => "authorization_code",
            Self::ClientCredentials { .. } => "client_credentials",
        }
    }
}

impl std::fmt::Debug for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grant")
            .field("grant_type", &self.grant_type())
            .field("client_id", &self.client_id())
            .finish_non_exhaustive()
    }
}

/// Supplies the authorization code for an interactive login.
pub trait AuthCodePrompt: Send + Sync {
    /// Send the user to `authorize_url` and return the code they obtained.
    fn authorization_code(&self, authorize_url: &Url) -> Result<String>;
}

/// Opens a browser (best effort) and reads the code from standard input.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl AuthCodePrompt for StdinPrompt {
    fn authorization_code(&self, authorize_url: &Url) -> Result<String> {
        open_browser(authorize_url);

        let mut stderr = io::stderr();
        writeln!(stderr)?;
        writeln!(stderr, "Complete the passwordless login with Copper Labs at:")?;
        writeln!(stderr, "  {authorize_url}")?;
        writeln!(stderr)?;
        writeln!(
            stderr,
            "Upon successful login, the URL in your browser will contain a code, e.g. ?code=bk1AEJKK0NUYh-XI"
        )?;
        write!(stderr, "enter it now: ")?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        let code = line.trim().to_string();
        if code.is_empty() {
            return Err(CopperError::InvalidArgument(
                "no authorization code entered".to_string(),
            ));
        }
        Ok(code)
    }
}

fn open_browser(url: &Url) {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]);
        c
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    if let Err(e) = command.arg(url.as_str()).spawn() {
        tracing::debug!(error = %e, "could not open a browser");
    }
}

/// Refuses interactive login; used by non-interactive flows.
#[derive(Debug, Default)]
pub struct NoPrompt;

impl AuthCodePrompt for NoPrompt {
    fn authorization_code(&self, _authorize_url: &Url) -> Result<String> {
        Err(CopperError::ConfigMissing(
            "interactive login required but no prompt is available".to_string(),
        ))
    }
}

/// Where the manager is in its lifecycle.
///
/// `Uninitialized -> Cached -> Validated`, or through `Refreshing` when the
/// first probe is rejected. `Validated` is never re-checked proactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Uninitialized,
    Cached,
    Refreshing,
    Validated,
}

#[derive(Deserialize)]
struct RefreshedToken {
    access_token: String,
}

/// Owns the access token and the mechanics of obtaining it.
pub struct TokenManager {
    http: HttpHelper,
    token_url: Url,
    authorize_url: Url,
    grant: Grant,
    store: Box<dyn TokenStore>,
    prompt: Box<dyn AuthCodePrompt>,
    token: Option<TokenData>,
    state: TokenState,
    reauthenticated: bool,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("token_url", &self.token_url.as_str())
            .field("grant", &self.grant)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a manager for the configured flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth URL is invalid or the grant is incomplete.
    pub fn new(
        http: HttpHelper,
        config: &Config,
        store: Box<dyn TokenStore>,
        prompt: Box<dyn AuthCodePrompt>,
    ) -> Result<Self> {
        let auth_base = base_url(&config.auth_url)?;
        Ok(Self {
            http,
            token_url: auth_base.join("oauth/token")?,
            authorize_url: auth_base.join("authorize")?,
            grant: Grant::from_config(config)?,
            store,
            prompt,
            token: None,
            state: TokenState::Uninitialized,
            reauthenticated: false,
        })
    }

    pub fn state(&self) -> TokenState {
        self.state
    }

    pub fn token(&self) -> Option<&TokenData> {
        self.token.as_ref()
    }

    /// Load the cached token, or acquire and persist a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache is unreadable or acquisition fails.
    #[tracing::instrument(skip(self))]
    pub async fn load_or_create(&mut self) -> Result<()> {
        if let Some(token) = self.store.load()? {
            self.token = Some(token);
            self.state = TokenState::Cached;
            return Ok(());
        }

        tracing::info!(grant_type = self.grant.grant_type(), "generating new token data");
        if matches!(self.grant, Grant::AuthorizationCode { .. }) {
            let pkce = Pkce::generate();
            let url = self.authorization_url(&pkce)?;
            let code = self.prompt.authorization_code(&url)?;
            self.acquire_via_auth_code(pkce.code_verifier(), &code).await?;
        } else {
            self.acquire_via_client_credentials().await?;
        }
        self.persist()?;
        self.state = TokenState::Cached;
        Ok(())
    }

    /// URL the user visits to log in, bound to `pkce`'s challenge.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::InvalidArgument`] for a client-credentials grant.
    pub fn authorization_url(&self, pkce: &Pkce) -> Result<Url> {
        let Grant::AuthorizationCode {
            client_id,
            scope,
            audience,
            redirect_uri,
        } = &self.grant
        else {
            return Err(CopperError::InvalidArgument(
                "authorization URL requires the authorization-code grant".to_string(),
            ));
        };

        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("code_challenge", pkce.code_challenge())
            .append_pair("code_challenge_method", pkce.challenge_method())
            .append_pair("client_id", client_id)
            .append_pair("scope", scope)
            .append_pair("audience", audience)
            .append_pair("redirect_uri", redirect_uri);
        Ok(url)
    }

    /// Exchange a PKCE verifier and authorization code for a token.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::AuthExchange`] if the token endpoint rejects the grant.
    #[tracing::instrument(skip_all)]
    pub async fn acquire_via_auth_code(&mut self, code_verifier: &str, auth_code: &str) -> Result<()> {
        let Grant::AuthorizationCode {
            client_id,
            redirect_uri,
            ..
        } = &self.grant
        else {
            return Err(CopperError::AuthExchange {
                grant_type: "authorization_code",
                reason: "client is configured for client credentials".to_string(),
            });
        };

        let body = json!({
            "grant_type": "authorization_code",
            "code_verifier": code_verifier,
            "client_id": client_id,
            "code": auth_code.trim(),
            "redirect_uri": redirect_uri,
        });
        let value = self.exchange("authorization_code", &body).await?;
        self.token = Some(serde_json::from_value(value)?);
        Ok(())
    }

    /// Exchange the client id/secret pair for a token.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::AuthExchange`] if the token endpoint rejects the grant.
    #[tracing::instrument(skip_all)]
    pub async fn acquire_via_client_credentials(&mut self) -> Result<()> {
        let Grant::ClientCredentials {
            client_id,
            client_secret,
            audience,
        } = &self.grant
        else {
            return Err(CopperError::AuthExchange {
                grant_type: "client_credentials",
                reason: "client is configured for the authorization-code flow".to_string(),
            });
        };

        let body = json!({
            "grant_type": "client_credentials",
            "client_id": client_id,
            "client_secret": client_secret,
            "audience": audience,
        });
        let value = self.exchange("client_credentials", &body).await?;
        self.token = Some(serde_json::from_value(value)?);
        Ok(())
    }

    /// Trade the stored refresh token for a new access token.
    ///
    /// Only `access_token` is replaced; the refresh token is kept as is.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::AuthExchange`] if no refresh token is cached or
    /// the endpoint rejects it.
    #[tracing::instrument(skip_all)]
    pub async fn refresh(&mut self) -> Result<()> {
        let refresh_token = self
            .token
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(|| CopperError::AuthExchange {
                grant_type: "refresh_token",
                reason: "no refresh token cached".to_string(),
            })?;

        let body = json!({
            "grant_type": "refresh_token",
            "client_id": self.grant.client_id(),
            "refresh_token": refresh_token,
        });
        let value = self.exchange("refresh_token", &body).await?;
        let refreshed: RefreshedToken = serde_json::from_value(value)?;

        if let Some(token) = self.token.as_mut() {
            token.access_token = refreshed.access_token;
        }
        Ok(())
    }

    /// Write the current token to the store, replacing what was there.
    ///
    /// Does nothing when no token is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn persist(&self) -> Result<()> {
        match &self.token {
            Some(token) => self.store.save(token),
            None => Ok(()),
        }
    }

    /// The `Authorization` header value for the current token.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::AuthExchange`] if no token has been obtained.
    pub fn header(&self) -> Result<String> {
        self.token
            .as_ref()
            .map(TokenData::header)
            .ok_or_else(|| CopperError::AuthExchange {
                grant_type: self.grant.grant_type(),
                reason: "no token has been acquired".to_string(),
            })
    }

    /// Whether the one re-authentication allowed per run is still available.
    pub fn can_reauthenticate(&self) -> bool {
        !self.reauthenticated
    }

    /// Replace a rejected access token, at most once per manager.
    ///
    /// Client-credentials clients simply acquire a new token; interactive
    /// clients use their refresh token. The result is persisted.
    ///
    /// # Errors
    ///
    /// Returns [`CopperError::AuthExchange`] if the budget is spent or the exchange fails.
    pub async fn reauthenticate(&mut self) -> Result<()> {
        if self.reauthenticated {
            return Err(CopperError::AuthExchange {
                grant_type: self.grant.grant_type(),
                reason: "token already refreshed once in this run".to_string(),
            });
        }
        self.reauthenticated = true;
        self.state = TokenState::Refreshing;
        tracing::info!("access token rejected, re-authenticating");

        if matches!(self.grant, Grant::ClientCredentials { .. }) {
            self.acquire_via_client_credentials().await?;
        } else {
            self.refresh().await?;
        }
        self.persist()
    }

    /// Record that a request with the current token succeeded.
    pub fn mark_validated(&mut self) {
        self.state = TokenState::Validated;
    }

    async fn exchange(&self, grant_type: &'static str, body: &Value) -> Result<Value> {
        self.http
            .post(self.token_url.clone(), None, body)
            .await
            .map_err(|e| match e {
                CopperError::Unauthorized(r)
                | CopperError::ClientError(r)
                | CopperError::RequestError(r) => CopperError::AuthExchange {
                    grant_type,
                    reason: r.to_string(),
                },
                other => other,
            })
    }
}
