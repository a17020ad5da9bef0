//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use coppercloud::auth::{AuthCodePrompt, MemoryTokenStore, NoPrompt};
use coppercloud::{Config, CopperClient, TokenData};
use url::Url;
use wiremock::MockServer;

/// Enterprise configuration pointing both auth and API at the mock server.
pub fn enterprise_config(server: &MockServer) -> Config {
    Config::enterprise("test-client", "test-secret", "ent-1")
        .with_auth_url(&server.uri())
        .with_api_url(&server.uri())
}

/// App configuration pointing both auth and API at the mock server.
pub fn app_config(server: &MockServer) -> Config {
    Config::app("app-client")
        .with_auth_url(&server.uri())
        .with_api_url(&server.uri())
}

pub fn token(access: &str, refresh: Option<&str>) -> TokenData {
    TokenData {
        access_token: access.to_string(),
        refresh_token: refresh.map(str::to_string),
        token_type: "Bearer".to_string(),
        expires_in: Some(86400),
    }
}

/// Token endpoint response body.
pub fn token_body(access: &str, refresh: Option<&str>) -> serde_json::Value {
    serde_json::to_value(token(access, refresh)).unwrap()
}

/// Enterprise client with an already cached token.
pub fn cached_enterprise_client(server: &MockServer, access: &str) -> (CopperClient, MemoryTokenStore) {
    let store = MemoryTokenStore::with_token(token(access, None));
    let client = CopperClient::new(
        &enterprise_config(server),
        Box::new(store.clone()),
        Box::new(NoPrompt),
    )
    .unwrap();
    (client, store)
}

/// Prompt that answers with a fixed code and remembers the URL it was shown.
/// Clones share the remembered URL.
#[derive(Clone, Default)]
pub struct StaticPrompt {
    pub code: String,
    pub shown: Arc<Mutex<Option<Url>>>,
}

impl StaticPrompt {
    pub fn new(code: &str) -> Self {
        Self {
            code: code.to_string(),
            shown: Arc::default(),
        }
    }

    pub fn shown_url(&self) -> Option<Url> {
        self.shown.lock().unwrap().clone()
    }
}

impl AuthCodePrompt for StaticPrompt {
    fn authorization_code(&self, authorize_url: &Url) -> coppercloud::Result<String> {
        *self.shown.lock().unwrap() = Some(authorize_url.clone());
        Ok(self.code.clone())
    }
}

/// Prompt that fails the test if it is ever asked.
pub struct PanicPrompt;

impl AuthCodePrompt for PanicPrompt {
    fn authorization_code(&self, _authorize_url: &Url) -> coppercloud::Result<String> {
        panic!("interactive login must not be triggered");
    }
}
