//! One-shot HTTP helper.
//!
//! Performs a single GET or POST and classifies the status code. It never
//! retries; re-authentication lives in [`CopperClient`](crate::CopperClient).

use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::error::{CopperError, FailedResponse, Result};

const USER_AGENT: &str = concat!("coppercloud/", env!("CARGO_PKG_VERSION"));

/// Low-level HTTP helper shared by the token manager and the API client.
///
/// Cheaply cloneable; clones share the underlying connection pool.
#[derive(Clone)]
pub struct HttpHelper {
    http: Client,
    debug: bool,
}

impl std::fmt::Debug for HttpHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpHelper")
            .field("debug", &self.debug)
            .finish_non_exhaustive()
    }
}

impl HttpHelper {
    /// Create a helper with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration, debug: bool) -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .brotli(true)
            .gzip(true)
            .deflate(true)
            .timeout(timeout)
            .build()
            .map_err(CopperError::HttpError)?;

        Ok(Self { http, debug })
    }

    /// Make a GET request and return the JSON body of a 200 response.
    #[tracing::instrument(skip(self, url, authorization), fields(url = %url))]
    pub async fn get(&self, url: Url, authorization: Option<&str>) -> Result<Value> {
        let request = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json");
        self.send(Method::GET, request, authorization, None).await
    }

    /// Make a POST request with a JSON body and return the JSON body of a 200 response.
    #[tracing::instrument(skip(self, url, authorization, body), fields(url = %url))]
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        authorization: Option<&str>,
        body: &B,
    ) -> Result<Value> {
        let dump = if self.debug {
            serde_json::to_string(body).ok()
        } else {
            None
        };
        let request = self.http.post(url).json(body);
        self.send(Method::POST, request, authorization, dump).await
    }

    async fn send(
        &self,
        method: Method,
        request: RequestBuilder,
        authorization: Option<&str>,
        request_body: Option<String>,
    ) -> Result<Value> {
        let request = match authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };
        let request = request.build().map_err(CopperError::HttpError)?;
        if self.debug {
            tracing::debug!(
                target: "coppercloud::wire",
                "> {} {}\n{}\n{}",
                method,
                request.url(),
                format_headers(request.headers()),
                request_body.as_deref().unwrap_or("")
            );
        }

        let response = self
            .http
            .execute(request)
            .await
            .map_err(CopperError::HttpError)?;

        self.classify(method, response).await
    }

    /// Check the response status and convert errors.
    async fn classify(&self, method: Method, response: Response) -> Result<Value> {
        let status = response.status();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(CopperError::HttpError)?;

        if self.debug {
            tracing::debug!(
                target: "coppercloud::wire",
                "< {} {}\n{}\n{}",
                status,
                url,
                format_headers(&headers),
                body
            );
        }

        if status == StatusCode::OK {
            return Ok(serde_json::from_str(&body)?);
        }

        let failed = FailedResponse {
            method: method.to_string(),
            url,
            status: status.as_u16(),
            body,
        };
        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CopperError::Unauthorized(failed),
            StatusCode::BAD_REQUEST => CopperError::ClientError(failed),
            _ => CopperError::RequestError(failed),
        })
    }
}

/// Render headers one per line, keeping only the scheme of `Authorization`.
fn format_headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            let value = value.to_str().unwrap_or("<binary>");
            if name == AUTHORIZATION {
                let scheme = value.split_whitespace().next().unwrap_or("");
                format!("{name}: {scheme} <redacted>")
            } else {
                format!("{name}: {value}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
