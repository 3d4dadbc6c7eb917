//! HTTP client wrapper for the Volley API

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::error::{ApiError, ApiResult};

/// Production API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.volleyhooks.com";

/// Upper bound for every API call, so a stalled request never blocks the relay.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// User agent sent to the API and, by default, to forward targets.
pub const USER_AGENT: &str = concat!("Volley-CLI/", env!("CARGO_PKG_VERSION"));

/// Maximum length of an error body kept in [`ApiError::Status`].
const ERROR_BODY_PREVIEW: usize = 500;

/// API client for the Volley REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url` without a credential.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Attach a bearer credential.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Authenticated GET returning a decoded JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.get_json_with_query(path, &[]).await
    }

    /// Authenticated GET with query parameters (URL-encoded by reqwest).
    pub(crate) async fn get_json_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        let request = self.authorize(self.http.get(self.url(path)).query(query));
        self.send(path, request).await
    }

    /// Authenticated POST with an empty JSON object body.
    pub(crate) async fn post_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        let request = self.authorize(
            self.http
                .post(self.url(path))
                .json(&serde_json::Value::Object(serde_json::Map::new())),
        );
        self.send(path, request).await
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> ApiResult<T> {
        let response = request.send().await?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "API response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
