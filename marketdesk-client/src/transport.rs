//! HTTP transport.

use crate::auth::AuthSession;
use crate::envelope::ApiResponse;
use crate::request::ApiRequest;
use async_trait::async_trait;
use marketdesk_core::{ConsoleError, ConsoleResult};
use serde_json::Value;
use std::time::Duration;

/// Sends one [`ApiRequest`] and returns the raw response.
///
/// Only connection-level failures are errors here; status codes and the
/// response envelope are interpreted by the caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ApiRequest) -> ConsoleResult<ApiResponse>;
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
}

/// reqwest-backed transport. Injects the base URL and the bearer token.
#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth: AuthSession,
}

impl RestClient {
    pub fn new(settings: &ClientSettings, auth: AuthSession) -> ConsoleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ConsoleError::transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: settings.api_base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for RestClient {
    async fn send(&self, request: &ApiRequest) -> ConsoleResult<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if request.authenticated {
            if let Some(token) = self.auth.token() {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = %request.method, path = %request.path, "sending request");
        let response = builder.send().await.map_err(|err| {
            tracing::error!(
                method = %request.method,
                path = %request.path,
                timeout = err.is_timeout(),
                error = %err,
                "request failed"
            );
            ConsoleError::transport(err.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|err| ConsoleError::transport(err.to_string()))?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };
        tracing::debug!(status, path = %request.path, "response received");
        Ok(ApiResponse::new(status, body))
    }
}
