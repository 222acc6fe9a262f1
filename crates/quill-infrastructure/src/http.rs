//! `reqwest`-backed implementation of the [`ApiClient`] port.

use async_trait::async_trait;
use quill_core::{ApiClient, Method, QuillError, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::QuillConfig;

const USER_AGENT: &str = concat!("quill/", env!("CARGO_PKG_VERSION"));

/// Talks to a Mastodon-compatible REST API.
///
/// Non-2xx responses become [`QuillError::Transport`] carrying the status
/// and the server's `error` message when it sends one.
#[derive(Clone)]
pub struct ReqwestApiClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl ReqwestApiClient {
    /// `timeout` bounds each request; `None` waits indefinitely.
    pub fn new(
        base_url: impl Into<String>,
        access_token: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| QuillError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        })
    }

    pub fn from_config(config: &QuillConfig) -> Result<Self> {
        Self::new(
            config.base_url()?,
            config.instance.access_token.clone(),
            config.timeout(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Maps a `reqwest` failure onto the transport error.
pub fn transport_error(err: reqwest::Error) -> QuillError {
    let status = err.status().map(|s| s.as_u16());
    let message = if err.is_timeout() {
        format!("request timed out: {err}")
    } else {
        err.to_string()
    };
    QuillError::transport(status, message)
}

/// Extracts the human-readable message from an error body.
///
/// Mastodon reports failures as `{ "error": "..." }`; anything else is
/// passed through as text.
fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

fn decode_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[async_trait]
impl ApiClient for ReqwestApiClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = self.url(path);
        tracing::debug!(%method, %url, "sending request");

        let mut request = self.client.request(to_reqwest(method), &url);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = error_message(&String::from_utf8_lossy(&bytes), status);
            tracing::debug!(%method, %url, status = status.as_u16(), %message, "request failed");
            return Err(QuillError::transport(Some(status.as_u16()), message));
        }

        decode_body(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn client(base_url: &str) -> ReqwestApiClient {
        ReqwestApiClient::new(base_url, None, Some(Duration::from_secs(1))).unwrap()
    }

    #[test]
    fn test_url_joining() {
        assert_eq!(
            client("https://mastodon.example/").url("/api/v1/accounts/1"),
            "https://mastodon.example/api/v1/accounts/1"
        );
        assert_eq!(
            client("https://mastodon.example").url("api/v1/groups/7"),
            "https://mastodon.example/api/v1/groups/7"
        );
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let err = ReqwestApiClient::from_config(&QuillConfig::default()).err().unwrap();
        assert!(matches!(err, QuillError::Config(_)));
    }

    #[test]
    fn test_from_config_accepts_disabled_timeout() {
        let config = QuillConfig::parse(
            "[instance]\nbase_url = \"https://mastodon.example\"\ntimeout_secs = 0\n",
        )
        .unwrap();

        let client = ReqwestApiClient::from_config(&config).unwrap();

        assert_eq!(client.base_url(), "https://mastodon.example");
    }

    #[test]
    fn test_error_message_prefers_mastodon_error_field() {
        let body = json!({ "error": "Record not found" }).to_string();
        assert_eq!(error_message(&body, StatusCode::NOT_FOUND), "Record not found");
    }

    #[test]
    fn test_error_message_falls_back_to_text_then_reason() {
        assert_eq!(
            error_message("  upstream down ", StatusCode::BAD_GATEWAY),
            "upstream down"
        );
        assert_eq!(error_message("", StatusCode::NOT_FOUND), "Not Found");
    }

    #[test]
    fn test_empty_body_decodes_to_null() {
        assert_eq!(decode_body(b"").unwrap(), Value::Null);
        assert_eq!(decode_body(b" \n").unwrap(), Value::Null);
        assert_eq!(decode_body(b"{\"id\":\"1\"}").unwrap(), json!({ "id": "1" }));
        assert!(decode_body(b"<html>").is_err());
    }
}
