//! The HTTP client port.
//!
//! The data layer treats the client as an opaque transport. Auth headers,
//! retries, rate limiting and timeouts are the implementation's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::Result;

/// HTTP methods used by the data layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An abstract REST client for a Mastodon-compatible API.
///
/// Paths are relative to the instance root (e.g. `/api/v1/accounts/1`).
/// Non-2xx responses must be reported as [`QuillError::Transport`] with
/// the HTTP status attached so callers can tell 404s apart.
///
/// [`QuillError::Transport`]: crate::error::QuillError::Transport
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Sends a request and returns the decoded JSON body.
    ///
    /// Empty bodies decode to `Value::Null`.
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value>;

    async fn get(&self, path: &str) -> Result<Value> {
        self.request(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.request(Method::Post, path, body).await
    }

    async fn patch(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.request(Method::Patch, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<Value> {
        self.request(Method::Delete, path, None).await
    }
}

/// REST paths for the entities this layer knows about.
pub mod paths {
    pub fn account(id: &str) -> String {
        format!("/api/v1/accounts/{id}")
    }

    pub fn account_relationships(id: &str) -> String {
        format!("/api/v1/accounts/relationships?id[]={id}")
    }

    pub fn group(id: &str) -> String {
        format!("/api/v1/groups/{id}")
    }

    pub fn group_relationships(id: &str) -> String {
        format!("/api/v1/groups/relationships?id[]={id}")
    }

    pub fn join_group(id: &str) -> String {
        format!("/api/v1/groups/{id}/join")
    }

    pub fn leave_group(id: &str) -> String {
        format!("/api/v1/groups/{id}/leave")
    }
}
