//! Infrastructure layer for Quill.
//!
//! Concrete adapters for the ports defined in `quill-core`: an HTTP
//! client for the instance API, configuration loading and tracing setup.

pub mod config;
pub mod http;
pub mod paths;
pub mod telemetry;

pub use config::QuillConfig;
pub use http::ReqwestApiClient;
pub use paths::QuillPaths;
