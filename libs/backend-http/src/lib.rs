#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! HTTP transport for the backend REST clients
//!
//! A hyper-based client with:
//! - TLS via rustls (HTTPS only by default)
//! - Connection pooling
//! - Per-request timeouts
//! - User-Agent header injection
//! - A session cookie jar (`CredentialsMode::Include`)
//! - Transparent response decompression (gzip, brotli, deflate)
//!
//! Body size limits apply to decompressed bytes.
//!
//! # Example
//!
//! ```ignore
//! use backend_http::{HttpClientBuilder, HttpClientConfig};
//! use http::Method;
//!
//! let client = HttpClientBuilder::with_config(HttpClientConfig::default()).build()?;
//!
//! let body = client
//!     .request(Method::GET, "https://backend.example.com/users")
//!     .send()
//!     .await?
//!     .checked_bytes()
//!     .await?;
//! ```

mod builder;
mod client;
mod config;
mod error;
mod layers;
mod request;
mod response;
mod tls;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{
    CredentialsMode, DEFAULT_MAX_BODY_SIZE, DEFAULT_USER_AGENT, HttpClientConfig, TlsRootConfig,
    TransportSecurity,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{CookieJar, CookieJarLayer, CookieJarService, UserAgentLayer, UserAgentService};
pub use request::RequestBuilder;
pub use response::{ERROR_BODY_PREVIEW_LIMIT, HttpResponse, ResponseBody};
