//! Client configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. `users-client.yaml` in the working directory, or an explicit file
//! 3. `USERS_CLIENT_*` environment variables
//! 4. `NEXT_PUBLIC_BACKEND_URL`, then `BACKEND_URL`, for the base URL

use backend_http::{CredentialsMode, HttpClientConfig, TlsRootConfig, TransportSecurity};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;
use users_sdk::UsersError;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("backend_url is not set")]
    MissingBackendUrl,

    #[error("invalid backend_url `{url}`: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("invalid session_cookie: expected `name=value`")]
    InvalidSessionCookie,

    #[error("request_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

impl From<ConfigError> for UsersError {
    fn from(err: ConfigError) -> Self {
        UsersError::Config(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsersClientConfig {
    /// Base URL every endpoint path is resolved against
    pub backend_url: String,
    pub credentials: CredentialsMode,
    /// Seed cookie for the jar, as `name=value`
    pub session_cookie: Option<String>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Permit `http://` base URLs
    pub allow_insecure_http: bool,
    pub max_body_size: usize,
    /// Root store for HTTPS: `webpki` (bundled) or `native` (OS store)
    pub tls_roots: TlsRootConfig,
}

impl Default for UsersClientConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            credentials: CredentialsMode::Include,
            session_cookie: None,
            request_timeout_secs: 30,
            user_agent: concat!("users-client/", env!("CARGO_PKG_VERSION")).to_owned(),
            allow_insecure_http: false,
            max_body_size: backend_http::DEFAULT_MAX_BODY_SIZE,
            tls_roots: TlsRootConfig::WebPki,
        }
    }
}

impl UsersClientConfig {
    pub const DEFAULT_CONFIG_FILE: &'static str = "users-client.yaml";
    pub const ENV_PREFIX: &'static str = "USERS_CLIENT_";

    /// Load and validate configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` when `file` does not exist, a source cannot be
    /// parsed, or the result fails [`validate`](Self::validate).
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file
            && !path.exists()
        {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }

        let config: Self = Self::figment(file)
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))?;
        config.validate()?;

        tracing::debug!(
            backend_url = %config.backend_url,
            credentials = ?config.credentials,
            timeout_secs = config.request_timeout_secs,
            "users client configuration loaded"
        );
        Ok(config)
    }

    pub fn figment(file: Option<&Path>) -> Figment {
        let file = file.map_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILE), Path::to_path_buf);

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Yaml::file(file))
            .merge(Env::prefixed(Self::ENV_PREFIX))
            // Aliases shared with the web frontend's environment
            .merge(
                Env::raw()
                    .only(&["NEXT_PUBLIC_BACKEND_URL"])
                    .map(|_| "backend_url".into()),
            )
            .merge(
                Env::raw()
                    .only(&["BACKEND_URL"])
                    .map(|_| "backend_url".into()),
            )
    }

    /// Check the configuration and resolve the base URL.
    ///
    /// # Errors
    /// Returns `ConfigError` for a missing or unusable base URL, a plain
    /// `http://` URL without `allow_insecure_http`, a zero timeout, or a
    /// malformed session cookie.
    pub fn validate(&self) -> Result<Url, ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.session_cookie.is_some() && self.session_cookie_pair().is_none() {
            return Err(ConfigError::InvalidSessionCookie);
        }
        self.base_url()
    }

    /// Parsed base URL.
    ///
    /// # Errors
    /// See [`validate`](Self::validate).
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = self.backend_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingBackendUrl);
        }

        let invalid = |reason: &str| ConfigError::InvalidBackendUrl {
            url: raw.to_owned(),
            reason: reason.to_owned(),
        };

        let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
        match url.scheme() {
            "https" => {}
            "http" if self.allow_insecure_http => {}
            "http" => return Err(invalid("plain http requires allow_insecure_http")),
            _ => return Err(invalid("scheme must be http or https")),
        }
        if url.cannot_be_a_base() || url.host().is_none() {
            return Err(invalid("not a base URL"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed"));
        }
        Ok(url)
    }

    fn session_cookie_pair(&self) -> Option<(String, String)> {
        let (name, value) = self.session_cookie.as_deref()?.split_once('=')?;
        let name = name.trim();
        (!name.is_empty()).then(|| (name.to_owned(), value.trim().to_owned()))
    }

    /// Transport settings derived from this configuration.
    #[must_use]
    pub fn http_config(&self) -> HttpClientConfig {
        let transport = if self.allow_insecure_http {
            TransportSecurity::AllowInsecureHttp
        } else {
            TransportSecurity::TlsOnly
        };

        HttpClientConfig {
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_body_size: self.max_body_size,
            user_agent: self.user_agent.clone(),
            transport,
            tls_roots: self.tls_roots,
            credentials: self.credentials,
            initial_cookies: self.session_cookie_pair().into_iter().collect(),
            ..HttpClientConfig::default()
        }
    }
}
