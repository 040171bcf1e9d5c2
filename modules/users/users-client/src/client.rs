use async_trait::async_trait;
use backend_http::{HttpClient, HttpClientBuilder, HttpError};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::instrument;
use url::Url;
use users_sdk::{
    CacheTag, CreateUserRequest, GeneratedPassword, SendNewPasswordRequest, UpdateUserRequest,
    User, UserIds, UserUpdate, UsersClientV1, UsersError,
};

use crate::cache::QueryCache;
use crate::config::UsersClientConfig;
use crate::endpoints::{self, RequestDescriptor, TagEffect};
use crate::subscription::UsersSubscription;

/// Users backend client.
///
/// Cheap to clone; clones share the transport, the cookie jar and the query
/// cache. Exposed to consumers as `Arc<dyn UsersClientV1>`.
#[derive(Clone)]
pub struct UsersClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: HttpClient,
    base_url: Url,
    cache: QueryCache<Vec<User>>,
}

impl UsersClient {
    /// Build the transport from `config` and resolve the base URL once.
    ///
    /// # Errors
    /// `UsersError::Config` for an invalid configuration or a transport that
    /// cannot be initialized.
    pub fn new(config: &UsersClientConfig) -> Result<Self, UsersError> {
        let base_url = config.validate()?;
        let http = HttpClientBuilder::with_config(config.http_config())
            .build()
            .map_err(|e| UsersError::Config(format!("failed to build HTTP client: {e}")))?;
        Self::from_parts(http, base_url)
    }

    /// Wrap an existing transport.
    ///
    /// # Errors
    /// `UsersError::Config` if `base_url` cannot carry a path.
    pub fn from_parts(http: HttpClient, base_url: Url) -> Result<Self, UsersError> {
        if base_url.cannot_be_a_base() {
            return Err(UsersError::Config(format!(
                "invalid backend base URL: {base_url}"
            )));
        }
        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url,
                cache: QueryCache::new(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    #[must_use]
    pub fn cache(&self) -> &QueryCache<Vec<User>> {
        &self.inner.cache
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    /// Observe the cached user list; dropping the handle unsubscribes.
    #[must_use]
    pub fn subscribe_users(&self) -> UsersSubscription {
        UsersSubscription::new(self.clone(), self.inner.cache.watch(CacheTag::Users))
    }

    /// Send `desc` and return the raw 2xx body; invalidations apply here.
    async fn execute(&self, desc: &RequestDescriptor) -> Result<Bytes, UsersError> {
        let url = desc.url(&self.inner.base_url)?;

        let mut request = self
            .inner
            .http
            .request(desc.method().clone(), url.as_str())
            .header("accept", "application/json");
        if let Some(body) = desc.body() {
            request = request.json(body).map_err(map_http_error)?;
        }

        let response = request.send().await.map_err(map_http_error)?;
        tracing::debug!(request = %desc, status = %response.status(), "users backend responded");
        let body = response.checked_bytes().await.map_err(|e| {
            tracing::debug!(request = %desc, error = %e, "users backend call failed");
            map_http_error(e)
        })?;

        if let TagEffect::Invalidates(tag) = desc.effect() {
            self.inner.cache.invalidate(tag);
        }
        Ok(body)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        desc: &RequestDescriptor,
    ) -> Result<T, UsersError> {
        let body = self.execute(desc).await?;
        decode(desc, &body)
    }

    /// Serve `GET /users` from the cache or the backend.
    ///
    /// Fetches are serialized per tag; a caller that waited for another fetch
    /// re-checks the cache before going to the network.
    async fn load_users(&self, force: bool) -> Result<Arc<Vec<User>>, UsersError> {
        let cache = &self.inner.cache;
        let tag = CacheTag::Users;

        if !force && let Some(users) = cache.fresh(tag) {
            tracing::trace!("users served from cache");
            return Ok(users);
        }

        let _fetch = cache.lock_fetch(tag).await;
        if !force && let Some(users) = cache.fresh(tag) {
            tracing::trace!("users fetched by a concurrent caller");
            return Ok(users);
        }

        let ticket = cache.ticket(tag);
        let desc = RequestDescriptor::new(&endpoints::GET_USERS, None)?;
        let users: Vec<User> = self.execute_json(&desc).await?;
        tracing::debug!(count = users.len(), "users fetched");
        Ok(cache.store(ticket, users))
    }
}

#[async_trait]
impl UsersClientV1 for UsersClient {
    #[instrument(skip_all, fields(email = %req.email))]
    async fn create_user(&self, req: CreateUserRequest) -> Result<CreateUserRequest, UsersError> {
        let desc = RequestDescriptor::with_body(&endpoints::CREATE_USER, None, &req)?;
        self.execute_json(&desc).await
    }

    #[instrument(skip_all, fields(user_id = %req.id))]
    async fn update_user(&self, req: UpdateUserRequest) -> Result<UserUpdate, UsersError> {
        let desc =
            RequestDescriptor::with_body(&endpoints::UPDATE_USER, Some(&req.id), &req.patch)?;
        self.execute_json(&desc).await
    }

    #[instrument(skip_all, fields(user_id = %id))]
    async fn delete_user(&self, id: &str) -> Result<User, UsersError> {
        let desc = RequestDescriptor::new(&endpoints::DELETE_USER, Some(id))?;
        self.execute_json(&desc).await
    }

    #[instrument(skip_all, fields(count = ids.ids.len()))]
    async fn delete_users(&self, ids: UserIds) -> Result<(), UsersError> {
        let desc = RequestDescriptor::with_body(&endpoints::DELETE_USERS, None, &ids)?;
        self.execute(&desc).await.map(drop)
    }

    #[instrument(skip_all, fields(count = ids.ids.len()))]
    async fn reactivate_users(&self, ids: UserIds) -> Result<(), UsersError> {
        let desc = RequestDescriptor::with_body(&endpoints::REACTIVATE_USERS, None, &ids)?;
        self.execute(&desc).await.map(drop)
    }

    #[instrument(skip_all)]
    async fn get_users(&self) -> Result<Arc<Vec<User>>, UsersError> {
        self.load_users(false).await
    }

    #[instrument(skip_all)]
    async fn refetch_users(&self) -> Result<Arc<Vec<User>>, UsersError> {
        self.load_users(true).await
    }

    #[instrument(skip_all)]
    async fn generate_password(&self) -> Result<GeneratedPassword, UsersError> {
        let desc = RequestDescriptor::new(&endpoints::GENERATE_PASSWORD, None)?;
        let body = self.execute(&desc).await?;
        if body.is_empty() {
            return Ok(GeneratedPassword(serde_json::Value::Null));
        }
        decode(&desc, &body)
    }

    #[instrument(skip_all, fields(email = %req.email))]
    async fn send_new_password(
        &self,
        req: SendNewPasswordRequest,
    ) -> Result<SendNewPasswordRequest, UsersError> {
        let desc = RequestDescriptor::with_body(&endpoints::SEND_NEW_PASSWORD, None, &req)?;
        self.execute_json(&desc).await
    }
}

fn decode<T: DeserializeOwned>(desc: &RequestDescriptor, body: &[u8]) -> Result<T, UsersError> {
    serde_json::from_slice(body).map_err(|e| UsersError::Decode(format!("{}: {e}", desc.name())))
}

fn map_http_error(err: HttpError) -> UsersError {
    match err {
        HttpError::HttpStatus {
            status,
            body_preview,
            ..
        } => UsersError::from_status(status.as_u16(), &body_preview),
        HttpError::Json(e) => UsersError::Decode(e.to_string()),
        e @ (HttpError::InvalidUri { .. } | HttpError::InvalidScheme { .. }) => {
            UsersError::Config(e.to_string())
        }
        e @ (HttpError::InvalidHeaderName(_)
        | HttpError::InvalidHeaderValue(_)
        | HttpError::RequestBuild(_)) => UsersError::InvalidRequest(e.to_string()),
        e => UsersError::Transport(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;
    use std::time::Duration;

    #[test]
    fn status_errors_keep_backend_message() {
        let err = map_http_error(HttpError::HttpStatus {
            status: StatusCode::CONFLICT,
            body_preview: r#"{"statusCode":409,"message":"email taken"}"#.to_owned(),
            content_type: Some("application/json".to_owned()),
        });
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "HTTP 409: email taken");
    }

    #[test]
    fn transport_and_config_errors() {
        assert!(matches!(
            map_http_error(HttpError::Timeout(Duration::from_secs(30))),
            UsersError::Transport(_)
        ));
        assert!(matches!(
            map_http_error(HttpError::Overloaded),
            UsersError::Transport(_)
        ));
        assert!(matches!(
            map_http_error(HttpError::InvalidScheme {
                scheme: "http".to_owned(),
                reason: "HTTPS required".to_owned(),
            }),
            UsersError::Config(_)
        ));
    }

    #[tokio::test]
    async fn new_rejects_invalid_config() {
        let config = UsersClientConfig::default();
        assert!(matches!(UsersClient::new(&config), Err(UsersError::Config(_))));
    }

    #[tokio::test]
    async fn new_resolves_base_url_once() {
        let config = UsersClientConfig {
            backend_url: "https://backend.example.com/api".to_owned(),
            ..UsersClientConfig::default()
        };
        let client = UsersClient::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "https://backend.example.com/api");
        assert!(client.http().cookie_jar().is_some());
    }
}
