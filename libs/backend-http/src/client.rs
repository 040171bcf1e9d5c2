use crate::config::TransportSecurity;
use crate::error::HttpError;
use crate::layers::CookieJar;
use crate::request::RequestBuilder;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Method, Request, Response};
use http_body_util::Full;
use std::future::Future;
use std::pin::Pin;
use tower::Service;
use tower::buffer::Buffer;

/// Future type of the boxed inner service
pub type ServiceFuture =
    Pin<Box<dyn Future<Output = Result<Response<ResponseBody>, HttpError>> + Send>>;

/// Buffered service shared by every clone of the client
pub type BufferedService = Buffer<Request<Full<Bytes>>, ServiceFuture>;

/// HTTP client over a tower service stack
///
/// Stack: buffer → cookie jar (optional) → timeout → user agent → decompression → hyper.
///
/// `HttpClient` is `Clone + Send + Sync`; clones share the connection pool and
/// the cookie jar. No external locking is needed.
///
/// URLs must be absolute (`https://host/path`); plain `http://` requires
/// [`TransportSecurity::AllowInsecureHttp`].
#[derive(Clone)]
pub struct HttpClient {
    pub(crate) service: BufferedService,
    pub(crate) max_body_size: usize,
    pub(crate) transport_security: TransportSecurity,
    pub(crate) cookie_jar: Option<CookieJar>,
}

impl HttpClient {
    /// Cookie jar used for `CredentialsMode::Include`, `None` when credentials are omitted.
    #[must_use]
    pub fn cookie_jar(&self) -> Option<&CookieJar> {
        self.cookie_jar.as_ref()
    }

    /// Start a request; the URL must be absolute.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        RequestBuilder::new(
            self.service.clone(),
            self.max_body_size,
            method,
            url.to_owned(),
            self.transport_security,
        )
    }
}

/// Map buffer errors to `HttpError`
///
/// The buffer either forwards the inner service error or reports that its
/// worker is gone.
pub fn map_buffer_error(err: tower::BoxError) -> HttpError {
    match err.downcast::<HttpError>() {
        Ok(http_err) => *http_err,
        Err(err) => {
            tracing::error!(
                error = %err,
                "buffer worker closed unexpectedly; service unavailable"
            );
            HttpError::ServiceClosed
        }
    }
}

/// Reserve a buffer slot without waiting; a full buffer yields `HttpError::Overloaded`.
pub async fn try_acquire_buffer_slot(service: &mut BufferedService) -> Result<(), HttpError> {
    use std::task::Poll;

    let poll_result = std::future::poll_fn(|cx| match service.poll_ready(cx) {
        Poll::Ready(result) => Poll::Ready(Some(result)),
        Poll::Pending => Poll::Ready(None),
    })
    .await;

    match poll_result {
        Some(Ok(())) => Ok(()),
        Some(Err(e)) => Err(map_buffer_error(e)),
        None => Err(HttpError::Overloaded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HttpClientBuilder;
    use crate::config::{CredentialsMode, HttpClientConfig};
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_client() -> HttpClient {
        HttpClientBuilder::with_config(HttpClientConfig::for_testing())
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn get_returns_body() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200)
                .json_body(json!([{"id": "u1", "email": "a@b.c"}]));
        });

        let client = test_client();
        let body = client
            .request(Method::GET, &server.url("/users"))
            .send()
            .await
            .unwrap()
            .checked_bytes()
            .await
            .unwrap();
        let users: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(users[0]["id"], "u1");
    }

    #[tokio::test]
    async fn patch_sends_json_body_and_headers() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PATCH)
                .path("/users/u1")
                .header("content-type", "application/json")
                .header("accept", "application/json")
                .json_body(json!({"name": "Bob"}));
            then.status(200).json_body(json!({"ok": true}));
        });

        let client = test_client();
        let resp = client
            .request(Method::PATCH, &server.url("/users/u1"))
            .header("accept", "application/json")
            .json(&json!({"name": "Bob"}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
        mock.assert();
    }

    #[tokio::test]
    async fn delete_with_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(DELETE)
                .path("/users/deactivate/all")
                .json_body(json!({"ids": ["a", "b"]}));
            then.status(204);
        });

        let client = test_client();
        let resp = client
            .request(Method::DELETE, &server.url("/users/deactivate/all"))
            .json(&json!({"ids": ["a", "b"]}))
            .unwrap()
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::NO_CONTENT);
        mock.assert_calls(1);
    }

    #[tokio::test]
    async fn invalid_header_fails_before_sending() {
        let client = test_client();
        let result = client
            .request(Method::GET, "http://127.0.0.1:9/users")
            .header("bad header", "x")
            .send()
            .await;
        assert!(matches!(result, Err(HttpError::InvalidHeaderName(_))));

        let result = client
            .request(Method::POST, "http://127.0.0.1:9/users")
            .header("accept", "bad\nvalue")
            .json(&json!({}));
        assert!(matches!(result, Err(HttpError::InvalidHeaderValue(_))));
    }

    #[tokio::test]
    async fn non_2xx_is_ok_until_checked() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST).path("/users");
            then.status(500)
                .header("content-type", "application/json")
                .body(r#"{"statusCode":500,"message":"db down"}"#);
        });

        let client = test_client();
        let resp = client
            .request(Method::POST, &server.url("/users"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);

        match resp.checked_bytes().await {
            Err(HttpError::HttpStatus {
                status,
                body_preview,
                ..
            }) => {
                assert_eq!(status, http::StatusCode::INTERNAL_SERVER_ERROR);
                assert!(body_preview.contains("db down"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn session_cookie_is_replayed() {
        let server = MockServer::start();
        let login = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200)
                .header("set-cookie", "sid=abc; Path=/; HttpOnly")
                .json_body(json!([]));
        });
        let with_cookie = server.mock(|when, then| {
            when.method(POST)
                .path("/users/generate-password")
                .header("cookie", "sid=abc");
            then.status(200).json_body(json!({"password": "x"}));
        });

        let client = test_client();
        client
            .request(Method::GET, &server.url("/users"))
            .send()
            .await
            .unwrap();
        let resp = client
            .request(Method::POST, &server.url("/users/generate-password"))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::OK);
        login.assert();
        with_cookie.assert();
        assert_eq!(
            client.cookie_jar().unwrap().get("sid").as_deref(),
            Some("abc")
        );
    }

    #[tokio::test]
    async fn omitted_credentials_send_no_cookie() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200)
                .header("set-cookie", "sid=abc")
                .json_body(json!([]));
        });
        let without_cookie = server.mock(|when, then| {
            when.method(POST)
                .path("/users/generate-password")
                .header_missing("cookie");
            then.status(200).json_body(json!({"password": "x"}));
        });

        let config = HttpClientConfig {
            credentials: CredentialsMode::Omit,
            ..HttpClientConfig::for_testing()
        };
        let client = HttpClientBuilder::with_config(config).build().unwrap();
        assert!(client.cookie_jar().is_none());

        client
            .request(Method::GET, &server.url("/users"))
            .send()
            .await
            .unwrap();
        let resp = client
            .request(Method::POST, &server.url("/users/generate-password"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        without_cookie.assert_calls(1);
    }

    #[tokio::test]
    async fn tls_only_rejects_http_urls() {
        let client = HttpClientBuilder::with_config(HttpClientConfig::default())
            .build()
            .unwrap();
        let result = client
            .request(Method::GET, "http://backend.local/users")
            .send()
            .await;
        assert!(matches!(result, Err(HttpError::InvalidScheme { .. })));
    }

    #[tokio::test]
    async fn relative_url_is_rejected() {
        let client = test_client();
        let result = client.request(Method::GET, "/users").send().await;
        assert!(matches!(
            result,
            Err(HttpError::InvalidUri {
                kind: crate::InvalidUriKind::MissingAuthority,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn concurrent_clones_share_the_stack() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/users");
            then.status(200).json_body(json!([]));
        });

        let client = test_client();
        let url = server.url("/users");
        let handles: Vec<_> = (0..20)
            .map(|_| {
                let client = client.clone();
                let url = url.clone();
                tokio::spawn(async move { client.request(Method::GET, &url).send().await })
            })
            .collect();

        for handle in handles {
            let resp = handle.await.unwrap().unwrap();
            assert_eq!(resp.status(), http::StatusCode::OK);
        }
        mock.assert_calls(20);
    }

    #[test]
    fn http_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpClient>();
    }
}
