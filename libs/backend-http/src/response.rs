use crate::error::HttpError;
use bytes::Bytes;
use http::{HeaderMap, Response, StatusCode};
use http_body_util::BodyExt;

/// Maximum body preview kept in `HttpError::HttpStatus` (8 KB).
pub const ERROR_BODY_PREVIEW_LIMIT: usize = 8 * 1024;

/// Boxed response body; already decompressed when the server used
/// gzip, br or deflate.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Response whose body has not been read yet.
///
/// The status is available right away; [`checked_bytes`](Self::checked_bytes)
/// reads the body under the configured `max_body_size`.
#[derive(Debug)]
pub struct HttpResponse {
    pub(crate) inner: Response<ResponseBody>,
    pub(crate) max_body_size: usize,
}

impl HttpResponse {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.inner.status()
    }

    /// Read the body; non-2xx responses become `HttpError::HttpStatus`
    /// carrying a preview of the error body.
    ///
    /// # Errors
    /// Returns `HttpError::HttpStatus` if status is not 2xx.
    /// Returns `HttpError::BodyTooLarge` if body exceeds limit.
    pub async fn checked_bytes(self) -> Result<Bytes, HttpError> {
        let status = self.inner.status();
        if status.is_success() {
            return read_body_limited(self.inner, self.max_body_size).await;
        }

        let content_type = content_type(self.inner.headers());
        // An oversized error body must not hide the status itself
        let preview_limit = self.max_body_size.min(ERROR_BODY_PREVIEW_LIMIT);
        let body_preview = match read_body_limited(self.inner, preview_limit).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(HttpError::BodyTooLarge { .. }) => "<body too large for preview>".to_owned(),
            Err(e) => return Err(e),
        };

        Err(HttpError::HttpStatus {
            status,
            body_preview,
            content_type,
        })
    }
}

fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

/// The limit applies to decompressed bytes.
async fn read_body_limited(
    response: Response<ResponseBody>,
    limit: usize,
) -> Result<Bytes, HttpError> {
    let mut body = std::pin::pin!(response.into_body());
    let mut collected = Vec::new();

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(HttpError::Transport)?;
        if let Some(chunk) = frame.data_ref() {
            if collected.len() + chunk.len() > limit {
                return Err(HttpError::BodyTooLarge {
                    limit,
                    actual: collected.len() + chunk.len(),
                });
            }
            collected.extend_from_slice(chunk);
        }
    }

    Ok(Bytes::from(collected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response(status: StatusCode, body: &'static str, max_body_size: usize) -> HttpResponse {
        let body: ResponseBody = Full::new(Bytes::from_static(body.as_bytes()))
            .map_err(|never| match never {})
            .boxed();
        let inner = Response::builder()
            .status(status)
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        HttpResponse {
            inner,
            max_body_size,
        }
    }

    #[tokio::test]
    async fn success_body_is_returned() {
        let resp = response(StatusCode::OK, r#"{"id":"u1"}"#, 1024);
        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.checked_bytes().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], "u1");
    }

    #[tokio::test]
    async fn error_status_keeps_body_preview() {
        let resp = response(
            StatusCode::BAD_REQUEST,
            r#"{"statusCode":400,"message":"email taken"}"#,
            1024,
        );
        match resp.checked_bytes().await {
            Err(HttpError::HttpStatus {
                status,
                body_preview,
                content_type,
            }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body_preview.contains("email taken"));
                assert_eq!(content_type.as_deref(), Some("application/json"));
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_error_body_still_reports_status() {
        let resp = response(StatusCode::BAD_GATEWAY, "0123456789", 4);
        match resp.checked_bytes().await {
            Err(HttpError::HttpStatus { body_preview, .. }) => {
                assert_eq!(body_preview, "<body too large for preview>");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_limit_applies_to_success() {
        let resp = response(StatusCode::OK, "0123456789", 4);
        assert!(matches!(
            resp.checked_bytes().await,
            Err(HttpError::BodyTooLarge { limit: 4, .. })
        ));
    }

    #[tokio::test]
    async fn empty_no_content_body() {
        let resp = response(StatusCode::NO_CONTENT, "", 16);
        assert!(resp.checked_bytes().await.unwrap().is_empty());
    }
}
