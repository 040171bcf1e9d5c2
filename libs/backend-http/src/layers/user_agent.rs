use crate::error::HttpError;
use http::{HeaderValue, Request};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that stamps a User-Agent on requests that carry none
#[derive(Clone)]
pub struct UserAgentLayer {
    user_agent: HeaderValue,
}

impl UserAgentLayer {
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the string is not a valid header value
    pub fn try_new(user_agent: impl AsRef<str>) -> Result<Self, HttpError> {
        let user_agent = HeaderValue::from_str(user_agent.as_ref())?;
        Ok(Self { user_agent })
    }
}

impl<S> Layer<S> for UserAgentLayer {
    type Service = UserAgentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        UserAgentService {
            inner,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Clone)]
pub struct UserAgentService<S> {
    inner: S,
    user_agent: HeaderValue,
}

impl<S, ReqBody> Service<Request<ReqBody>> for UserAgentService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        req.headers_mut()
            .entry(http::header::USER_AGENT)
            .or_insert_with(|| self.user_agent.clone());
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Response;
    use tower::ServiceExt;

    async fn sent_user_agent(layer: &UserAgentLayer, req: Request<()>) -> Option<HeaderValue> {
        let echo = tower::service_fn(|req: Request<()>| async move {
            Ok::<_, std::convert::Infallible>(Response::new(
                req.headers().get(http::header::USER_AGENT).cloned(),
            ))
        });
        layer.layer(echo).oneshot(req).await.unwrap().into_body()
    }

    #[tokio::test]
    async fn adds_missing_user_agent() {
        let layer = UserAgentLayer::try_new("users-client/1.0").unwrap();
        let req = Request::get("http://backend.local/users").body(()).unwrap();

        let ua = sent_user_agent(&layer, req).await;
        assert_eq!(ua, Some(HeaderValue::from_static("users-client/1.0")));
    }

    #[tokio::test]
    async fn keeps_caller_user_agent() {
        let layer = UserAgentLayer::try_new("users-client/1.0").unwrap();
        let req = Request::get("http://backend.local/users")
            .header(http::header::USER_AGENT, "admin-console/2.0")
            .body(())
            .unwrap();

        let ua = sent_user_agent(&layer, req).await;
        assert_eq!(ua, Some(HeaderValue::from_static("admin-console/2.0")));
    }

    #[test]
    fn rejects_control_characters() {
        assert!(UserAgentLayer::try_new("bad\x00agent").is_err());
    }
}
