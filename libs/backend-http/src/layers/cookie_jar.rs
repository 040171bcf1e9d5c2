//! Session cookie handling for `CredentialsMode::Include`.
//!
//! The jar is shared by every clone of the client. Responses feed it through
//! their `Set-Cookie` headers; requests draw a single `Cookie` header from it.

use http::header::{COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Request, Response};
use parking_lot::Mutex;
use pin_project_lite::pin_project;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Cookie store keyed by cookie name
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    cookies: Arc<Mutex<BTreeMap<String, String>>>,
}

impl CookieJar {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.lock().insert(name.into(), value.into());
    }

    pub fn remove(&self, name: &str) {
        self.cookies.lock().remove(name);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.cookies.lock().get(name).cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.lock().is_empty()
    }

    /// Render the jar as a `Cookie` header value, `None` when empty.
    #[must_use]
    pub fn header_value(&self) -> Option<HeaderValue> {
        let cookies = self.cookies.lock();
        if cookies.is_empty() {
            return None;
        }
        let joined = cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    /// Apply every `Set-Cookie` header in `headers` to the jar.
    pub fn store_from(&self, headers: &HeaderMap) {
        for raw in headers.get_all(SET_COOKIE) {
            let Ok(raw) = raw.to_str() else {
                tracing::debug!("ignoring non-ASCII Set-Cookie header");
                continue;
            };
            match parse_set_cookie(raw) {
                Some(SetCookie::Store { name, value }) => self.insert(name, value),
                Some(SetCookie::Expire { name }) => self.remove(&name),
                None => tracing::debug!(header = raw, "ignoring malformed Set-Cookie header"),
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SetCookie {
    Store { name: String, value: String },
    Expire { name: String },
}

/// Only `name=value` and `Max-Age` matter here; other attributes are dropped.
fn parse_set_cookie(raw: &str) -> Option<SetCookie> {
    let mut parts = raw.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim().trim_matches('"');

    let expired = parts.any(|attr| {
        attr.split_once('=').is_some_and(|(key, val)| {
            key.trim().eq_ignore_ascii_case("max-age")
                && val.trim().parse::<i64>().is_ok_and(|secs| secs <= 0)
        })
    });

    if expired || value.is_empty() {
        Some(SetCookie::Expire {
            name: name.to_owned(),
        })
    } else {
        Some(SetCookie::Store {
            name: name.to_owned(),
            value: value.to_owned(),
        })
    }
}

/// Tower layer attaching a [`CookieJar`] to the inner service
#[derive(Clone, Debug)]
pub struct CookieJarLayer {
    jar: CookieJar,
}

impl CookieJarLayer {
    #[must_use]
    pub fn new(jar: CookieJar) -> Self {
        Self { jar }
    }
}

impl<S> Layer<S> for CookieJarLayer {
    type Service = CookieJarService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CookieJarService {
            inner,
            jar: self.jar.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct CookieJarService<S> {
    inner: S,
    jar: CookieJar,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CookieJarService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = CookieFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        if !req.headers().contains_key(COOKIE)
            && let Some(value) = self.jar.header_value()
        {
            req.headers_mut().insert(COOKIE, value);
        }
        CookieFuture {
            inner: self.inner.call(req),
            jar: self.jar.clone(),
        }
    }
}

pin_project! {
    /// Response future that records `Set-Cookie` headers into the jar.
    pub struct CookieFuture<F> {
        #[pin]
        inner: F,
        jar: CookieJar,
    }
}

impl<F, ResBody, E> Future for CookieFuture<F>
where
    F: Future<Output = Result<Response<ResBody>, E>>,
{
    type Output = F::Output;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        let result = std::task::ready!(this.inner.poll(cx));
        if let Ok(response) = &result {
            this.jar.store_from(response.headers());
        }
        Poll::Ready(result)
    }
}
