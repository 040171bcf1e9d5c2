//! Static endpoint table and immutable request descriptors.

use http::Method;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use url::Url;
use users_sdk::{CacheTag, UsersError};

/// What a successful call does to the query cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagEffect {
    Provides(CacheTag),
    Invalidates(CacheTag),
}

/// One segment of a path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPart {
    Literal(&'static str),
    /// Filled with the caller's id, encoded as a single segment
    Id,
}

#[derive(Debug)]
pub struct Endpoint {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static [PathPart],
    pub has_body: bool,
    pub effect: TagEffect,
}

impl Endpoint {
    fn takes_id(&self) -> bool {
        self.path.contains(&PathPart::Id)
    }
}

use PathPart::{Id, Literal};
use TagEffect::{Invalidates, Provides};

pub static CREATE_USER: Endpoint = Endpoint {
    name: "create_user",
    method: Method::POST,
    path: &[Literal("users")],
    has_body: true,
    effect: Invalidates(CacheTag::Users),
};

pub static UPDATE_USER: Endpoint = Endpoint {
    name: "update_user",
    method: Method::PATCH,
    path: &[Literal("users"), Id],
    has_body: true,
    effect: Invalidates(CacheTag::Users),
};

pub static DELETE_USER: Endpoint = Endpoint {
    name: "delete_user",
    method: Method::DELETE,
    path: &[Literal("users"), Id],
    has_body: false,
    effect: Invalidates(CacheTag::Users),
};

pub static DELETE_USERS: Endpoint = Endpoint {
    name: "delete_users",
    method: Method::DELETE,
    path: &[Literal("users"), Literal("deactivate"), Literal("all")],
    has_body: true,
    effect: Invalidates(CacheTag::Users),
};

pub static REACTIVATE_USERS: Endpoint = Endpoint {
    name: "reactivate_users",
    method: Method::PATCH,
    path: &[Literal("users"), Literal("reactivate"), Literal("all")],
    has_body: true,
    effect: Invalidates(CacheTag::Users),
};

pub static GET_USERS: Endpoint = Endpoint {
    name: "get_users",
    method: Method::GET,
    path: &[Literal("users")],
    has_body: false,
    effect: Provides(CacheTag::Users),
};

pub static GENERATE_PASSWORD: Endpoint = Endpoint {
    name: "generate_password",
    method: Method::POST,
    path: &[Literal("users"), Literal("generate-password")],
    has_body: false,
    effect: Invalidates(CacheTag::Users),
};

pub static SEND_NEW_PASSWORD: Endpoint = Endpoint {
    name: "send_new_password",
    method: Method::POST,
    path: &[Literal("users"), Literal("send-new-password")],
    has_body: true,
    effect: Invalidates(CacheTag::Users),
};

pub static ENDPOINTS: [&Endpoint; 8] = [
    &CREATE_USER,
    &UPDATE_USER,
    &DELETE_USER,
    &DELETE_USERS,
    &REACTIVATE_USERS,
    &GET_USERS,
    &GENERATE_PASSWORD,
    &SEND_NEW_PASSWORD,
];

/// A fully resolved request: method, path segments and JSON body.
///
/// Built once per call and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    endpoint: &'static Endpoint,
    segments: Vec<String>,
    body: Option<Value>,
}

impl RequestDescriptor {
    /// Descriptor for an endpoint without a body.
    ///
    /// # Errors
    /// `UsersError::InvalidRequest` when the id does not match the path
    /// template or the endpoint requires a body.
    pub fn new(endpoint: &'static Endpoint, id: Option<&str>) -> Result<Self, UsersError> {
        Self::build(endpoint, id, None)
    }

    /// Descriptor carrying `body` serialized as JSON.
    ///
    /// # Errors
    /// `UsersError::InvalidRequest` when the id does not match the path
    /// template, the endpoint takes no body, or `body` fails to serialize.
    pub fn with_body<T: Serialize + ?Sized>(
        endpoint: &'static Endpoint,
        id: Option<&str>,
        body: &T,
    ) -> Result<Self, UsersError> {
        let body = serde_json::to_value(body)
            .map_err(|e| UsersError::InvalidRequest(format!("{}: {e}", endpoint.name)))?;
        Self::build(endpoint, id, Some(body))
    }

    fn build(
        endpoint: &'static Endpoint,
        id: Option<&str>,
        body: Option<Value>,
    ) -> Result<Self, UsersError> {
        let invalid =
            |reason: &str| UsersError::InvalidRequest(format!("{}: {reason}", endpoint.name));

        if endpoint.has_body != body.is_some() {
            return Err(invalid(if endpoint.has_body {
                "request body required"
            } else {
                "endpoint takes no request body"
            }));
        }

        let segments = match (endpoint.takes_id(), id) {
            (true, Some(id)) if !id.is_empty() => endpoint
                .path
                .iter()
                .map(|part| match part {
                    Literal(s) => (*s).to_owned(),
                    Id => id.to_owned(),
                })
                .collect(),
            (true, _) => return Err(invalid("user id must not be empty")),
            (false, None) => endpoint
                .path
                .iter()
                .filter_map(|part| match part {
                    Literal(s) => Some((*s).to_owned()),
                    Id => None,
                })
                .collect(),
            (false, Some(_)) => return Err(invalid("endpoint takes no user id")),
        };

        Ok(Self {
            endpoint,
            segments,
            body,
        })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.endpoint.name
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.endpoint.method
    }

    /// Raw, unencoded path segments
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn effect(&self) -> TagEffect {
        self.endpoint.effect
    }

    /// Resolve against `base`, percent-encoding each segment on its own.
    ///
    /// # Errors
    /// `UsersError::Config` if `base` cannot carry a path.
    pub fn url(&self, base: &Url) -> Result<Url, UsersError> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|()| UsersError::Config(format!("invalid backend base URL: {base}")))?
            .pop_if_empty()
            .extend(&self.segments);
        Ok(url)
    }
}

impl fmt::Display for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.endpoint.method, self.segments.join("/"))
    }
}
