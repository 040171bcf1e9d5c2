//! Wire models for the users backend.
//!
//! Fields the client does not interpret are kept in a flattened map so they
//! round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// User account as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// Every other backend field (name, role, active flag, timestamps...)
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl User {
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

/// Body of `POST /users`; the backend answers with the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CreateUserRequest {
    pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Partial user update. Absent fields are not serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserPatch {
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.extra.is_empty()
    }
}

/// Target user plus patch. Only `patch` goes on the wire; `id` lands in the path.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateUserRequest {
    pub id: String,
    pub patch: UserPatch,
}

impl UpdateUserRequest {
    pub fn new(id: impl Into<String>, patch: UserPatch) -> Self {
        Self {
            id: id.into(),
            patch,
        }
    }
}

/// Response of `PATCH /users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub data: User,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// Body of the bulk endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIds {
    pub ids: Vec<String>,
}

impl<S: Into<String>> FromIterator<S> for UserIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body of `POST /users/send-new-password`; echoed back on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendNewPasswordRequest {
    pub email: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SendNewPasswordRequest {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            extra: Map::new(),
        }
    }
}

/// Opaque payload of `POST /users/generate-password`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneratedPassword(pub Value);

impl GeneratedPassword {
    /// The generated password when the payload is a bare string or carries a
    /// `password` field.
    #[must_use]
    pub fn password(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) => Some(s),
            Value::Object(map) => map.get("password").and_then(Value::as_str),
            _ => None,
        }
    }
}
