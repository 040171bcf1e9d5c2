//! Error types for the users client.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by [`UsersClientV1`](crate::UsersClientV1) operations.
#[derive(Debug, Error)]
pub enum UsersError {
    /// No response was received (connection, TLS, timeout, overload).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        /// Backend `message`, or the raw body when it carries none
        message: String,
        /// Parsed error body, if it was JSON
        body: Option<Value>,
    },

    /// A 2xx body could not be decoded into the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// The request was rejected before anything was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl UsersError {
    /// Build an HTTP status error from the raw error body.
    ///
    /// Understands the backend's `{statusCode, message, error}` envelope, where
    /// `message` is either a string or a list of validation messages.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let message = parsed
            .as_ref()
            .and_then(envelope_message)
            .unwrap_or_else(|| {
                let trimmed = body.trim();
                if trimmed.is_empty() {
                    format!("request failed with status {status}")
                } else {
                    trimmed.to_owned()
                }
            });

        UsersError::Http {
            status,
            message,
            body: parsed,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            UsersError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn envelope_message(body: &Value) -> Option<String> {
    let message = match body.get("message") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(items)) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
        _ => None,
    };
    message.or_else(|| body.get("error").and_then(Value::as_str).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_message() {
        let err = UsersError::from_status(
            409,
            r#"{"statusCode":409,"message":"email already registered","error":"Conflict"}"#,
        );
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "HTTP 409: email already registered");
    }

    #[test]
    fn validation_messages_are_joined() {
        let err = UsersError::from_status(
            400,
            r#"{"statusCode":400,"message":["email must be an email","name should not be empty"]}"#,
        );
        match err {
            UsersError::Http { message, body, .. } => {
                assert_eq!(message, "email must be an email; name should not be empty");
                assert!(body.is_some());
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_error_field_then_raw_body() {
        let err = UsersError::from_status(401, r#"{"statusCode":401,"error":"Unauthorized"}"#);
        assert_eq!(err.to_string(), "HTTP 401: Unauthorized");

        let err = UsersError::from_status(502, "Bad Gateway");
        assert_eq!(err.to_string(), "HTTP 502: Bad Gateway");

        let err = UsersError::from_status(404, "");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "HTTP 404: request failed with status 404");
    }

    #[test]
    fn non_http_errors_have_no_status() {
        assert_eq!(UsersError::Transport("reset".into()).status(), None);
        assert_eq!(UsersError::Decode("eof".into()).status(), None);
    }
}
