/// Error taxonomy for calls against the Intelink backend.
///
/// API methods return `ApiError` unchanged apart from lifting the backend's
/// message text out of the response body. Callers at the command boundary
/// turn it into a user-facing string with `to_string()`.
use serde_json::Value;
use thiserror::Error;

/// Message shown when no HTTP response was received at all.
pub const NETWORK_MESSAGE: &str = "Unable to reach the server. Please check your connection.";

/// A single field-level validation message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// No response received (DNS, refused connection, timeout).
    #[error("{}", NETWORK_MESSAGE)]
    Network { detail: String },

    /// 401 from the backend.
    #[error("{message}")]
    Unauthorized { message: String },

    /// 403 from the backend.
    #[error("{message}")]
    Forbidden { message: String },

    /// 400 from the backend, or a client-side check that failed before any
    /// request was sent.
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("{message}")]
    NotFound { message: String },

    /// 409 from the backend.
    #[error("{message}")]
    Conflict { message: String },

    #[error("{message} (HTTP {status})")]
    Server { status: u16, message: String },

    /// The response arrived but its body did not match the expected shape.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// Local precondition failed (bad base URL, missing session, ...).
    #[error("{0}")]
    Client(String),
}

impl ApiError {
    /// True when the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Network { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Build the error for a non-2xx response.
    ///
    /// The backend message is taken from the body when present, otherwise a
    /// generic message for the status is used.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let message = parsed
            .as_ref()
            .and_then(backend_message)
            .unwrap_or_else(|| generic_message(status).to_string());

        match status {
            400 | 422 => ApiError::Validation {
                message,
                fields: parsed.as_ref().map(field_errors).unwrap_or_default(),
            },
            401 => ApiError::Unauthorized { message },
            403 => ApiError::Forbidden { message },
            404 => ApiError::NotFound { message },
            409 => ApiError::Conflict { message },
            _ => ApiError::Server { status, message },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network {
                detail: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        let message = fields
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_else(|| "Invalid input".to_string());

        ApiError::Validation { message, fields }
    }
}

fn backend_message(body: &Value) -> Option<String> {
    ["message", "error", "detail"]
        .iter()
        .filter_map(|key| body.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

// Spring-style `{"errors": {"field": "msg"}}` or `[{"field": .., "message": ..}]`
fn field_errors(body: &Value) -> Vec<FieldError> {
    match body.get("errors") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(field, msg)| {
                msg.as_str().map(|m| FieldError {
                    field: field.clone(),
                    message: m.to_string(),
                })
            })
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                Some(FieldError {
                    field: item.get("field")?.as_str()?.to_string(),
                    message: item
                        .get("message")
                        .or_else(|| item.get("defaultMessage"))?
                        .as_str()?
                        .to_string(),
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn generic_message(status: u16) -> &'static str {
    match status {
        400 | 422 => "The request was invalid",
        401 => "Authentication required",
        403 => "You do not have permission to perform this action",
        404 => "The requested resource was not found",
        409 => "The resource already exists",
        500..=599 => "The server encountered an error",
        _ => "Request failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_is_used() {
        let err = ApiError::from_status(404, br#"{"message": "Short URL not found"}"#);
        assert!(matches!(err, ApiError::NotFound { .. }));
        assert_eq!(err.to_string(), "Short URL not found");
    }

    #[test]
    fn test_generic_message_when_body_empty() {
        let err = ApiError::from_status(500, b"");
        assert_eq!(err.to_string(), "The server encountered an error (HTTP 500)");
    }

    #[test]
    fn test_error_key_fallback() {
        let err = ApiError::from_status(409, br#"{"error": "Username already exists"}"#);
        assert!(matches!(err, ApiError::Conflict { .. }));
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[test]
    fn test_validation_fields_object() {
        let body = br#"{"message": "Validation failed", "errors": {"originalUrl": "must be a URL"}}"#;
        match ApiError::from_status(400, body) {
            ApiError::Validation { message, fields } => {
                assert_eq!(message, "Validation failed");
                assert_eq!(
                    fields,
                    vec![FieldError {
                        field: "originalUrl".to_string(),
                        message: "must be a URL".to_string()
                    }]
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validation_fields_array() {
        let body = br#"{"errors": [{"field": "email", "defaultMessage": "bad email"}]}"#;
        match ApiError::from_status(400, body) {
            ApiError::Validation { fields, .. } => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "email");
                assert_eq!(fields[0].message, "bad email");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_network_is_transport() {
        let err = ApiError::Network {
            detail: "dns error".to_string(),
        };
        assert!(err.is_transport());
        assert_eq!(err.to_string(), NETWORK_MESSAGE);
        assert!(!ApiError::from_status(502, b"").is_transport());
    }
}
