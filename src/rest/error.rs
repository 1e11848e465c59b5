//! REST error taxonomy
//!
//! Every failure the console can see on the wire falls into one of these
//! buckets. The alert layer treats them differently: business rejections
//! carry the server's message verbatim, authorization rejections are traced
//! but never toasted (outer infrastructure owns those), everything else
//! becomes a generic transient notification.

use std::fmt;

/// Errors raised by the REST client
#[derive(Debug)]
pub enum RestError {
    /// No response at all: DNS, connect, TLS, or mid-body failure
    Transport(reqwest::Error),

    /// Non-2xx response with no usable business message
    Http { status: u16, body: String },

    /// Non-2xx response whose body carried a server-side rule message
    /// (e.g. "Cannot disable the domain of the current user")
    Business(String),

    /// 403-class rejection; deliberately not surfaced as a generic error
    Forbidden,

    /// Client-side validation failure, raised before any request is sent
    Validation(String),
}

impl RestError {
    /// Whether the alert layer should show this error to the operator
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, RestError::Forbidden)
    }

    /// The message to render in an alert
    pub fn user_message(&self) -> String {
        match self {
            RestError::Transport(e) => format!("Request failed: {}", e),
            RestError::Http { status, body } => {
                if body.is_empty() {
                    format!("Server returned HTTP {}", status)
                } else {
                    format!("Server returned HTTP {}: {}", status, body)
                }
            }
            RestError::Business(msg) => msg.clone(),
            RestError::Forbidden => "Not authorized".to_string(),
            RestError::Validation(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for RestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestError::Transport(e) => write!(f, "transport error: {}", e),
            RestError::Http { status, .. } => write!(f, "http error: status {}", status),
            RestError::Business(msg) => write!(f, "business rule: {}", msg),
            RestError::Forbidden => write!(f, "forbidden"),
            RestError::Validation(msg) => write!(f, "validation: {}", msg),
        }
    }
}

impl std::error::Error for RestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RestError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RestError {
    fn from(e: reqwest::Error) -> Self {
        RestError::Transport(e)
    }
}

/// Classify a non-2xx response into the taxonomy.
///
/// The gateway reports rule violations as JSON `{"message": "..."}` bodies;
/// when that shape is present the message is surfaced verbatim as a
/// business rejection.
pub fn classify_status(status: u16, body: &str) -> RestError {
    if status == 403 {
        return RestError::Forbidden;
    }

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            if !message.is_empty() {
                return RestError::Business(message.to_string());
            }
        }
    }

    RestError::Http {
        status,
        body: body.chars().take(300).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forbidden_is_not_user_visible() {
        let err = classify_status(403, "");
        assert!(matches!(err, RestError::Forbidden));
        assert!(!err.is_user_visible());
    }

    #[test]
    fn test_business_message_extracted_from_json_body() {
        let err = classify_status(400, r#"{"message":"Cannot disable the domain of the current user"}"#);
        match err {
            RestError::Business(msg) => {
                assert_eq!(msg, "Cannot disable the domain of the current user")
            }
            other => panic!("expected Business, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_body_maps_to_http_error() {
        let err = classify_status(500, "oops");
        match err {
            RestError::Http { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "oops");
            }
            other => panic!("expected Http, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_message_field_is_not_business() {
        let err = classify_status(400, r#"{"message":""}"#);
        assert!(matches!(err, RestError::Http { .. }));
    }
}
