use crate::endpoint::Endpoint;
use crate::xml::XmlElement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Error reported by a device in the body of a control-surface response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Numeric error code (`value` attribute); -1 when absent
    pub code: i32,
    /// Short error token, e.g. `HTTP_STATUS_UNAUTHORIZED`
    pub name: String,
    pub severity: String,
    /// Element text, or the name when the device sent no text
    pub message: String,
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} (code={}, severity={})",
            self.name, self.message, self.code, self.severity
        )
    }
}

/// Detect either error-envelope shape in a parsed response.
///
/// `<errors><error .../></errors>` uses the nested `error` element; a bare
/// `<error .../>` or `<Error .../>` root is the error element itself.
pub fn check_for_errors(root: &XmlElement) -> Option<ErrorEnvelope> {
    let element = match root.name() {
        "errors" => root.child("error").unwrap_or(root),
        "error" | "Error" => root,
        _ => return None,
    };

    let name = element.attr("name").unwrap_or("NONE").to_owned();
    let message = match element.text().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_owned(),
        _ => name.clone(),
    };

    Some(ErrorEnvelope {
        code: element.attr_or("value", -1),
        severity: element.attr("severity").unwrap_or("NONE").to_owned(),
        name,
        message,
    })
}

/// Result of a single pipeline call
#[derive(Debug, Clone)]
pub struct SoundTouchMessage {
    endpoint: Endpoint,
    request_body: Option<String>,
    status: u16,
    response: Option<XmlElement>,
    error: Option<ErrorEnvelope>,
}

impl SoundTouchMessage {
    pub(crate) fn new(endpoint: Endpoint, request_body: Option<String>) -> Self {
        Self {
            endpoint,
            request_body,
            status: 0,
            response: None,
            error: None,
        }
    }

    pub(crate) fn set_response(&mut self, status: u16, response: Option<XmlElement>) {
        self.status = status;
        self.error = response.as_ref().and_then(check_for_errors);
        self.response = response;
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// Serialized request body, for `POST` calls
    pub fn request_body(&self) -> Option<&str> {
        self.request_body.as_deref()
    }

    /// HTTP status; 0 when no request was sent
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Parsed response tree; `None` for empty bodies
    pub fn response(&self) -> Option<&XmlElement> {
        self.response.as_ref()
    }

    pub fn into_response(self) -> Option<XmlElement> {
        self.response
    }

    /// Error envelope found in the response, if any
    pub fn error(&self) -> Option<&ErrorEnvelope> {
        self.error.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// True when no request was sent and nothing came back
    pub fn is_empty(&self) -> bool {
        self.status == 0 && self.response.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_errors_envelope() {
        let root = XmlElement::parse(
            r#"<errors deviceID="AAA"><error value="401" name="HTTP_STATUS_UNAUTHORIZED" severity="Unknown">unauthorized</error></errors>"#,
        )
        .unwrap();
        let envelope = check_for_errors(&root).unwrap();
        assert_eq!(envelope.code, 401);
        assert_eq!(envelope.name, "HTTP_STATUS_UNAUTHORIZED");
        assert_eq!(envelope.severity, "Unknown");
        assert_eq!(envelope.message, "unauthorized");
    }

    #[test]
    fn test_bare_error_defaults_message_to_name() {
        let root = XmlElement::parse(
            r#"<Error value="415" name="HTTP_STATUS_UNSUPPORTED_MEDIA_TYPE" severity="Unknown" />"#,
        )
        .unwrap();
        let envelope = check_for_errors(&root).unwrap();
        assert_eq!(envelope.code, 415);
        assert_eq!(envelope.message, "HTTP_STATUS_UNSUPPORTED_MEDIA_TYPE");
    }

    #[test]
    fn test_missing_attributes_use_defaults() {
        let root = XmlElement::parse("<error>boom</error>").unwrap();
        let envelope = check_for_errors(&root).unwrap();
        assert_eq!(envelope.code, -1);
        assert_eq!(envelope.name, "NONE");
        assert_eq!(envelope.severity, "NONE");
        assert_eq!(envelope.message, "boom");
    }

    #[test]
    fn test_regular_document_is_not_an_error() {
        let root = XmlElement::parse("<status>/volume</status>").unwrap();
        assert!(check_for_errors(&root).is_none());
    }
}
