//! Error types for the X-Road SOAP client.

use thiserror::Error;

/// Errors surfaced by the client and its collaborators.
///
/// The client never retries or suppresses any of these; whatever a
/// serializer, transport or deserializer reports reaches the caller as-is.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The destination locator is malformed. Raised before any I/O.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection setup, send or receive failed.
    #[error("Transport failure: {0}")]
    Transport(String),

    /// A request could not be turned into an envelope.
    #[error("Serialization failure: {0}")]
    Serialization(String),

    /// A reply envelope could not be turned into a response.
    #[error("Deserialization failure: {0}")]
    Deserialization(String),

    /// Malformed protocol-level content, e.g. an incomplete identifier.
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn is_invalid_endpoint(&self) -> bool {
        matches!(self, Self::InvalidEndpoint(_))
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization(_))
    }

    pub fn is_deserialization(&self) -> bool {
        matches!(self, Self::Deserialization(_))
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<quick_xml::Error> for ClientError {
    fn from(err: quick_xml::Error) -> Self {
        Self::Deserialization(format!("XML parse error: {}", err))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Escape text for inclusion in XML content or attribute values.
pub(crate) fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::InvalidEndpoint("ht!tp://bad".to_string());
        assert_eq!(err.to_string(), "Invalid endpoint: ht!tp://bad");

        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "Transport failure: connection refused");
    }

    #[test]
    fn test_error_predicates() {
        assert!(ClientError::InvalidEndpoint(String::new()).is_invalid_endpoint());
        assert!(ClientError::Transport(String::new()).is_transport());
        assert!(ClientError::Serialization(String::new()).is_serialization());
        assert!(ClientError::Deserialization(String::new()).is_deserialization());
        assert!(!ClientError::Protocol(String::new()).is_transport());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ClientError = io.into();
        assert!(matches!(err, ClientError::Io(_)));
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(
            xml_escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &apos;Jerry&apos;&lt;/a&gt;"
        );
    }
}
