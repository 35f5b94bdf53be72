//! Request and response messages.

use crate::constants::{DEFAULT_PROTOCOL_VERSION, SOAP_11_NS, SOAP_12_NS, TEXT_XML_UTF8};
use crate::helper::generate_id;
use crate::member::{non_empty, ConsumerMember, ProducerMember};

/// SOAP versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    /// SOAP 1.1 (namespace: http://schemas.xmlsoap.org/soap/envelope/)
    Soap11,
    /// SOAP 1.2 (namespace: http://www.w3.org/2003/05/soap-envelope)
    Soap12,
}

impl SoapVersion {
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Soap11 => SOAP_11_NS,
            Self::Soap12 => SOAP_12_NS,
        }
    }

    pub fn from_namespace(uri: &str) -> Option<Self> {
        match uri {
            SOAP_11_NS => Some(Self::Soap11),
            SOAP_12_NS => Some(Self::Soap12),
            _ => None,
        }
    }
}

/// A SOAP envelope as exchanged on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoapMessage {
    xml: String,
    content_type: String,
}

impl SoapMessage {
    /// Wrap envelope text with the default `text/xml` content type.
    pub fn new(xml: impl Into<String>) -> Self {
        Self {
            xml: xml.into(),
            content_type: TEXT_XML_UTF8.to_string(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn as_str(&self) -> &str {
        &self.xml
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn len(&self) -> usize {
        self.xml.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xml.is_empty()
    }

    pub fn into_string(self) -> String {
        self.xml
    }
}

/// A typed service invocation.
///
/// Built by the caller; the client only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    /// Unique request id, echoed by the producer
    pub id: String,
    pub consumer: ConsumerMember,
    pub producer: ProducerMember,
    pub user_id: Option<String>,
    pub issue: Option<String>,
    pub protocol_version: String,
    /// Raw XML placed in the request body
    pub request_data: Option<String>,
}

impl ServiceRequest {
    /// A request with a freshly generated id.
    pub fn new(consumer: ConsumerMember, producer: ProducerMember) -> Self {
        Self::with_id(consumer, producer, generate_id())
    }

    pub fn with_id(consumer: ConsumerMember, producer: ProducerMember, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            consumer,
            producer,
            user_id: None,
            issue: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            request_data: None,
        }
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = non_empty(Some(user_id.into()));
        self
    }

    pub fn issue(mut self, issue: impl Into<String>) -> Self {
        self.issue = non_empty(Some(issue.into()));
        self
    }

    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn request_data(mut self, xml: impl Into<String>) -> Self {
        self.request_data = non_empty(Some(xml.into()));
        self
    }
}

/// A SOAP fault carried in a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoapFault {
    pub code: String,
    pub string: String,
    pub actor: Option<String>,
    pub detail: Option<String>,
}

/// A typed reply, produced only by a deserializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceResponse {
    /// Request id echoed by the producer
    pub id: Option<String>,
    pub consumer: Option<ConsumerMember>,
    pub producer: Option<ProducerMember>,
    pub user_id: Option<String>,
    pub issue: Option<String>,
    pub protocol_version: Option<String>,
    pub request_hash: Option<String>,
    /// Namespace the body was read in
    pub namespace_url: Option<String>,
    /// Echoed request wrapper content
    pub request_data: Option<String>,
    /// Response payload
    pub response_data: Option<String>,
    pub fault: Option<SoapFault>,
}

impl ServiceResponse {
    pub fn has_fault(&self) -> bool {
        self.fault.is_some()
    }
}
