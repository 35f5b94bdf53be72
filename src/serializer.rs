//! Request serialization.
//!
//! [`ServiceRequestSerializer`] is the capability the client consumes;
//! [`XRoadRequestSerializer`] writes X-Road 4.0 SOAP 1.1 envelopes.

use crate::config::MessageConfig;
use crate::constants::{
    DEFAULT_PRODUCER_NS_PREFIX, DEFAULT_PROCESSING_WRAPPERS, DEFAULT_PROTOCOL_VERSION,
    ELEM_REQUEST_WRAPPER,
    NS_ID_ATTR_OBJECT_TYPE, NS_ID_ELEM_MEMBER_CLASS, NS_ID_ELEM_MEMBER_CODE,
    NS_ID_ELEM_SERVICE_CODE, NS_ID_ELEM_SERVICE_VERSION, NS_ID_ELEM_SUBSYSTEM_CODE,
    NS_ID_ELEM_XROAD_INSTANCE, NS_ID_PREFIX, NS_ID_URL, NS_XRD_ELEM_CENTRAL_SERVICE,
    NS_XRD_ELEM_CLIENT, NS_XRD_ELEM_ID, NS_XRD_ELEM_ISSUE, NS_XRD_ELEM_PROTOCOL_VERSION,
    NS_XRD_ELEM_SERVICE, NS_XRD_ELEM_USER_ID, NS_XRD_PREFIX, NS_XRD_URL, SOAP_11_NS,
    SOAP_ENV_PREFIX,
};
use crate::error::{xml_escape, ClientError};
use crate::member::{ConsumerMember, ObjectType, ProducerMember};
use crate::message::{ServiceRequest, SoapMessage};
use tracing::debug;

/// Turns a [`ServiceRequest`] into a wire envelope.
///
/// Implementations must embed the request id, both identifiers with their
/// object types, the protocol version and the payload. Failures are reported
/// as [`ClientError::Serialization`].
pub trait ServiceRequestSerializer {
    fn serialize(&self, request: &ServiceRequest) -> Result<SoapMessage, ClientError>;
}

/// Writes X-Road 4.0 message protocol envelopes.
#[derive(Debug, Clone)]
pub struct XRoadRequestSerializer {
    /// Wrap the payload in a `<request>` element
    process_wrappers: bool,
    /// Producer namespace prefix used when the producer declares none
    default_prefix: String,
    /// Protocol version written when the request carries the stock one
    protocol_version: String,
}

impl Default for XRoadRequestSerializer {
    fn default() -> Self {
        Self {
            process_wrappers: DEFAULT_PROCESSING_WRAPPERS,
            default_prefix: DEFAULT_PRODUCER_NS_PREFIX.to_string(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
        }
    }
}

impl XRoadRequestSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MessageConfig) -> Self {
        Self {
            process_wrappers: config.process_wrappers,
            default_prefix: config.default_namespace_prefix.clone(),
            protocol_version: config.protocol_version.clone(),
        }
    }

    pub fn with_wrappers(mut self, process_wrappers: bool) -> Self {
        self.process_wrappers = process_wrappers;
        self
    }

    fn validate(&self, request: &ServiceRequest) -> Result<(), ClientError> {
        let missing = |what: &str| {
            Err(ClientError::Serialization(format!(
                "Request {} is missing {}",
                request.id, what
            )))
        };

        if request.id.is_empty() {
            return missing("an id");
        }
        if request.protocol_version.is_empty() {
            return missing("a protocol version");
        }

        let consumer = &request.consumer;
        if consumer.x_road_instance.is_empty()
            || consumer.member_class.is_empty()
            || consumer.member_code.is_empty()
        {
            return missing("a complete client identifier");
        }

        let producer = &request.producer;
        if producer.x_road_instance.is_empty() || producer.service_code.is_empty() {
            return missing("a complete service identifier");
        }
        if producer.object_type() == ObjectType::Service && producer.member_code.is_empty() {
            return missing("the service provider's member code");
        }

        // Both end up in an element name, which cannot be escaped
        if !is_xml_name(&producer.service_code) {
            return Err(ClientError::Serialization(format!(
                "Service code '{}' is not a valid XML element name",
                producer.service_code
            )));
        }
        if self.namespace_url(request).is_some() {
            let prefix = self.prefix(request);
            if !is_xml_name(prefix) {
                return Err(ClientError::Serialization(format!(
                    "Namespace prefix '{}' is not a valid XML name",
                    prefix
                )));
            }
        }
        Ok(())
    }

    fn namespace_url<'a>(&self, request: &'a ServiceRequest) -> Option<&'a str> {
        request.producer.namespace_url.as_deref().filter(|ns| !ns.is_empty())
    }

    fn prefix<'a>(&'a self, request: &'a ServiceRequest) -> &'a str {
        request
            .producer
            .namespace_prefix
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(self.default_prefix.as_str())
    }

    /// The configured version replaces the stock one; explicit versions win.
    fn protocol_version<'a>(&'a self, request: &'a ServiceRequest) -> &'a str {
        if request.protocol_version == DEFAULT_PROTOCOL_VERSION {
            &self.protocol_version
        } else {
            &request.protocol_version
        }
    }

    fn header(&self, request: &ServiceRequest) -> String {
        let mut header = String::new();
        header.push_str(&client_block(&request.consumer));
        header.push_str(&service_block(&request.producer));
        if let Some(user_id) = &request.user_id {
            header.push_str(&xrd_element(NS_XRD_ELEM_USER_ID, user_id));
        }
        header.push_str(&xrd_element(NS_XRD_ELEM_ID, &request.id));
        if let Some(issue) = &request.issue {
            header.push_str(&xrd_element(NS_XRD_ELEM_ISSUE, issue));
        }
        header.push_str(&xrd_element(
            NS_XRD_ELEM_PROTOCOL_VERSION,
            self.protocol_version(request),
        ));
        header
    }

    fn body(&self, request: &ServiceRequest) -> String {
        let producer = &request.producer;
        let payload = request.request_data.as_deref().unwrap_or("");
        let content = if self.process_wrappers {
            if payload.is_empty() {
                format!("<{}/>", ELEM_REQUEST_WRAPPER)
            } else {
                format!("<{0}>{1}</{0}>", ELEM_REQUEST_WRAPPER, payload)
            }
        } else {
            payload.to_string()
        };

        match self.namespace_url(request) {
            Some(ns) => {
                let prefix = self.prefix(request);
                format!(
                    r#"<{prefix}:{op} xmlns:{prefix}="{ns}">{content}</{prefix}:{op}>"#,
                    prefix = prefix,
                    op = producer.service_code,
                    ns = xml_escape(ns),
                    content = content,
                )
            }
            None => format!(
                "<{op}>{content}</{op}>",
                op = producer.service_code,
                content = content
            ),
        }
    }
}

impl ServiceRequestSerializer for XRoadRequestSerializer {
    fn serialize(&self, request: &ServiceRequest) -> Result<SoapMessage, ClientError> {
        self.validate(request)?;

        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><{env}:Envelope xmlns:{env}="{soap}" xmlns:{xrd}="{xrd_ns}" xmlns:{id}="{id_ns}"><{env}:Header>{header}</{env}:Header><{env}:Body>{body}</{env}:Body></{env}:Envelope>"#,
            env = SOAP_ENV_PREFIX,
            soap = SOAP_11_NS,
            xrd = NS_XRD_PREFIX,
            xrd_ns = NS_XRD_URL,
            id = NS_ID_PREFIX,
            id_ns = NS_ID_URL,
            header = self.header(request),
            body = self.body(request),
        );

        debug!(
            request_id = %request.id,
            service = %request.producer,
            bytes = xml.len(),
            "Serialized service request"
        );
        Ok(SoapMessage::new(xml))
    }
}

/// Non-colonized XML name over the ASCII range.
fn is_xml_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn xrd_element(name: &str, value: &str) -> String {
    format!(
        "<{p}:{n}>{v}</{p}:{n}>",
        p = NS_XRD_PREFIX,
        n = name,
        v = xml_escape(value)
    )
}

fn id_element(name: &str, value: &str) -> String {
    format!(
        "<{p}:{n}>{v}</{p}:{n}>",
        p = NS_ID_PREFIX,
        n = name,
        v = xml_escape(value)
    )
}

fn identifier_block(element: &str, object_type: ObjectType, fields: &[(&str, Option<&str>)]) -> String {
    let children: String = fields
        .iter()
        .filter_map(|(name, value)| value.filter(|v| !v.is_empty()).map(|v| id_element(name, v)))
        .collect();
    format!(
        r#"<{xrd}:{el} {id}:{attr}="{ot}">{children}</{xrd}:{el}>"#,
        xrd = NS_XRD_PREFIX,
        el = element,
        id = NS_ID_PREFIX,
        attr = NS_ID_ATTR_OBJECT_TYPE,
        ot = object_type.as_str(),
        children = children,
    )
}

fn client_block(consumer: &ConsumerMember) -> String {
    identifier_block(
        NS_XRD_ELEM_CLIENT,
        consumer.object_type(),
        &[
            (NS_ID_ELEM_XROAD_INSTANCE, Some(consumer.x_road_instance.as_str())),
            (NS_ID_ELEM_MEMBER_CLASS, Some(consumer.member_class.as_str())),
            (NS_ID_ELEM_MEMBER_CODE, Some(consumer.member_code.as_str())),
            (NS_ID_ELEM_SUBSYSTEM_CODE, consumer.subsystem_code.as_deref()),
        ],
    )
}

fn service_block(producer: &ProducerMember) -> String {
    match producer.object_type() {
        ObjectType::CentralService => identifier_block(
            NS_XRD_ELEM_CENTRAL_SERVICE,
            ObjectType::CentralService,
            &[
                (NS_ID_ELEM_XROAD_INSTANCE, Some(producer.x_road_instance.as_str())),
                (NS_ID_ELEM_SERVICE_CODE, Some(producer.service_code.as_str())),
            ],
        ),
        object_type => identifier_block(
            NS_XRD_ELEM_SERVICE,
            object_type,
            &[
                (NS_ID_ELEM_XROAD_INSTANCE, Some(producer.x_road_instance.as_str())),
                (NS_ID_ELEM_MEMBER_CLASS, producer.member_class.as_deref()),
                (NS_ID_ELEM_MEMBER_CODE, Some(producer.member_code.as_str())),
                (NS_ID_ELEM_SUBSYSTEM_CODE, producer.subsystem_code.as_deref()),
                (NS_ID_ELEM_SERVICE_CODE, Some(producer.service_code.as_str())),
                (NS_ID_ELEM_SERVICE_VERSION, producer.service_version.as_deref()),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_envelope;

    fn test_request() -> ServiceRequest {
        ServiceRequest::with_id(
            ConsumerMember::new("FI", "GOV", "1234").with_subsystem("client-sys"),
            ProducerMember::new("FI", "COM", "5678", "getRandom")
                .with_subsystem("server-sys")
                .with_version("v1")
                .with_namespace("http://test.x-road.fi/producer", "ts1"),
            "ID-1",
        )
        .user_id("EE1234567890")
        .request_data("<seed>42</seed>")
    }

    #[test]
    fn test_serialize_header_round_trip() {
        let message = XRoadRequestSerializer::new().serialize(&test_request()).unwrap();
        let envelope = parse_envelope(message.as_str()).unwrap();

        assert_eq!(envelope.header.id.as_deref(), Some("ID-1"));
        assert_eq!(envelope.header.user_id.as_deref(), Some("EE1234567890"));
        assert_eq!(envelope.header.protocol_version.as_deref(), Some("4.0"));

        let client = envelope.header.client.unwrap();
        assert_eq!(client.object_type.as_deref(), Some("SUBSYSTEM"));
        assert_eq!(client.subsystem_code.as_deref(), Some("client-sys"));

        let service = envelope.header.service.unwrap();
        assert_eq!(service.object_type.as_deref(), Some("SERVICE"));
        assert_eq!(service.service_version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_serialize_body_with_wrapper() {
        let message = XRoadRequestSerializer::new().serialize(&test_request()).unwrap();
        let body = parse_envelope(message.as_str()).unwrap().body;

        assert_eq!(body.operation.as_deref(), Some("getRandom"));
        assert_eq!(
            body.operation_namespace.as_deref(),
            Some("http://test.x-road.fi/producer")
        );
        assert_eq!(body.request.as_deref(), Some("<seed>42</seed>"));
        assert!(message.as_str().contains(r#"<ts1:getRandom xmlns:ts1="#));
    }

    #[test]
    fn test_serialize_without_wrapper() {
        let message = XRoadRequestSerializer::new()
            .with_wrappers(false)
            .serialize(&test_request())
            .unwrap();
        let body = parse_envelope(message.as_str()).unwrap().body;
        assert_eq!(body.request, None);
        assert_eq!(body.content.as_deref(), Some("<seed>42</seed>"));
    }

    #[test]
    fn test_serialize_member_consumer_and_central_service() {
        let request = ServiceRequest::new(
            ConsumerMember::new("FI", "GOV", "1234"),
            ProducerMember::central("FI", "getCompanies"),
        );
        let message = XRoadRequestSerializer::new().serialize(&request).unwrap();
        let xml = message.as_str();

        assert!(xml.contains(r#"<xrd:client id:objectType="MEMBER">"#));
        assert!(xml.contains(r#"<xrd:centralService id:objectType="CENTRALSERVICE">"#));
        assert!(!xml.contains("subsystemCode"));
        assert!(!xml.contains("userId"));

        let body = parse_envelope(xml).unwrap().body;
        assert_eq!(body.operation.as_deref(), Some("getCompanies"));
        assert_eq!(body.operation_namespace, None);
    }

    #[test]
    fn test_serialize_escapes_header_values() {
        let request = test_request().user_id("a<b&c");
        let message = XRoadRequestSerializer::new().serialize(&request).unwrap();
        assert!(message.as_str().contains("a&lt;b&amp;c"));
        let header = parse_envelope(message.as_str()).unwrap().header;
        assert_eq!(header.user_id.as_deref(), Some("a<b&c"));
    }

    #[test]
    fn test_serialize_default_prefix() {
        let mut request = test_request();
        request.producer.namespace_prefix = None;
        let message = XRoadRequestSerializer::new().serialize(&request).unwrap();
        assert!(message.as_str().contains("<ts1:getRandom"));
    }

    #[test]
    fn test_serialize_rejects_invalid_element_names() {
        for code in ["get Random", "a<b", "1getRandom", "ts1:getRandom"] {
            let mut request = test_request();
            request.producer.service_code = code.to_string();
            let result = XRoadRequestSerializer::new().serialize(&request);
            assert!(
                matches!(result, Err(ClientError::Serialization(_))),
                "service code {:?} accepted",
                code
            );
        }

        let mut request = test_request();
        request.producer.namespace_prefix = Some("a<b".to_string());
        let result = XRoadRequestSerializer::new().serialize(&request);
        assert!(matches!(result, Err(ClientError::Serialization(_))));
    }

    #[test]
    fn test_serialize_prefix_ignored_without_namespace() {
        let mut request = test_request();
        request.producer.namespace_url = None;
        request.producer.namespace_prefix = Some("not valid".to_string());
        let message = XRoadRequestSerializer::new().serialize(&request).unwrap();
        assert!(parse_envelope(message.as_str()).is_ok());
    }

    #[test]
    fn test_is_xml_name() {
        assert!(is_xml_name("getRandom"));
        assert!(is_xml_name("_get-random.v2"));
        assert!(!is_xml_name(""));
        assert!(!is_xml_name("get Random"));
        assert!(!is_xml_name("-x"));
    }

    #[test]
    fn test_serialize_configured_protocol_version() {
        let config = MessageConfig {
            protocol_version: "4.1".to_string(),
            ..Default::default()
        };
        let serializer = XRoadRequestSerializer::from_config(&config);

        let message = serializer.serialize(&test_request()).unwrap();
        let header = parse_envelope(message.as_str()).unwrap().header;
        assert_eq!(header.protocol_version.as_deref(), Some("4.1"));

        let explicit = test_request().protocol_version("3.1");
        let message = serializer.serialize(&explicit).unwrap();
        let header = parse_envelope(message.as_str()).unwrap().header;
        assert_eq!(header.protocol_version.as_deref(), Some("3.1"));
    }

    #[test]
    fn test_serialize_rejects_incomplete_identifiers() {
        let mut request = test_request();
        request.consumer.member_code = String::new();
        let result = XRoadRequestSerializer::new().serialize(&request);
        assert!(matches!(result, Err(ClientError::Serialization(_))));

        let mut request = test_request();
        request.producer.service_code = String::new();
        assert!(XRoadRequestSerializer::new().serialize(&request).is_err());
    }
}
