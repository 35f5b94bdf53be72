//! SOAP envelope reading.
//!
//! Uses quick-xml's namespace-aware reader, which never expands external
//! entities. DOCTYPE and ENTITY declarations are refused outright.

use crate::constants::{
    ELEM_REQUEST_WRAPPER, ELEM_RESPONSE_WRAPPER, NS_ID_ATTR_OBJECT_TYPE, NS_ID_ELEM_MEMBER_CLASS,
    NS_ID_ELEM_MEMBER_CODE, NS_ID_ELEM_SERVICE_CODE, NS_ID_ELEM_SERVICE_VERSION,
    NS_ID_ELEM_SUBSYSTEM_CODE, NS_ID_ELEM_XROAD_INSTANCE, NS_ID_URL, NS_XRD_ELEM_CENTRAL_SERVICE,
    NS_XRD_ELEM_CLIENT, NS_XRD_ELEM_ID, NS_XRD_ELEM_ISSUE, NS_XRD_ELEM_PROTOCOL_VERSION,
    NS_XRD_ELEM_REQUEST_HASH, NS_XRD_ELEM_SERVICE, NS_XRD_ELEM_USER_ID, NS_XRD_URL,
};
use crate::error::ClientError;
use crate::member::{non_empty, ConsumerMember, ProducerMember};
use crate::message::{SoapFault, SoapVersion};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::mem;

/// Parsed SOAP envelope.
#[derive(Debug, Clone)]
pub struct ParsedEnvelope {
    /// Detected SOAP version
    pub version: SoapVersion,
    pub header: XRoadHeader,
    pub body: SoapBody,
}

/// X-Road header blocks. Foreign header elements are skipped.
#[derive(Debug, Clone, Default)]
pub struct XRoadHeader {
    pub client: Option<IdentifierFields>,
    /// `xrd:service` or `xrd:centralService`
    pub service: Option<IdentifierFields>,
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub issue: Option<String>,
    pub protocol_version: Option<String>,
    pub request_hash: Option<String>,
}

/// Raw `id:*` children of a client or service header block.
#[derive(Debug, Clone, Default)]
pub struct IdentifierFields {
    /// `id:objectType` attribute as sent
    pub object_type: Option<String>,
    pub x_road_instance: Option<String>,
    pub member_class: Option<String>,
    pub member_code: Option<String>,
    pub subsystem_code: Option<String>,
    pub service_code: Option<String>,
    pub service_version: Option<String>,
}

impl IdentifierFields {
    pub fn to_consumer(&self) -> Result<ConsumerMember, ClientError> {
        let mut consumer = ConsumerMember::new(
            required(&self.x_road_instance, NS_ID_ELEM_XROAD_INSTANCE)?,
            required(&self.member_class, NS_ID_ELEM_MEMBER_CLASS)?,
            required(&self.member_code, NS_ID_ELEM_MEMBER_CODE)?,
        );
        consumer.subsystem_code = self.subsystem_code.clone();
        Ok(consumer)
    }

    pub fn to_producer(&self, namespace_url: Option<String>) -> Result<ProducerMember, ClientError> {
        let instance = required(&self.x_road_instance, NS_ID_ELEM_XROAD_INSTANCE)?;
        let service_code = required(&self.service_code, NS_ID_ELEM_SERVICE_CODE)?;
        let mut producer = match &self.member_class {
            Some(class) => ProducerMember::new(
                instance,
                class.as_str(),
                required(&self.member_code, NS_ID_ELEM_MEMBER_CODE)?,
                service_code,
            ),
            None => ProducerMember::central(instance, service_code),
        };
        producer.subsystem_code = self.subsystem_code.clone();
        producer.service_version = self.service_version.clone();
        producer.namespace_url = namespace_url;
        Ok(producer)
    }
}

fn required<'a>(value: &'a Option<String>, element: &str) -> Result<&'a str, ClientError> {
    value
        .as_deref()
        .ok_or_else(|| ClientError::Protocol(format!("Identifier is missing id:{}", element)))
}

/// Parsed SOAP Body.
#[derive(Debug, Clone, Default)]
pub struct SoapBody {
    /// First body element name (the service operation)
    pub operation: Option<String>,
    /// Operation namespace
    pub operation_namespace: Option<String>,
    /// Inner XML of the operation element
    pub content: Option<String>,
    /// Inner XML of the `request` wrapper
    pub request: Option<String>,
    /// Inner XML of the `response` wrapper
    pub response: Option<String>,
    /// SOAP Fault, or an X-Road non-technical fault
    pub fault: Option<SoapFault>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Envelope,
    Header,
    Body,
    Client,
    Service,
    IdField,
    HeaderField,
    Operation,
    RequestWrapper,
    ResponseWrapper,
    XRoadFaultField,
    Fault,
    FaultField,
    Other,
}

#[derive(Debug)]
struct OpenElement {
    local_name: String,
    role: Role,
    content_start: usize,
}

struct EnvelopeBuilder<'a> {
    xml: &'a str,
    path: Vec<OpenElement>,
    text: String,
    version: Option<SoapVersion>,
    saw_body: bool,
    saw_body_child: bool,
    header: XRoadHeader,
    identifier: IdentifierFields,
    body: SoapBody,
    fault: SoapFault,
    xroad_fault: SoapFault,
}

impl<'a> EnvelopeBuilder<'a> {
    fn new(xml: &'a str) -> Self {
        Self {
            xml,
            path: Vec::new(),
            text: String::new(),
            version: None,
            saw_body: false,
            saw_body_child: false,
            header: XRoadHeader::default(),
            identifier: IdentifierFields::default(),
            body: SoapBody::default(),
            fault: SoapFault::default(),
            xroad_fault: SoapFault::default(),
        }
    }

    fn envelope_ns(&self) -> Option<&'static str> {
        self.version.map(|v| v.namespace())
    }

    fn open(
        &mut self,
        local_name: String,
        ns: Option<String>,
        object_type: Option<String>,
        content_start: usize,
    ) -> Result<(), ClientError> {
        self.text.clear();
        let ns = ns.as_deref();
        let parent = self.path.last();

        let role = match parent.map(|p| p.role) {
            None => {
                if self.version.is_some() {
                    return Err(ClientError::Deserialization(
                        "Content after the SOAP Envelope".to_string(),
                    ));
                }
                self.version = ns.and_then(SoapVersion::from_namespace);
                if local_name != "Envelope" || self.version.is_none() {
                    return Err(ClientError::Deserialization(
                        "No valid SOAP Envelope found with recognized namespace".to_string(),
                    ));
                }
                Role::Envelope
            }
            Some(Role::Envelope) if ns == self.envelope_ns() => match local_name.as_str() {
                "Header" => Role::Header,
                "Body" => {
                    self.saw_body = true;
                    Role::Body
                }
                _ => Role::Other,
            },
            Some(Role::Header) if ns == Some(NS_XRD_URL) => match local_name.as_str() {
                NS_XRD_ELEM_CLIENT => {
                    self.identifier = IdentifierFields {
                        object_type,
                        ..Default::default()
                    };
                    Role::Client
                }
                NS_XRD_ELEM_SERVICE | NS_XRD_ELEM_CENTRAL_SERVICE => {
                    self.identifier = IdentifierFields {
                        object_type,
                        ..Default::default()
                    };
                    Role::Service
                }
                _ => Role::HeaderField,
            },
            Some(Role::Client | Role::Service) if ns == Some(NS_ID_URL) => Role::IdField,
            Some(Role::Body) if !self.saw_body_child => {
                self.saw_body_child = true;
                if local_name == "Fault" && ns == self.envelope_ns() {
                    Role::Fault
                } else {
                    self.body.operation = Some(local_name.clone());
                    self.body.operation_namespace = ns.map(String::from);
                    Role::Operation
                }
            }
            Some(Role::Operation) => match local_name.as_str() {
                ELEM_REQUEST_WRAPPER => Role::RequestWrapper,
                ELEM_RESPONSE_WRAPPER => Role::ResponseWrapper,
                _ => Role::Other,
            },
            Some(Role::ResponseWrapper) => match local_name.as_str() {
                "faultCode" | "faultString" => Role::XRoadFaultField,
                _ => Role::Other,
            },
            Some(Role::Fault) => Role::FaultField,
            Some(Role::FaultField)
                if matches!(parent.map(|p| p.local_name.as_str()), Some("Code" | "Reason")) =>
            {
                Role::FaultField
            }
            _ => Role::Other,
        };

        self.path.push(OpenElement {
            local_name,
            role,
            content_start,
        });
        Ok(())
    }

    fn close(&mut self, content_end: usize) -> Result<(), ClientError> {
        let element = self.path.pop().ok_or_else(|| {
            ClientError::Deserialization("Unbalanced end tag in envelope".to_string())
        })?;
        let text = non_empty(Some(mem::take(&mut self.text).trim().to_string()));
        let inner = || {
            self.xml
                .get(element.content_start..content_end)
                .map(|s| s.trim().to_string())
        };

        match element.role {
            Role::IdField => {
                let field = match element.local_name.as_str() {
                    NS_ID_ELEM_XROAD_INSTANCE => &mut self.identifier.x_road_instance,
                    NS_ID_ELEM_MEMBER_CLASS => &mut self.identifier.member_class,
                    NS_ID_ELEM_MEMBER_CODE => &mut self.identifier.member_code,
                    NS_ID_ELEM_SUBSYSTEM_CODE => &mut self.identifier.subsystem_code,
                    NS_ID_ELEM_SERVICE_CODE => &mut self.identifier.service_code,
                    NS_ID_ELEM_SERVICE_VERSION => &mut self.identifier.service_version,
                    _ => return Ok(()),
                };
                *field = text;
            }
            Role::Client => self.header.client = Some(mem::take(&mut self.identifier)),
            Role::Service => self.header.service = Some(mem::take(&mut self.identifier)),
            Role::HeaderField => match element.local_name.as_str() {
                NS_XRD_ELEM_ID => self.header.id = text,
                NS_XRD_ELEM_USER_ID => self.header.user_id = text,
                NS_XRD_ELEM_ISSUE => self.header.issue = text,
                NS_XRD_ELEM_PROTOCOL_VERSION => self.header.protocol_version = text,
                NS_XRD_ELEM_REQUEST_HASH => self.header.request_hash = text,
                _ => {}
            },
            Role::Operation => self.body.content = inner(),
            Role::RequestWrapper => self.body.request = inner(),
            Role::ResponseWrapper => {
                self.body.response = inner();
                if !self.xroad_fault.code.is_empty() || !self.xroad_fault.string.is_empty() {
                    self.body.fault = Some(mem::take(&mut self.xroad_fault));
                }
            }
            Role::XRoadFaultField => {
                let value = text.unwrap_or_default();
                match element.local_name.as_str() {
                    "faultCode" => self.xroad_fault.code = value,
                    _ => self.xroad_fault.string = value,
                }
            }
            Role::FaultField => match element.local_name.as_str() {
                // SOAP 1.1 children, then SOAP 1.2 Code/Value and Reason/Text
                "faultcode" | "Value" => self.fault.code = text.unwrap_or_default(),
                "faultstring" | "Text" => self.fault.string = text.unwrap_or_default(),
                "faultactor" | "Role" => self.fault.actor = text,
                "detail" | "Detail" => self.fault.detail = inner().and_then(|d| non_empty(Some(d))),
                _ => {}
            },
            Role::Fault => self.body.fault = Some(mem::take(&mut self.fault)),
            Role::Envelope | Role::Header | Role::Body | Role::Other => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<ParsedEnvelope, ClientError> {
        let version = self.version.ok_or_else(|| {
            ClientError::Deserialization("Envelope contains no elements".to_string())
        })?;
        if !self.saw_body {
            return Err(ClientError::Deserialization(
                "SOAP Body is missing".to_string(),
            ));
        }
        Ok(ParsedEnvelope {
            version,
            header: self.header,
            body: self.body,
        })
    }
}

/// Parse envelope text into its X-Road header, body and fault parts.
pub fn parse_envelope(xml: &str) -> Result<ParsedEnvelope, ClientError> {
    check_xxe_patterns(xml)?;

    let mut reader = NsReader::from_str(xml);
    let mut builder = EnvelopeBuilder::new(xml);

    loop {
        let position = reader.buffer_position() as usize;
        let (resolved, event) = reader.read_resolved_event()?;
        let ns = namespace_of(&resolved)?;

        match event {
            Event::Start(ref e) => {
                let object_type = object_type_attr(&reader, e);
                builder.open(local_name_str(e), ns, object_type, reader.buffer_position() as usize)?;
            }
            Event::Empty(ref e) => {
                // Self-closing: open and close with an empty content span
                let end = reader.buffer_position() as usize;
                let object_type = object_type_attr(&reader, e);
                builder.open(local_name_str(e), ns, object_type, end)?;
                builder.close(end)?;
            }
            Event::End(_) => builder.close(position)?,
            Event::Text(ref e) => {
                let text = e.unescape().map_err(|err| {
                    ClientError::Deserialization(format!("Invalid text content: {}", err))
                })?;
                builder.text.push_str(&text);
            }
            Event::CData(e) => {
                builder
                    .text
                    .push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::DocType(_) => {
                return Err(ClientError::Deserialization(
                    "DOCTYPE declarations are not allowed".to_string(),
                ));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    builder.finish()
}

/// Check for XXE attack patterns.
fn check_xxe_patterns(xml: &str) -> Result<(), ClientError> {
    if xml.contains("<!DOCTYPE") || xml.contains("<!doctype") {
        return Err(ClientError::Deserialization(
            "DOCTYPE declarations are not allowed".to_string(),
        ));
    }

    if xml.contains("<!ENTITY") || xml.contains("<!entity") {
        return Err(ClientError::Deserialization(
            "Entity declarations are not allowed".to_string(),
        ));
    }

    Ok(())
}

fn namespace_of(resolved: &ResolveResult) -> Result<Option<String>, ClientError> {
    match resolved {
        ResolveResult::Bound(Namespace(ns)) => Ok(Some(String::from_utf8_lossy(ns).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ClientError::Deserialization(format!(
            "Unknown namespace prefix '{}'",
            String::from_utf8_lossy(prefix)
        ))),
    }
}

/// Extract local name from element.
fn local_name_str(e: &BytesStart) -> String {
    let name = e.local_name();
    std::str::from_utf8(name.as_ref())
        .unwrap_or("")
        .to_string()
}

/// Read the `id:objectType` attribute, if present.
fn object_type_attr(reader: &NsReader<&[u8]>, e: &BytesStart) -> Option<String> {
    for attr in e.attributes().flatten() {
        let (resolved, local) = reader.resolve_attribute(attr.key);
        let in_id_ns = matches!(resolved, ResolveResult::Bound(Namespace(ns)) if ns == NS_ID_URL.as_bytes());
        if in_id_ns && local.as_ref() == NS_ID_ATTR_OBJECT_TYPE.as_bytes() {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const XROAD_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:xrd="http://x-road.eu/xsd/xroad.xsd" xmlns:id="http://x-road.eu/xsd/identifiers">
  <SOAP-ENV:Header>
    <xrd:client id:objectType="SUBSYSTEM">
      <id:xRoadInstance>FI</id:xRoadInstance>
      <id:memberClass>GOV</id:memberClass>
      <id:memberCode>1234</id:memberCode>
      <id:subsystemCode>client-sys</id:subsystemCode>
    </xrd:client>
    <xrd:service id:objectType="SERVICE">
      <id:xRoadInstance>FI</id:xRoadInstance>
      <id:memberClass>COM</id:memberClass>
      <id:memberCode>5678</id:memberCode>
      <id:serviceCode>getRandom</id:serviceCode>
      <id:serviceVersion>v1</id:serviceVersion>
    </xrd:service>
    <xrd:userId>EE1234567890</xrd:userId>
    <xrd:id>ID11234</xrd:id>
    <xrd:protocolVersion>4.0</xrd:protocolVersion>
    <xrd:requestHash algorithmId="http://www.w3.org/2001/04/xmlenc#sha512">abc=</xrd:requestHash>
  </SOAP-ENV:Header>
  <SOAP-ENV:Body>
    <ts1:getRandomResponse xmlns:ts1="http://test.x-road.fi/producer">
      <request><seed>7</seed></request>
      <response><data>9</data></response>
    </ts1:getRandomResponse>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    const SOAP_11_FAULT: &str = r#"<SOAP-ENV:Envelope xmlns:SOAP-ENV="http://schemas.xmlsoap.org/soap/envelope/">
  <SOAP-ENV:Body>
    <SOAP-ENV:Fault>
      <faultcode>Server.ServerProxy.UnknownService</faultcode>
      <faultstring>Unknown service &amp; member</faultstring>
      <faultactor></faultactor>
      <detail><faultDetail>1b2c</faultDetail></detail>
    </SOAP-ENV:Fault>
  </SOAP-ENV:Body>
</SOAP-ENV:Envelope>"#;

    const SOAP_12_FAULT: &str = r#"<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body>
    <env:Fault>
      <env:Code><env:Value>env:Sender</env:Value></env:Code>
      <env:Reason><env:Text xml:lang="en">Bad request</env:Text></env:Reason>
    </env:Fault>
  </env:Body>
</env:Envelope>"#;

    #[test]
    fn test_parse_xroad_header() {
        let envelope = parse_envelope(XROAD_RESPONSE).unwrap();
        assert_eq!(envelope.version, SoapVersion::Soap11);

        let header = &envelope.header;
        assert_eq!(header.id.as_deref(), Some("ID11234"));
        assert_eq!(header.user_id.as_deref(), Some("EE1234567890"));
        assert_eq!(header.protocol_version.as_deref(), Some("4.0"));
        assert_eq!(header.request_hash.as_deref(), Some("abc="));
        assert_eq!(header.issue, None);

        let client = header.client.as_ref().unwrap();
        assert_eq!(client.object_type.as_deref(), Some("SUBSYSTEM"));
        assert_eq!(client.subsystem_code.as_deref(), Some("client-sys"));

        let service = header.service.as_ref().unwrap();
        assert_eq!(service.object_type.as_deref(), Some("SERVICE"));
        assert_eq!(service.service_code.as_deref(), Some("getRandom"));
        assert_eq!(service.service_version.as_deref(), Some("v1"));
    }

    #[test]
    fn test_parse_body_wrappers() {
        let envelope = parse_envelope(XROAD_RESPONSE).unwrap();
        let body = &envelope.body;
        assert_eq!(body.operation.as_deref(), Some("getRandomResponse"));
        assert_eq!(
            body.operation_namespace.as_deref(),
            Some("http://test.x-road.fi/producer")
        );
        assert_eq!(body.request.as_deref(), Some("<seed>7</seed>"));
        assert_eq!(body.response.as_deref(), Some("<data>9</data>"));
        assert!(body.content.as_deref().unwrap().starts_with("<request>"));
        assert!(body.fault.is_none());
    }

    #[test]
    fn test_identifier_conversion() {
        let envelope = parse_envelope(XROAD_RESPONSE).unwrap();
        let consumer = envelope.header.client.unwrap().to_consumer().unwrap();
        assert_eq!(consumer.to_string(), "FI:GOV:1234:client-sys");

        let producer = envelope
            .header
            .service
            .unwrap()
            .to_producer(Some("urn:ns".to_string()))
            .unwrap();
        assert_eq!(producer.member_class.as_deref(), Some("COM"));
        assert_eq!(producer.namespace_url.as_deref(), Some("urn:ns"));
    }

    #[test]
    fn test_identifier_missing_field() {
        let fields = IdentifierFields {
            x_road_instance: Some("FI".to_string()),
            ..Default::default()
        };
        assert!(matches!(fields.to_consumer(), Err(ClientError::Protocol(_))));
    }

    #[test]
    fn test_parse_soap_11_fault() {
        let envelope = parse_envelope(SOAP_11_FAULT).unwrap();
        let fault = envelope.body.fault.unwrap();
        assert_eq!(fault.code, "Server.ServerProxy.UnknownService");
        assert_eq!(fault.string, "Unknown service & member");
        assert_eq!(fault.actor, None);
        assert_eq!(fault.detail.as_deref(), Some("<faultDetail>1b2c</faultDetail>"));
        assert!(envelope.body.operation.is_none());
    }

    #[test]
    fn test_parse_soap_12_fault() {
        let envelope = parse_envelope(SOAP_12_FAULT).unwrap();
        assert_eq!(envelope.version, SoapVersion::Soap12);
        let fault = envelope.body.fault.unwrap();
        assert_eq!(fault.code, "env:Sender");
        assert_eq!(fault.string, "Bad request");
    }

    #[test]
    fn test_parse_non_technical_fault() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <p:getRandomResponse xmlns:p="urn:p">
      <response><faultCode>ERR01</faultCode><faultString>Seed out of range</faultString></response>
    </p:getRandomResponse>
  </s:Body>
</s:Envelope>"#;
        let fault = parse_envelope(xml).unwrap().body.fault.unwrap();
        assert_eq!(fault.code, "ERR01");
        assert_eq!(fault.string, "Seed out of range");
    }

    #[test]
    fn test_empty_operation_element() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><p:ping xmlns:p="urn:p"/></s:Body></s:Envelope>"#;
        let body = parse_envelope(xml).unwrap().body;
        assert_eq!(body.operation.as_deref(), Some("ping"));
        assert_eq!(body.content.as_deref(), Some(""));
    }

    #[test]
    fn test_xxe_detection() {
        let xxe_payload = r#"<?xml version="1.0"?>
<!DOCTYPE foo [<!ENTITY xxe SYSTEM "file:///etc/passwd">]>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>&xxe;</soap:Body>
</soap:Envelope>"#;

        let result = parse_envelope(xxe_payload);
        assert!(matches!(result, Err(ClientError::Deserialization(_))));
    }

    #[test]
    fn test_non_soap_root_rejected() {
        let result = parse_envelope("<root><child/></root>");
        assert!(matches!(result, Err(ClientError::Deserialization(_))));
    }

    #[test]
    fn test_missing_body_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Header/></s:Envelope>"#;
        assert!(parse_envelope(xml).is_err());
    }

    #[test]
    fn test_second_root_element_rejected() {
        let envelope = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body/></s:Envelope>"#;
        let trailing = r#"<e:Envelope xmlns:e="http://www.w3.org/2003/05/soap-envelope"><e:Body/></e:Envelope>"#;
        let result = parse_envelope(&format!("{}{}", envelope, trailing));
        assert!(matches!(result, Err(ClientError::Deserialization(_))));

        let result = parse_envelope(&format!("{}<junk/>", envelope));
        assert!(matches!(result, Err(ClientError::Deserialization(_))));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body></s:Envelope>"#;
        assert!(parse_envelope(xml).is_err());
    }
}
