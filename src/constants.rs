//! Namespace, element and service-name constants shared by the serializer
//! and deserializer.
//!
//! Everything here is compile-time data. The [`NAMESPACES`] table is the only
//! aggregate and it is a `static` slice, so there is no runtime mutation path.

/// SOAP 1.1 envelope namespace URI.
pub const SOAP_11_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
/// SOAP 1.2 envelope namespace URI.
pub const SOAP_12_NS: &str = "http://www.w3.org/2003/05/soap-envelope";
/// Envelope prefix written by the serializer.
pub const SOAP_ENV_PREFIX: &str = "SOAP-ENV";

/// Identifiers schema namespace prefix.
pub const NS_ID_PREFIX: &str = "id";
/// Identifiers schema namespace URI.
pub const NS_ID_URL: &str = "http://x-road.eu/xsd/identifiers";
/// X-Road schema namespace prefix.
pub const NS_XRD_PREFIX: &str = "xrd";
/// X-Road schema namespace URI.
pub const NS_XRD_URL: &str = "http://x-road.eu/xsd/xroad.xsd";
/// Environmental monitoring namespace prefix.
pub const NS_ENV_MONITORING_PREFIX: &str = "m";
/// Environmental monitoring namespace URI.
pub const NS_ENV_MONITORING_URL: &str = "http://x-road.eu/xsd/monitoring";

// Attributes
pub const NS_ID_ATTR_OBJECT_TYPE: &str = "objectType";
pub const ATTR_ALGORITHM_ID: &str = "algorithmId";

// X-Road header elements
pub const NS_XRD_ELEM_CLIENT: &str = "client";
pub const NS_XRD_ELEM_SERVICE: &str = "service";
pub const NS_XRD_ELEM_MEMBER: &str = "member";
pub const NS_XRD_ELEM_SECURITY_SERVER: &str = "securityServer";
pub const NS_XRD_ELEM_CENTRAL_SERVICE: &str = "centralService";
pub const NS_XRD_ELEM_CENTRAL_SERVICE_LIST: &str = "centralServiceList";
pub const NS_XRD_ELEM_CLIENT_LIST: &str = "clientList";
pub const NS_XRD_ELEM_ID: &str = "id";
pub const NS_XRD_ELEM_USER_ID: &str = "userId";
pub const NS_XRD_ELEM_ISSUE: &str = "issue";
pub const NS_XRD_ELEM_REQUEST_HASH: &str = "requestHash";
pub const NS_XRD_ELEM_PROTOCOL_VERSION: &str = "protocolVersion";

// Identifier elements
pub const NS_ID_ELEM_XROAD_INSTANCE: &str = "xRoadInstance";
pub const NS_ID_ELEM_MEMBER_CLASS: &str = "memberClass";
pub const NS_ID_ELEM_MEMBER_CODE: &str = "memberCode";
pub const NS_ID_ELEM_SUBSYSTEM_CODE: &str = "subsystemCode";
pub const NS_ID_ELEM_SERVICE_CODE: &str = "serviceCode";
pub const NS_ID_ELEM_SERVER_CODE: &str = "serverCode";
pub const NS_ID_ELEM_SERVICE_VERSION: &str = "serviceVersion";

// Environmental monitoring
pub const NS_ENV_MONITORING_ELEM_PACKAGES: &str = "Packages";
pub const NS_ENV_MONITORING_ELEM_METRIC_SET: &str = "metricSet";
pub const NS_ENV_MONITORING_ELEM_STRING_METRIC: &str = "stringMetric";

// Body wrappers
pub const ELEM_REQUEST_WRAPPER: &str = "request";
pub const ELEM_RESPONSE_WRAPPER: &str = "response";

// Meta services
pub const META_SERVICE_LIST_CLIENTS: &str = "listClients";
pub const META_SERVICE_LIST_CENTRAL_SERVICES: &str = "listCentralServices";
pub const META_SERVICE_LIST_METHODS: &str = "listMethods";
pub const META_SERVICE_ALLOWED_METHODS: &str = "allowedMethods";
pub const ENV_MONITORING_GET_SECURITY_SERVER_METRICS: &str = "getSecurityServerMetrics";

// Content types
pub const TEXT_XML: &str = "text/xml";
pub const TEXT_XML_UTF8: &str = "text/xml; charset=UTF-8";
pub const APPLICATION_XML: &str = "application/xml";
pub const APPLICATION_JSON: &str = "application/json";
pub const MULTIPART_RELATED: &str = "multipart/related";

/// Default for processing `request`/`response` body wrappers.
pub const DEFAULT_PROCESSING_WRAPPERS: bool = true;
/// Protocol version written when the request does not override it.
pub const DEFAULT_PROTOCOL_VERSION: &str = "4.0";
/// Prefix bound to the producer namespace when the producer declares none.
pub const DEFAULT_PRODUCER_NS_PREFIX: &str = "ts1";
/// Namespace sentinel meaning "accept any producer namespace".
pub const WILDCARD_NAMESPACE: &str = "*";

/// A prefix/URI pair from the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub prefix: &'static str,
    pub uri: &'static str,
}

/// Well-known namespaces, in the order they are declared on an envelope.
pub static NAMESPACES: &[NamespaceEntry] = &[
    NamespaceEntry { prefix: SOAP_ENV_PREFIX, uri: SOAP_11_NS },
    NamespaceEntry { prefix: NS_XRD_PREFIX, uri: NS_XRD_URL },
    NamespaceEntry { prefix: NS_ID_PREFIX, uri: NS_ID_URL },
    NamespaceEntry { prefix: NS_ENV_MONITORING_PREFIX, uri: NS_ENV_MONITORING_URL },
];

static META_SERVICES: &[&str] = &[
    META_SERVICE_LIST_CLIENTS,
    META_SERVICE_LIST_CENTRAL_SERVICES,
    META_SERVICE_LIST_METHODS,
    META_SERVICE_ALLOWED_METHODS,
    ENV_MONITORING_GET_SECURITY_SERVER_METRICS,
];

/// Look up a namespace URI by its registered prefix.
pub fn namespace_for_prefix(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|entry| entry.prefix == prefix)
        .map(|entry| entry.uri)
}

/// Look up the registered prefix of a namespace URI.
pub fn prefix_for_namespace(uri: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|entry| entry.uri == uri)
        .map(|entry| entry.prefix)
}

/// Whether `service_code` names one of the security server meta services.
pub fn is_meta_service(service_code: &str) -> bool {
    META_SERVICES.contains(&service_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_lookup() {
        assert_eq!(namespace_for_prefix("xrd"), Some(NS_XRD_URL));
        assert_eq!(namespace_for_prefix("id"), Some(NS_ID_URL));
        assert_eq!(namespace_for_prefix("m"), Some(NS_ENV_MONITORING_URL));
        assert_eq!(namespace_for_prefix("nope"), None);
    }

    #[test]
    fn test_prefix_lookup() {
        assert_eq!(prefix_for_namespace(SOAP_11_NS), Some("SOAP-ENV"));
        assert_eq!(prefix_for_namespace(NS_ID_URL), Some("id"));
        assert_eq!(prefix_for_namespace(SOAP_12_NS), None);
    }

    #[test]
    fn test_meta_services() {
        assert!(is_meta_service("listClients"));
        assert!(is_meta_service("getSecurityServerMetrics"));
        assert!(!is_meta_service("getRandom"));
        assert!(!is_meta_service(""));
    }

    #[test]
    fn test_registry_prefixes_unique() {
        for (i, a) in NAMESPACES.iter().enumerate() {
            for b in &NAMESPACES[i + 1..] {
                assert_ne!(a.prefix, b.prefix);
                assert_ne!(a.uri, b.uri);
            }
        }
    }
}
