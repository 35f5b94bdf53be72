//! Response deserialization.

use crate::config::MessageConfig;
use crate::constants::{DEFAULT_PROCESSING_WRAPPERS, WILDCARD_NAMESPACE};
use crate::error::ClientError;
use crate::message::{ServiceResponse, SoapMessage};
use crate::parser::parse_envelope;
use tracing::{debug, warn};

/// Turns a reply envelope into a [`ServiceResponse`].
///
/// `producer_namespace` is the namespace the body is expected in, or `"*"`
/// when the producer declared none.
pub trait ServiceResponseDeserializer {
    fn deserialize(
        &self,
        message: &SoapMessage,
        producer_namespace: &str,
    ) -> Result<ServiceResponse, ClientError>;
}

/// Reads X-Road 4.0 reply envelopes.
///
/// A `"*"` namespace skips body namespace validation entirely.
#[derive(Debug, Clone)]
pub struct XRoadResponseDeserializer {
    /// Read the payload from the `<response>` wrapper
    process_wrappers: bool,
}

impl Default for XRoadResponseDeserializer {
    fn default() -> Self {
        Self {
            process_wrappers: DEFAULT_PROCESSING_WRAPPERS,
        }
    }
}

impl XRoadResponseDeserializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &MessageConfig) -> Self {
        Self {
            process_wrappers: config.process_wrappers,
        }
    }

    pub fn with_wrappers(mut self, process_wrappers: bool) -> Self {
        self.process_wrappers = process_wrappers;
        self
    }
}

impl ServiceResponseDeserializer for XRoadResponseDeserializer {
    fn deserialize(
        &self,
        message: &SoapMessage,
        producer_namespace: &str,
    ) -> Result<ServiceResponse, ClientError> {
        let envelope = parse_envelope(message.as_str())?;
        let header = envelope.header;
        let body = envelope.body;

        if let Some(fault) = &body.fault {
            warn!(code = %fault.code, reason = %fault.string, "SOAP fault received");
        }

        let namespace_url = if producer_namespace == WILDCARD_NAMESPACE {
            body.operation_namespace.clone()
        } else {
            if body.fault.is_none() && body.operation_namespace.as_deref() != Some(producer_namespace) {
                return Err(ClientError::Deserialization(format!(
                    "Response namespace {:?} does not match expected '{}'",
                    body.operation_namespace, producer_namespace
                )));
            }
            Some(producer_namespace.to_string())
        };

        if header.id.is_none() && body.fault.is_none() {
            return Err(ClientError::Deserialization(
                "Response has no xrd:id header".to_string(),
            ));
        }

        let consumer = header.client.as_ref().map(|c| c.to_consumer()).transpose()?;
        let producer = header
            .service
            .as_ref()
            .map(|s| s.to_producer(namespace_url.clone()))
            .transpose()?;

        let (request_data, response_data) = if self.process_wrappers {
            (body.request, body.response)
        } else {
            (None, body.content)
        };

        debug!(
            id = ?header.id,
            operation = ?body.operation,
            fault = body.fault.is_some(),
            "Deserialized service response"
        );

        Ok(ServiceResponse {
            id: header.id,
            consumer,
            producer,
            user_id: header.user_id,
            issue: header.issue,
            protocol_version: header.protocol_version,
            request_hash: header.request_hash,
            namespace_url,
            request_data,
            response_data,
            fault: body.fault,
        })
    }
}
