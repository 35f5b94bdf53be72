//! Synchronous SOAP exchange client.
//!
//! Each call opens its own connection, sends one envelope, blocks for the
//! reply and closes the connection again. Nothing is pooled, retried or
//! shared between calls.

use crate::config::TransportConfig;
use crate::constants::WILDCARD_NAMESPACE;
use crate::deserializer::ServiceResponseDeserializer;
use crate::error::ClientError;
use crate::message::{ServiceRequest, ServiceResponse, SoapMessage};
use crate::serializer::ServiceRequestSerializer;
use crate::transport::{HttpTransport, SoapConnection, SoapConnectionFactory};
use tracing::{debug, info, trace, warn};
use url::Url;

/// Sends SOAP messages and service requests to X-Road endpoints.
#[derive(Debug, Clone, Default)]
pub struct SoapClient<F = HttpTransport> {
    factory: F,
}

impl SoapClient<HttpTransport> {
    /// A client over the HTTP transport with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &TransportConfig) -> Self {
        Self::with_factory(HttpTransport::new(config.clone()))
    }
}

impl<F: SoapConnectionFactory> SoapClient<F> {
    /// A client over a custom transport.
    pub fn with_factory(factory: F) -> Self {
        Self { factory }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Send `request` to `endpoint` and block until the reply arrives.
    ///
    /// The endpoint is validated before any connection is opened. The
    /// connection is closed exactly once, whatever the outcome.
    pub fn send(&self, request: &SoapMessage, endpoint: &str) -> Result<SoapMessage, ClientError> {
        let url = parse_endpoint(endpoint)?;
        let mut connection = ConnectionGuard::new(self.factory.create_connection()?);

        debug!("Send SOAP message to \"{}\".", url);
        trace!("Outgoing SOAP request : \"{}\".", request.as_str());

        let response = connection.call(request, &url)?;
        connection.close()?;

        debug!("SOAP response received.");
        trace!("Incoming SOAP response : \"{}\".", response.as_str());
        Ok(response)
    }

    /// Serialize `request`, send it, and deserialize the reply.
    ///
    /// The reply is read against the producer's namespace, or `"*"` when the
    /// producer declares none. Errors from any step are returned unchanged.
    pub fn send_request<S, D>(
        &self,
        request: &ServiceRequest,
        endpoint: &str,
        serializer: &S,
        deserializer: &D,
    ) -> Result<ServiceResponse, ClientError>
    where
        S: ServiceRequestSerializer + ?Sized,
        D: ServiceResponseDeserializer + ?Sized,
    {
        let soap_request = serializer.serialize(request)?;
        info!(
            "Send ServiceRequest to \"{}\". Request id : \"{}\"",
            endpoint, request.id
        );
        debug!("Consumer : {}", request.consumer);
        debug!("Producer : {}", request.producer);

        let soap_response = self.send(&soap_request, endpoint)?;
        let namespace = producer_namespace(request);
        let response = deserializer.deserialize(&soap_response, namespace)?;

        if let Some(id) = response.id.as_deref().filter(|id| *id != request.id) {
            warn!(request_id = %request.id, response_id = %id, "Response id does not match request id");
        }
        info!("ServiceResponse received. Request id : \"{}\"", request.id);
        Ok(response)
    }
}

/// The namespace a reply body is expected in.
pub fn producer_namespace(request: &ServiceRequest) -> &str {
    request
        .producer
        .namespace_url
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(WILDCARD_NAMESPACE)
}

/// Validate an endpoint locator: an absolute http(s) URL with a host.
pub fn parse_endpoint(endpoint: &str) -> Result<Url, ClientError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ClientError::InvalidEndpoint(format!("'{}': {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ClientError::InvalidEndpoint(format!(
            "'{}': unsupported scheme '{}'",
            endpoint,
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ClientError::InvalidEndpoint(format!(
            "'{}': missing host",
            endpoint
        )));
    }
    Ok(url)
}

/// Closes the wrapped connection on drop unless it was closed explicitly.
struct ConnectionGuard<C: SoapConnection> {
    connection: C,
    closed: bool,
}

impl<C: SoapConnection> ConnectionGuard<C> {
    fn new(connection: C) -> Self {
        Self {
            connection,
            closed: false,
        }
    }

    fn call(&mut self, request: &SoapMessage, endpoint: &Url) -> Result<SoapMessage, ClientError> {
        self.connection.call(request, endpoint)
    }

    fn close(mut self) -> Result<(), ClientError> {
        self.closed = true;
        self.connection.close()
    }
}

impl<C: SoapConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // The exchange already failed; that error is the one reported
        if let Err(err) = self.connection.close() {
            warn!(error = %err, "Failed to close SOAP connection");
        }
    }
}
