//! Transport collaborators.
//!
//! The client drives a connection strictly as create → call → close. Any
//! blocking transport can be plugged in by implementing the two traits here;
//! [`HttpTransport`] is the stock one.

use crate::config::TransportConfig;
use crate::constants::TEXT_XML_UTF8;
use crate::error::ClientError;
use crate::message::SoapMessage;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// One point-to-point connection, used for exactly one exchange.
pub trait SoapConnection {
    /// Send `request` and block until the reply arrives.
    fn call(&mut self, request: &SoapMessage, endpoint: &Url) -> Result<SoapMessage, ClientError>;

    /// Release the connection.
    fn close(&mut self) -> Result<(), ClientError>;
}

/// Opens connections. Implementations must not hand out shared connections.
pub trait SoapConnectionFactory {
    type Connection: SoapConnection;

    fn create_connection(&self) -> Result<Self::Connection, ClientError>;
}

/// Blocking HTTP(S) transport.
///
/// Each connection owns its own client with idle pooling disabled, so no
/// socket outlives the exchange it was opened for.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

fn secs(value: u64) -> Option<Duration> {
    (value > 0).then(|| Duration::from_secs(value))
}

impl SoapConnectionFactory for HttpTransport {
    type Connection = HttpConnection;

    fn create_connection(&self) -> Result<HttpConnection, ClientError> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .user_agent(self.config.user_agent.as_str())
            .connect_timeout(secs(self.config.connect_timeout_secs))
            .timeout(secs(self.config.timeout_secs))
            .build()?;
        Ok(HttpConnection {
            client: Some(client),
        })
    }
}

/// A connection opened by [`HttpTransport`].
#[derive(Debug)]
pub struct HttpConnection {
    client: Option<Client>,
}

impl SoapConnection for HttpConnection {
    fn call(&mut self, request: &SoapMessage, endpoint: &Url) -> Result<SoapMessage, ClientError> {
        let client = self
            .client
            .as_ref()
            .ok_or_else(|| ClientError::Transport("Connection is closed".to_string()))?;

        let response = client
            .post(endpoint.clone())
            .header(CONTENT_TYPE, request.content_type())
            .header("SOAPAction", "\"\"")
            .body(request.as_str().to_string())
            .send()?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(TEXT_XML_UTF8)
            .to_string();
        let body = response.text()?;
        debug!(status = %status, bytes = body.len(), "HTTP reply received");

        // SOAP faults travel with status 500
        let is_fault_reply = status == StatusCode::INTERNAL_SERVER_ERROR && !body.trim().is_empty();
        if status.is_success() || is_fault_reply {
            Ok(SoapMessage::new(body).with_content_type(content_type))
        } else {
            Err(ClientError::Transport(format!(
                "Unexpected HTTP status {} from {}",
                status, endpoint
            )))
        }
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.client.take();
        Ok(())
    }
}
