//! X-Road SOAP client core
//!
//! Turns typed service requests into X-Road message protocol envelopes,
//! exchanges them synchronously with a security server, and turns the
//! replies back into typed service responses.
//!
//! # Features
//!
//! - Consumer/producer identifiers with derived object types
//! - Blocking send with one connection per call, always released
//! - Pluggable serializer, deserializer and transport collaborators
//! - Stock X-Road 4.0 serializer/deserializer and HTTP transport
//! - SOAP 1.1/1.2 fault extraction
//!
//! # Example
//!
//! ```no_run
//! use xroad_soap_client::{
//!     ConsumerMember, ProducerMember, ServiceRequest, SoapClient,
//!     XRoadRequestSerializer, XRoadResponseDeserializer,
//! };
//!
//! let request = ServiceRequest::new(
//!     ConsumerMember::new("FI", "GOV", "1234").with_subsystem("client"),
//!     ProducerMember::new("FI", "COM", "5678", "getRandom")
//!         .with_namespace("http://test.x-road.fi/producer", "ts1"),
//! )
//! .request_data("<seed>42</seed>");
//!
//! let response = SoapClient::new().send_request(
//!     &request,
//!     "http://localhost:8080/cgi-bin/consumer_proxy",
//!     &XRoadRequestSerializer::new(),
//!     &XRoadResponseDeserializer::new(),
//! )?;
//! println!("{:?}", response.response_data);
//! # Ok::<(), xroad_soap_client::ClientError>(())
//! ```

pub mod client;
pub mod config;
pub mod constants;
pub mod deserializer;
pub mod error;
pub mod helper;
pub mod member;
pub mod message;
pub mod parser;
pub mod serializer;
pub mod transport;

pub use client::SoapClient;
pub use config::ClientConfig;
pub use deserializer::{ServiceResponseDeserializer, XRoadResponseDeserializer};
pub use error::{ClientError, Result};
pub use member::{ConsumerMember, ObjectType, ProducerMember};
pub use message::{ServiceRequest, ServiceResponse, SoapFault, SoapMessage, SoapVersion};
pub use serializer::{ServiceRequestSerializer, XRoadRequestSerializer};
pub use transport::{HttpTransport, SoapConnection, SoapConnectionFactory};
