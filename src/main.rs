//! X-Road SOAP client binary.
//!
//! Run with: `xroad-client --config client.yaml call --endpoint URL --client FI/GOV/1234 --service FI/COM/5678/getRandom`

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use xroad_soap_client::{
    ClientConfig, ConsumerMember, ProducerMember, ServiceRequest, SoapClient, SoapMessage,
    XRoadRequestSerializer, XRoadResponseDeserializer,
};

/// Command-line client for X-Road security servers.
///
/// Sends either a ready-made SOAP envelope or a service request built from
/// identifiers, blocks for the reply and prints it to stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML)
    #[arg(short, long, default_value = "xroad-client.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a raw SOAP envelope and print the raw reply
    Send {
        /// Security server endpoint URL
        #[arg(short, long)]
        endpoint: String,

        /// File holding the SOAP envelope
        #[arg(long)]
        envelope: PathBuf,
    },

    /// Build a service request, send it and print the response payload
    Call {
        /// Security server endpoint URL
        #[arg(short, long)]
        endpoint: String,

        /// Client identifier: INSTANCE/CLASS/CODE[/SUBSYSTEM]
        #[arg(long)]
        client: String,

        /// Service identifier: INSTANCE/CLASS/CODE[/SUBSYSTEM]/SERVICE[/VERSION] or INSTANCE/SERVICE
        #[arg(long)]
        service: String,

        /// Producer namespace URL of the service
        #[arg(long)]
        namespace: Option<String>,

        /// Prefix bound to the producer namespace
        #[arg(long)]
        prefix: Option<String>,

        /// X-Road user id header
        #[arg(long)]
        user_id: Option<String>,

        /// X-Road issue header
        #[arg(long)]
        issue: Option<String>,

        /// File holding the XML request payload
        #[arg(long)]
        payload: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = args.log_level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    // Load configuration
    let config = if args.config.exists() {
        ClientConfig::from_file(&args.config).context("Failed to load config file")?
    } else {
        info!("Config file not found, using defaults");
        ClientConfig::default()
    };

    info!(
        timeout_secs = config.transport.timeout_secs,
        process_wrappers = config.messages.process_wrappers,
        protocol_version = %config.messages.protocol_version,
        "Configuration loaded"
    );

    let client = SoapClient::from_config(&config.transport);

    match args.command {
        Command::Send { endpoint, envelope } => {
            let xml = std::fs::read_to_string(&envelope)
                .with_context(|| format!("Failed to read envelope {}", envelope.display()))?;
            let reply = client
                .send(&SoapMessage::new(xml), &endpoint)
                .context("SOAP exchange failed")?;
            println!("{}", reply.as_str());
        }
        Command::Call {
            endpoint,
            client: client_id,
            service,
            namespace,
            prefix,
            user_id,
            issue,
            payload,
        } => {
            let consumer: ConsumerMember = client_id.parse().context("Invalid --client")?;
            let mut producer: ProducerMember = service.parse().context("Invalid --service")?;
            if let Some(namespace) = namespace {
                producer = producer.with_namespace(namespace, prefix.unwrap_or_default());
            }

            let mut request = ServiceRequest::new(consumer, producer);
            if let Some(user_id) = user_id {
                request = request.user_id(user_id);
            }
            if let Some(issue) = issue {
                request = request.issue(issue);
            }
            if let Some(path) = payload {
                let xml = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read payload {}", path.display()))?;
                request = request.request_data(xml);
            }

            let response = client
                .send_request(
                    &request,
                    &endpoint,
                    &XRoadRequestSerializer::from_config(&config.messages),
                    &XRoadResponseDeserializer::from_config(&config.messages),
                )
                .context("Service request failed")?;

            if let Some(fault) = &response.fault {
                anyhow::bail!("SOAP fault {}: {}", fault.code, fault.string);
            }
            println!("{}", response.response_data.unwrap_or_default());
        }
    }

    Ok(())
}
