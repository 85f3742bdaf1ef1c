//! # dyngrpc CLI Entry Point
//!
//! The main executable for the dyngrpc tool. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and sets up logging.
//! 2. **Schema**: Picks the local schema given on the command line, or server reflection.
//! 3. **Execution**: Delegates to `dyngrpc_core`.
//! 4. **Presentation**: Formats and prints the resulting data or error to standard output/error.
mod cli;
mod formatter;

use clap::Parser;
use cli::{Cli, Commands};
use dyngrpc_core::client::{Client, GetDescriptorError};
use dyngrpc_core::schema::source::SchemaSource;
use dyngrpc_core::{Invocation, invoke};
use formatter::{FormattedString, GenericError, ServiceList};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let Cli {
        log_level,
        url,
        command,
    } = Cli::parse();

    init_tracing(&log_level);
    tracing::debug!(%url, "starting");

    match command {
        Commands::Call {
            method,
            body,
            headers,
            timeout,
            schema,
        } => run_call(url, method, body, headers, timeout, schema.into_source()).await,
        Commands::List { schema } => list_services(&url, schema.into_source()).await,
        Commands::Describe { symbol, schema } => {
            describe(&url, &symbol, schema.into_source()).await
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_with(message: impl Into<FormattedString>) -> ! {
    eprintln!("{}", message.into());
    process::exit(1);
}

async fn run_call(
    url: String,
    method: String,
    body: String,
    headers: Vec<(String, String)>,
    timeout: Option<Duration>,
    schema: Option<SchemaSource>,
) {
    tracing::debug!(%method, local_schema = schema.is_some(), "calling");

    let invocation = Invocation {
        address: url,
        method,
        body,
        schema,
        headers,
        timeout,
    };

    match invoke(invocation).await {
        Ok(value) => println!("{}", FormattedString::from(value)),
        Err(err) => exit_with(err),
    }
}

async fn list_services(url: &str, schema: Option<SchemaSource>) {
    tracing::debug!(local_schema = schema.is_some(), "listing services");

    let services = match schema {
        Some(source) => match Client::offline(&source) {
            Ok(client) => client.list_services(),
            Err(err) => exit_with(err),
        },
        None => {
            let mut client = match Client::connect(url).await {
                Ok(client) => client,
                Err(err) => exit_with(err),
            };
            match client.list_services().await {
                Ok(services) => services,
                Err(err) => exit_with(err),
            }
        }
    };

    println!("{}", FormattedString::from(ServiceList(services)));
}

async fn describe(url: &str, symbol: &str, schema: Option<SchemaSource>) {
    tracing::debug!(%symbol, local_schema = schema.is_some(), "describing");

    let descriptor = match schema {
        Some(source) => {
            let client = match Client::offline(&source) {
                Ok(client) => client,
                Err(err) => exit_with(err),
            };
            match client.get_descriptor_by_symbol(symbol) {
                Some(descriptor) => descriptor,
                None => exit_with(GenericError(
                    "Symbol Lookup Failed",
                    GetDescriptorError::NotFound(symbol.to_string()),
                )),
            }
        }
        None => {
            let mut client = match Client::connect(url).await {
                Ok(client) => client,
                Err(err) => exit_with(err),
            };
            match client.get_descriptor_by_symbol(symbol).await {
                Ok(descriptor) => descriptor,
                Err(err) => exit_with(err),
            }
        }
    };

    println!("{}", FormattedString::from(descriptor));
}
