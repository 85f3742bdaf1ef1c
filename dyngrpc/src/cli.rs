//! # CLI
//!
//! This module defines the command-line interface of `dyngrpc` using `clap`.
//!
//! It is responsible for parsing user input and performing validation (e.g., ensuring headers
//! are `key:value` and method names are `package.Service.Method`).
use clap::{Args, Parser, Subcommand};
use dyngrpc_core::schema::MethodPath;
use dyngrpc_core::schema::source::SchemaSource;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dyngrpc", version, about = "Dynamic gRPC CLI")]
pub struct Cli {
    /// Log filter, e.g. `info` or `dyngrpc_core=debug`. Logs go to stderr.
    #[arg(long, env = "DYNGRPC_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// The server URL to connect to (e.g. http://localhost:50051)
    #[arg(env = "DYNGRPC_URL")]
    pub url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Perform a unary gRPC call to a server
    ///
    /// The schema is discovered through server reflection unless a local one is given.
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// dyngrpc http://localhost:50051 call my.pkg.Service.Method --body '{"key": "value"}'
    /// ```
    Call {
        /// Method (package.Service.Method)
        #[arg(value_parser = parse_method)]
        method: String,

        /// JSON body of the request message
        #[arg(long, value_parser = parse_body)]
        body: String,

        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,

        /// Deadline for the call, in seconds
        #[arg(long, value_parser = parse_timeout)]
        timeout: Option<Duration>,

        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// List available services
    List {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Describe a service, method, message or enum
    Describe {
        /// Fully qualified symbol (e.g. my.package.Service, my.package.Service.Method)
        symbol: String,

        #[command(flatten)]
        schema: SchemaArgs,
    },
}

/// Local schema flags. Without them, the server's reflection service is used.
#[derive(Args)]
pub struct SchemaArgs {
    /// Path to a binary descriptor set (protoc --include_imports --descriptor_set_out)
    #[arg(long, conflicts_with = "proto")]
    pub file_descriptor_set: Option<PathBuf>,

    /// A .proto file to compile with protoc (repeatable)
    #[arg(long = "proto")]
    pub proto: Vec<PathBuf>,

    /// Import path used to compile --proto files (repeatable)
    #[arg(short = 'I', long = "import-path", requires = "proto")]
    pub import_paths: Vec<PathBuf>,
}

impl SchemaArgs {
    pub fn into_source(self) -> Option<SchemaSource> {
        if let Some(path) = self.file_descriptor_set {
            return Some(SchemaSource::DescriptorSet(path));
        }

        if self.proto.is_empty() {
            return None;
        }

        Some(SchemaSource::Protos {
            files: self.proto,
            includes: self.import_paths,
        })
    }
}

fn parse_method(value: &str) -> Result<String, String> {
    MethodPath::parse(value)
        .map(|_| value.to_string())
        .map_err(|e| e.to_string())
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    s.split_once(':')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .ok_or_else(|| "Format must be 'key:value'".to_string())
}

// The text is kept as typed: it is decoded later against the method's input type.
fn parse_body(value: &str) -> Result<String, String> {
    serde_json::from_str::<serde_json::Value>(value)
        .map(|_| value.to_string())
        .map_err(|e| format!("Invalid JSON: {e}"))
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("Invalid timeout '{value}', expected seconds"))?;

    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid timeout '{value}': {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_call_with_local_protos() {
        let cli = Cli::try_parse_from([
            "dyngrpc",
            "http://localhost:50051",
            "call",
            "rpc.SampleSvc.RPC_1",
            "--body",
            r#"{"name":"x"}"#,
            "-H",
            "x-id: 7",
            "--timeout",
            "1.5",
            "--proto",
            "rpc/sample.proto",
            "-I",
            "protos",
        ])
        .unwrap();

        let Commands::Call {
            method,
            body,
            headers,
            timeout,
            schema,
        } = cli.command
        else {
            panic!("Expected call command");
        };

        assert_eq!(method, "rpc.SampleSvc.RPC_1");
        assert_eq!(body, r#"{"name":"x"}"#);
        assert_eq!(headers, vec![("x-id".to_string(), "7".to_string())]);
        assert_eq!(timeout, Some(Duration::from_millis(1500)));
        assert_eq!(
            schema.into_source(),
            Some(SchemaSource::Protos {
                files: vec!["rpc/sample.proto".into()],
                includes: vec!["protos".into()],
            })
        );
    }

    #[test]
    fn rejects_two_segment_methods() {
        let result = Cli::try_parse_from([
            "dyngrpc",
            "http://localhost:50051",
            "call",
            "onlytwo.segments",
            "--body",
            "{}",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_both_schema_sources() {
        let result = Cli::try_parse_from([
            "dyngrpc",
            "http://localhost:50051",
            "list",
            "--file-descriptor-set",
            "set.bin",
            "--proto",
            "a.proto",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn no_schema_flags_means_reflection() {
        let cli = Cli::try_parse_from(["dyngrpc", "http://localhost:50051", "list"]).unwrap();

        let Commands::List { schema } = cli.command else {
            panic!("Expected list command");
        };
        assert_eq!(schema.into_source(), None);
    }
}
