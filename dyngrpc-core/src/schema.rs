//! # Schema Resolution
//!
//! Maps the user-facing method surface (`package.Service.Method`) onto the structural
//! definitions held in a type universe ([`DescriptorPool`]).
//!
//! Resolution walks the universe file by file, and the services of each file in declaration
//! order, so the same universe and the same path always yield the same method.
mod descriptor;
pub mod source;

pub use descriptor::Descriptor;

use prost_reflect::{DescriptorPool, MethodDescriptor, ServiceDescriptor};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("Invalid method name '{0}'. Expected 'package.Service.Method'")]
    InvalidMethodName(String),
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{method}' not found in service '{service}'")]
    MethodNotFound { service: String, method: String },
    #[error("Method '{method}' references '{type_name}', which is not a message in the schema")]
    InvalidMethod { method: String, type_name: String },
    #[error("Method '{0}' is a streaming method, only unary methods can be invoked")]
    StreamingNotSupported(String),
}

/// A parsed `package.Service.Method` name.
///
/// The last dot-separated segment is the method, everything before it is the fully
/// qualified service name. A path has at least three non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodPath {
    service: String,
    method: String,
}

impl MethodPath {
    pub fn parse(value: &str) -> Result<Self, ResolveError> {
        let segments: Vec<&str> = value.split('.').collect();

        if segments.len() < 3 || segments.iter().any(|s| s.trim().is_empty()) {
            return Err(ResolveError::InvalidMethodName(value.to_string()));
        }

        let (method, service) = segments
            .split_last()
            .ok_or_else(|| ResolveError::InvalidMethodName(value.to_string()))?;

        Ok(Self {
            service: service.join("."),
            method: method.to_string(),
        })
    }

    /// Fully qualified service name, e.g. `rpc.SampleSvc`.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Simple method name, e.g. `RPC_1`.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl FromStr for MethodPath {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MethodPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.method)
    }
}

/// Locates a unary method in the universe.
///
/// # Errors
///
/// * [`ResolveError::ServiceNotFound`] if no file declares the service.
/// * [`ResolveError::MethodNotFound`] if the service has no method with that name.
/// * [`ResolveError::InvalidMethod`] if the method's input or output is not a message of this
///   universe.
/// * [`ResolveError::StreamingNotSupported`] for client or server streaming methods.
pub fn resolve_method(
    universe: &DescriptorPool,
    path: &MethodPath,
) -> Result<MethodDescriptor, ResolveError> {
    let service = find_service(universe, path.service())
        .ok_or_else(|| ResolveError::ServiceNotFound(path.service().to_string()))?;

    let method = service
        .methods()
        .find(|m| m.name() == path.method())
        .ok_or_else(|| ResolveError::MethodNotFound {
            service: path.service().to_string(),
            method: path.method().to_string(),
        })?;

    for message in [method.input(), method.output()] {
        if universe.get_message_by_name(message.full_name()).is_none() {
            return Err(ResolveError::InvalidMethod {
                method: method.full_name().to_string(),
                type_name: message.full_name().to_string(),
            });
        }
    }

    if method.is_client_streaming() || method.is_server_streaming() {
        return Err(ResolveError::StreamingNotSupported(
            method.full_name().to_string(),
        ));
    }

    Ok(method)
}

fn find_service(universe: &DescriptorPool, full_name: &str) -> Option<ServiceDescriptor> {
    universe
        .files()
        .flat_map(|file| file.services().collect::<Vec<_>>())
        .find(|service| service.full_name() == full_name)
}

/// Fully qualified names of every service in the universe.
pub fn list_services(universe: &DescriptorPool) -> Vec<String> {
    universe
        .services()
        .map(|s| s.full_name().to_string())
        .collect()
}

/// Looks a symbol up as a service, message, enum and finally as a `package.Service.Method`.
pub fn describe(universe: &DescriptorPool, symbol: &str) -> Option<Descriptor> {
    if let Some(descriptor) = universe.get_service_by_name(symbol) {
        return Some(Descriptor::ServiceDescriptor(descriptor));
    }
    if let Some(descriptor) = universe.get_message_by_name(symbol) {
        return Some(Descriptor::MessageDescriptor(descriptor));
    }
    if let Some(descriptor) = universe.get_enum_by_name(symbol) {
        return Some(Descriptor::EnumDescriptor(descriptor));
    }

    let path = MethodPath::parse(symbol).ok()?;
    find_service(universe, path.service())?
        .methods()
        .find(|m| m.name() == path.method())
        .map(Descriptor::MethodDescriptor)
}
