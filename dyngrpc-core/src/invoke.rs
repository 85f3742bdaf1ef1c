//! # One-shot Invocation
//!
//! [`invoke`] runs a complete dynamic call from nothing but an address, a method name and a
//! JSON body:
//!
//! 1. The method name is parsed. A malformed name fails here, before any network I/O.
//! 2. A connection is opened once and shared by reflection and the call itself.
//! 3. The schema is loaded from the local source if one was given (it takes precedence),
//!    otherwise it is discovered through Server Reflection.
//! 4. The method is resolved, the body decoded against its input type, the call performed and
//!    the response rendered back to JSON.
//!
//! The first failure aborts the invocation.
use crate::client::{Client, ClientConnectError, DiscoverError, DynamicCallError};
use crate::grpc::client::CallOptions;
use crate::reflection::client::ReflectionResolveError;
use crate::registry::RegistryError;
use crate::schema::source::{SchemaSource, SchemaSourceError};
use crate::schema::{MethodPath, ResolveError};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Connect(#[from] ClientConnectError),
    #[error(transparent)]
    Schema(#[from] SchemaSourceError),
    #[error("Reflection resolution failed: '{0}'")]
    Reflection(#[source] ReflectionResolveError),
    #[error("The discovered schema is not usable: '{0}'")]
    Registry(#[source] RegistryError),
    #[error("No schema available: the server exposes no service through reflection and no local schema was given")]
    NoSchemaAvailable,
    #[error(transparent)]
    Call(#[from] DynamicCallError),
}

impl From<DiscoverError> for InvokeError {
    fn from(err: DiscoverError) -> Self {
        match err {
            DiscoverError::ReflectionResolve(ReflectionResolveError::NoServices) => {
                InvokeError::NoSchemaAvailable
            }
            DiscoverError::ReflectionResolve(err) => InvokeError::Reflection(err),
            DiscoverError::Registry(err) => InvokeError::Registry(err),
        }
    }
}

/// Everything needed for one dynamic call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Server URI (e.g., `http://localhost:50051`).
    pub address: String,
    /// Fully qualified method name (e.g., `my.package.Service.Method`).
    pub method: String,
    /// Request message as canonical protobuf JSON.
    pub body: String,
    /// Local schema. When absent, the schema is discovered through reflection.
    pub schema: Option<SchemaSource>,
    pub headers: Vec<(String, String)>,
    pub timeout: Option<Duration>,
}

/// Performs one dynamic unary call and returns the response as JSON.
pub async fn invoke(invocation: Invocation) -> Result<serde_json::Value, InvokeError> {
    let Invocation {
        address,
        method,
        body,
        schema,
        headers,
        timeout,
    } = invocation;

    let path = MethodPath::parse(&method)?;

    let mut client = Client::connect(&address).await?;

    let mut client = match schema {
        Some(source) => client.with_schema(&source)?,
        None => client.discover().await?,
    };

    let response = client
        .call_method(&path, &body, CallOptions { headers, timeout })
        .await?;

    tracing::debug!(method = %path, "call succeeded");

    Ok(response.to_json().map_err(DynamicCallError::from)?)
}
