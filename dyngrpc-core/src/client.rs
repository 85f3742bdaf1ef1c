//! # Dynamic Client
//!
//! This module implements the high-level logic for executing dynamic gRPC requests.
//!
//! The [`Client`] uses a **Typestate Pattern** to make explicit where the schema it works with
//! comes from. It has three possible states:
//!
//! 1. **[`Online`]**: The default state when connecting. The client can use the gRPC
//!    Server Reflection Protocol (`grpc.reflection.v1`) to discover services, and turns into
//!    [`OnlineWithSchema`] once the schema has been discovered.
//! 2. **[`OnlineWithSchema`]**: The client is connected to a server and holds a complete type
//!    universe, either discovered through reflection or loaded from a local source.
//!    This is the only state that can perform calls.
//! 3. **[`Offline`]**: The client is **not connected** to any server. It holds a local schema
//!    and can only be used for introspection (listing services, describing symbols).
//!
//! ## Example: State Transition
//!
//! ```rust,no_run
//! use dyngrpc_core::client::{CallOptions, Client, DynamicRequest};
//! use dyngrpc_core::schema::source::SchemaSource;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Online State
//! let mut client = Client::connect("http://localhost:50051").await?;
//!
//! // 2. OnlineWithSchema, discovered through reflection...
//! let mut discovered = client.discover().await?;
//! let response = discovered
//!     .call(DynamicRequest {
//!         method: "rpc.SampleSvc.RPC_1".to_string(),
//!         body: r#"{"name":"abra-ca-dabra"}"#.to_string(),
//!         options: CallOptions::default(),
//!     })
//!     .await?;
//!
//! // ...or loaded from disk
//! let source = SchemaSource::DescriptorSet("descriptor.bin".into());
//! let mut with_schema = client.with_schema(&source)?;
//!
//! // 3. Offline State (Disconnected + Local Schema)
//! let offline = Client::offline(&source)?;
//! let services = offline.list_services();
//! # Ok(())
//! # }
//! ```
pub mod offline;
pub mod online;
pub mod online_with_schema;
mod types;

pub use crate::grpc::client::CallOptions;
pub use crate::schema::Descriptor;
pub use online::{ClientConnectError, DiscoverError, GetDescriptorError};
pub use online_with_schema::DynamicCallError;
pub use types::*;

use crate::{grpc::client::GrpcClient, reflection::client::ReflectionClient, schema};
use prost_reflect::DescriptorPool;
use tonic::transport::Channel;

/// The main client for interacting with gRPC servers dynamically.
///
/// The generic parameter `T` represents the current state of the client.
#[derive(Clone, Debug)]
pub struct Client<T> {
    state: T,
}

impl<T> Client<T> {
    pub(crate) fn new(state: T) -> Self {
        Self { state }
    }
}

/// State: Connected to server, Schema from Server Reflection.
#[derive(Debug, Clone)]
pub struct Online<S = Channel> {
    reflection_client: ReflectionClient<S>,
    grpc_client: GrpcClient<S>,
}

/// State: Connected to server, Schema already known.
#[derive(Debug, Clone)]
pub struct OnlineWithSchema<S = Channel> {
    grpc_client: GrpcClient<S>,
    pool: DescriptorPool,
}

impl<S> OnlineWithSchema<S> {
    pub(crate) fn new(grpc_client: GrpcClient<S>, pool: DescriptorPool) -> Self {
        Self { pool, grpc_client }
    }
}

/// State: Disconnected, Schema from a local source.
#[derive(Debug, Clone)]
pub struct Offline {
    pool: DescriptorPool,
}

impl Offline {
    pub(crate) fn new(pool: DescriptorPool) -> Self {
        Self { pool }
    }
}

/// States that hold a complete type universe.
pub trait SchemaState {
    fn descriptor_pool(&self) -> &DescriptorPool;
}

impl SchemaState for Offline {
    fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl<S> SchemaState for OnlineWithSchema<S> {
    fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl<T> Client<T>
where
    T: SchemaState,
{
    /// Lists all services of the held schema.
    ///
    /// # Returns
    ///
    /// A list of fully qualified service names (e.g. `rpc.SampleSvc`).
    pub fn list_services(&self) -> Vec<String> {
        schema::list_services(self.state.descriptor_pool())
    }

    /// Looks up a Service, Message, Enum or Method (`package.Service.Method`) by its fully
    /// qualified name.
    pub fn get_descriptor_by_symbol(&self, symbol: &str) -> Option<Descriptor> {
        schema::describe(self.state.descriptor_pool(), symbol)
    }

    /// The type universe this client resolves against.
    pub fn descriptor_pool(&self) -> &DescriptorPool {
        self.state.descriptor_pool()
    }
}
