//! # Client State: Offline
//!
//! This module defines the `Client` behavior when it is using a local, in-memory schema
//! but is **not connected** to any gRPC server.
//!
//! In this state, the client is strictly limited to introspection tasks.
use super::{Client, Offline};
use crate::{
    registry::{DescriptorRegistry, RegistryError},
    schema::source::{SchemaSource, SchemaSourceError},
};

impl Client<Offline> {
    /// Creates a new `Client` in the Offline state from a local schema source.
    ///
    /// This client starts in a **disconnected** state. It can be used to inspect the
    /// provided schema but cannot make network requests.
    pub fn offline(source: &SchemaSource) -> Result<Self, SchemaSourceError> {
        Ok(Self::from_registry(source.load()?)?)
    }

    /// Creates a new `Client` in the Offline state from an already populated registry.
    pub fn from_registry(registry: DescriptorRegistry) -> Result<Self, RegistryError> {
        Ok(Self::new(Offline::new(registry.universe()?)))
    }
}
