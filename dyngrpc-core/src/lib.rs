//! # dyngrpc Core
//!
//! `dyngrpc-core` is a generic gRPC invocation engine. Given only a server address and either
//! the server's self-described schema (gRPC Server Reflection) or a local schema, it resolves
//! an arbitrary `package.Service.Method`, builds the request from JSON, performs an untyped
//! unary call and renders the response back to JSON. No generated stubs are involved: the
//! schema is runtime data.
//!
//! ## Key Components
//!
//! * **[`invoke()`]:** One-shot entry point: address + method + JSON body in, JSON out.
//! * **[`Client`]:** The typestate client behind `invoke`, usable directly to list services,
//!   describe symbols or perform several calls over one connection.
//! * **[`registry::DescriptorRegistry`]:** Collects schema files as they arrive (out of order,
//!   with duplicates) and builds the type universe from them.
//! * **[`value::DynamicValue`]:** A runtime-typed protobuf message with binary and canonical
//!   JSON encodings.
//!
//! ## Internal clients
//!
//! The clients used internally are exposed as well:
//!
//! * **[`GrpcClient`]:** A generic unary gRPC client over [`grpc::codec::DynamicCodec`].
//! * **[`ReflectionClient`]:** A `grpc.reflection.v1` client that discovers services and their
//!   schema files.
//!
//! ## Feature Flags
//!
//! * `protoc` (default): compile `.proto` sources at runtime through `protoc`
//!   ([`schema::source::SchemaSource::Protos`]).
//!
//! ## Re-exports
//!
//! This crate re-exports `prost`, `prost-reflect`, and `tonic` to ensure that consumers
//! use compatible versions of these underlying dependencies.
pub mod client;
pub mod grpc;
pub mod invoke;
pub mod reflection;
pub mod registry;
pub mod schema;
pub mod value;

pub use client::Client;
pub use grpc::client::GrpcClient;
pub use invoke::{Invocation, InvokeError, invoke};
pub use reflection::client::ReflectionClient;

// Re-exports
pub use prost;
pub use prost_reflect;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
