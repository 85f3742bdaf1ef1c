//! # Generic gRPC Transport
//!
//! This module contains the low-level building blocks for performing gRPC calls using
//! dynamic message types.
//!
//! Unlike standard `tonic` clients which are strongly typed (e.g., `HelloRequest`),
//! the components here exchange [`crate::value::DynamicValue`]s whose shape is described
//! by runtime descriptors.
pub mod client;
pub mod codec;
