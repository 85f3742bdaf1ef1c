//! # Server Reflection
//!
//! This module contains the logic necessary to interact with the gRPC Server Reflection Protocol.
//!
//! It lets the engine query a server for its own Protobuf schema at runtime, so that
//! `dyngrpc` can call services it has never seen before.
pub mod client;
