//! # Sample Service
//!
//! **INTERNAL USE ONLY**: This crate exists solely to provide a gRPC server implementation
//! and descriptor set for integration testing `dyngrpc`.
//! It is not intended for production use.
//!
//! The schema is built in code rather than compiled from `.proto` sources, so the test suite
//! does not need `protoc`. It is equivalent to:
//!
//! ```proto
//! // rpc/common.proto
//! syntax = "proto3";
//! package rpc.common;
//!
//! message Meta {
//!   string handler = 1;
//!   uint64 sequence = 2;
//! }
//!
//! // rpc/sample.proto
//! syntax = "proto3";
//! package rpc;
//! import "rpc/common.proto";
//!
//! enum SampleKind {
//!   SAMPLE_KIND_UNSPECIFIED = 0;
//!   SAMPLE_KIND_PRIMARY = 1;
//! }
//!
//! message SampleMessage {
//!   optional string string_value = 1;
//!   optional int64 integer_value = 2;
//!   optional bool boolean_value = 3;
//!   repeated string tags = 4;
//!   SampleKind kind = 5;
//! }
//!
//! message SampleRequest {
//!   string name = 1;
//! }
//!
//! message SampleResponse {
//!   string message = 1;
//!   rpc.common.Meta meta = 2;
//! }
//!
//! service SampleSvc {
//!   rpc RPC_1(SampleRequest) returns (SampleResponse);
//!   rpc RPC_Stream(SampleRequest) returns (stream SampleResponse);
//! }
//! ```
mod descriptor;
mod server;

pub mod pb;

pub use descriptor::{COMMON_FILE, SAMPLE_FILE, file_descriptor_set};
pub use server::SampleSvcServer;

/// Binary encoding of [`file_descriptor_set`], as `protoc --descriptor_set_out` would write it.
pub fn encoded_file_descriptor_set() -> Vec<u8> {
    use prost::Message;
    file_descriptor_set().encode_to_vec()
}
