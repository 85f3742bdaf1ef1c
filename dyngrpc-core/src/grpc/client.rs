//! # Generic gRPC Client
//!
//! This module wraps a standard `tonic` client to provide a generic interface for unary
//! gRPC calls. It is agnostic to the specific Protobuf messages being exchanged.
//!
//! ## How it works
//!
//! The [`GrpcClient`] uses the [`super::codec::DynamicCodec`] to handle serialization.
//! It builds the HTTP/2 path (`/package.Service/Method`) at runtime, attaches the caller's
//! metadata and deadline, and performs exactly one request/response exchange. It never
//! retries.
use super::codec::DynamicCodec;
use crate::BoxError;
use crate::value::DynamicValue;
use http_body::Body as HttpBody;
use prost_reflect::{MessageDescriptor, MethodDescriptor};
use std::str::FromStr;
use std::time::Duration;
use tonic::{
    client::GrpcService,
    metadata::{
        MetadataKey, MetadataValue,
        errors::{InvalidMetadataKey, InvalidMetadataValue},
    },
    transport::Channel,
};

#[derive(thiserror::Error, Debug)]
pub enum GrpcRequestError {
    #[error("Internal error, the client was not ready: '{0}'")]
    ClientNotReady(#[source] BoxError),
    #[error("Invalid gRPC path '{path}': '{source}'")]
    InvalidPath {
        path: String,
        #[source]
        source: http::uri::InvalidUri,
    },
    #[error("Method '{method}' expects a '{expected}' request, got '{actual}'")]
    RequestTypeMismatch {
        method: String,
        expected: String,
        actual: String,
    },
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidMetadataKey,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidMetadataValue,
    },
    #[error("gRPC call failed: code={:?} message={:?}", .0.code(), .0.message())]
    Status(#[from] tonic::Status),
}

/// Per-call settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Custom gRPC metadata (headers) to attach to the request.
    pub headers: Vec<(String, String)>,
    /// Deadline for the whole call, sent to the server as `grpc-timeout`.
    pub timeout: Option<Duration>,
}

/// A generic client for unary gRPC calls.
#[derive(Debug, Clone)]
pub struct GrpcClient<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl<S> GrpcClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }

    /// Performs a Unary gRPC call to a resolved method.
    ///
    /// The request must be a value of the method's input type. This is checked before
    /// anything is sent.
    pub async fn unary(
        &mut self,
        method: &MethodDescriptor,
        request: DynamicValue,
        options: CallOptions,
    ) -> Result<DynamicValue, GrpcRequestError> {
        let expected = method.input();

        if request.descriptor() != expected {
            return Err(GrpcRequestError::RequestTypeMismatch {
                method: method.full_name().to_string(),
                expected: expected.full_name().to_string(),
                actual: request.type_name(),
            });
        }

        self.invoke(
            method.parent_service().full_name(),
            method.name(),
            request,
            method.output(),
            options,
        )
        .await
    }

    /// Performs a Unary gRPC call at `/{service}/{method}`, decoding the response as
    /// `response_type`.
    ///
    /// # Returns
    ///
    /// * `Ok(DynamicValue)` - The server's response.
    /// * `Err(GrpcRequestError::Status)` - The call reached the transport but failed: the
    ///   server answered with an error status, the connection was refused, the deadline
    ///   expired or the response did not decode.
    /// * `Err(_)` - The call could not be started.
    pub async fn invoke(
        &mut self,
        service: &str,
        method: &str,
        request: DynamicValue,
        response_type: MessageDescriptor,
        options: CallOptions,
    ) -> Result<DynamicValue, GrpcRequestError> {
        let path = http_path(service, method)?;
        let codec = DynamicCodec::new(request.descriptor(), response_type);
        let request = build_request(request, options)?;

        self.client
            .ready()
            .await
            .map_err(|e| GrpcRequestError::ClientNotReady(e.into()))?;

        tracing::debug!(%path, "sending unary request");

        let response = self.client.unary(request, path, codec).await?;
        Ok(response.into_inner())
    }
}

fn http_path(service: &str, method: &str) -> Result<http::uri::PathAndQuery, GrpcRequestError> {
    let path = format!("/{service}/{method}");
    http::uri::PathAndQuery::from_str(&path)
        .map_err(|source| GrpcRequestError::InvalidPath { path, source })
}

fn build_request<T>(
    payload: T,
    options: CallOptions,
) -> Result<tonic::Request<T>, GrpcRequestError> {
    let mut request = tonic::Request::new(payload);
    for (k, v) in options.headers {
        let key =
            MetadataKey::from_str(&k).map_err(|source| GrpcRequestError::InvalidMetadataKey {
                key: k.clone(),
                source,
            })?;
        let val = MetadataValue::from_str(&v)
            .map_err(|source| GrpcRequestError::InvalidMetadataValue { key: k, source })?;
        request.metadata_mut().insert(key, val);
    }
    if let Some(timeout) = options.timeout {
        request.set_timeout(timeout);
    }
    Ok(request)
}
