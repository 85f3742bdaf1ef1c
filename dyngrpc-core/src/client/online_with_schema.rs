//! # Client State: Online With Schema
//!
//! This module defines the `Client` behavior when it is connected to a server and holds a
//! complete type universe to resolve methods and messages against.
use super::{Client, DynamicRequest, OnlineWithSchema, SchemaState};
use crate::{
    BoxError,
    grpc::client::{CallOptions, GrpcRequestError},
    schema::{self, MethodPath, ResolveError},
    value::{DynamicValue, ValueError},
};
use http_body::Body as HttpBody;

/// Errors that can occur during a dynamic call.
#[derive(Debug, thiserror::Error)]
pub enum DynamicCallError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("gRPC client request error: '{0}'")]
    GrpcRequestError(#[from] GrpcRequestError),
}

impl<S> Client<OnlineWithSchema<S>>
where
    S: tonic::client::GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Executes a unary call with a JSON body and returns the response as JSON.
    pub async fn call(
        &mut self,
        request: DynamicRequest,
    ) -> Result<serde_json::Value, DynamicCallError> {
        let path = MethodPath::parse(&request.method)?;
        let response = self.call_method(&path, &request.body, request.options).await?;
        Ok(response.to_json()?)
    }

    /// Resolves `path`, decodes `body` as the method's input type and performs the call.
    pub async fn call_method(
        &mut self,
        path: &MethodPath,
        body: &str,
        options: CallOptions,
    ) -> Result<DynamicValue, DynamicCallError> {
        let method = schema::resolve_method(self.state.descriptor_pool(), path)?;
        let request = DynamicValue::decode_text(body, method.input())?;

        Ok(self
            .state
            .grpc_client
            .unary(&method, request, options)
            .await?)
    }
}
