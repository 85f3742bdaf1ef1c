use dyngrpc_core::client::{ClientConnectError, DynamicCallError};
use dyngrpc_core::grpc::client::GrpcRequestError;
use dyngrpc_core::reflection::client::ReflectionResolveError;
use dyngrpc_core::schema::ResolveError;
use dyngrpc_core::schema::source::SchemaSource;
use dyngrpc_core::{Invocation, InvokeError, invoke};
use sample_service::SampleSvcServer;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tonic::Code;
use tonic::service::Routes;

mod support;

fn invocation(address: &str, method: &str, body: &str) -> Invocation {
    Invocation {
        address: address.to_string(),
        method: method.to_string(),
        body: body.to_string(),
        schema: None,
        headers: vec![],
        timeout: None,
    }
}

#[tokio::test]
async fn test_invoke_through_reflection() {
    let server = SampleSvcServer::new();
    let url = support::spawn_server(support::sample_routes(server.clone())).await;

    let response = invoke(invocation(
        &url,
        "rpc.SampleSvc.RPC_1",
        r#"{"name":"abra-ca-dabra"}"#,
    ))
    .await
    .unwrap();

    assert_eq!(
        response,
        json!({
            "message": "Hello, abra-ca-dabra!",
            "meta": { "handler": "RPC_1", "sequence": "1" }
        })
    );
    assert_eq!(server.calls(), 1);
}

#[tokio::test]
async fn test_invoke_with_headers_and_timeout() {
    let url = support::spawn_server(support::sample_routes(SampleSvcServer::new())).await;

    let response = invoke(Invocation {
        headers: vec![("x-request-id".to_string(), "42".to_string())],
        timeout: Some(Duration::from_secs(5)),
        ..invocation(&url, "rpc.SampleSvc.RPC_1", r#"{"name":"headers"}"#)
    })
    .await
    .unwrap();

    assert_eq!(response["message"], "Hello, headers!");
}

#[tokio::test]
async fn test_invoke_with_local_descriptor_set_needs_no_reflection() {
    // No reflection service on this server.
    let server = SampleSvcServer::new();
    let url = support::spawn_server(Routes::new(server.clone())).await;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&sample_service::encoded_file_descriptor_set())
        .unwrap();

    let response = invoke(Invocation {
        schema: Some(SchemaSource::DescriptorSet(file.path().to_path_buf())),
        ..invocation(&url, "rpc.SampleSvc.RPC_1", r#"{"name":"offline"}"#)
    })
    .await
    .unwrap();

    assert_eq!(response["message"], "Hello, offline!");
    assert_eq!(server.calls(), 1);
}

#[tokio::test]
async fn test_invoke_without_reflection_or_schema_fails() {
    let url = support::spawn_server(Routes::new(SampleSvcServer::new())).await;

    let result = invoke(invocation(&url, "rpc.SampleSvc.RPC_1", "{}")).await;

    assert!(matches!(
        result,
        Err(InvokeError::Reflection(ReflectionResolveError::ServerStreamInitFailed(status)))
            if status.code() == Code::Unimplemented
    ));
}

#[tokio::test]
async fn test_invoke_without_services_reports_no_schema() {
    let routes = Routes::new(support::empty_reflection_service()).add_service(SampleSvcServer::new());
    let url = support::spawn_server(routes).await;

    let result = invoke(invocation(&url, "rpc.SampleSvc.RPC_1", "{}")).await;

    assert!(matches!(result, Err(InvokeError::NoSchemaAvailable)));
}

#[tokio::test]
async fn test_malformed_method_name_fails_before_connecting() {
    // Nothing listens on port 1: reaching the network would fail with a connection error.
    let result = invoke(invocation("http://127.0.0.1:1", "onlytwo.segments", "{}")).await;

    assert!(matches!(
        result,
        Err(InvokeError::Resolve(ResolveError::InvalidMethodName(name))) if name == "onlytwo.segments"
    ));
}

#[tokio::test]
async fn test_unreachable_server_fails_to_connect() {
    let result = invoke(invocation("http://127.0.0.1:1", "rpc.SampleSvc.RPC_1", "{}")).await;

    assert!(matches!(
        result,
        Err(InvokeError::Connect(ClientConnectError::ConnectionFailed(..)))
    ));
}

#[tokio::test]
async fn test_invalid_headers_are_rejected() {
    let server = SampleSvcServer::new();
    let url = support::spawn_server(support::sample_routes(server.clone())).await;

    let result = invoke(Invocation {
        headers: vec![("bad key".to_string(), "v".to_string())],
        ..invocation(&url, "rpc.SampleSvc.RPC_1", "{}")
    })
    .await;

    assert!(matches!(
        result,
        Err(InvokeError::Call(DynamicCallError::GrpcRequestError(
            GrpcRequestError::InvalidMetadataKey { .. }
        )))
    ));
    assert_eq!(server.calls(), 0);
}

#[tokio::test]
async fn test_invoke_against_a_v1alpha_only_server() {
    let server = SampleSvcServer::new();
    let routes = Routes::new(support::reflection_service_v1alpha(
        sample_service::file_descriptor_set(),
    ))
    .add_service(server.clone());
    let url = support::spawn_server(routes).await;

    let response = invoke(invocation(&url, "rpc.SampleSvc.RPC_1", r#"{"name":"alpha"}"#))
        .await
        .unwrap();

    assert_eq!(response["message"], "Hello, alpha!");
    assert_eq!(server.calls(), 1);
}
