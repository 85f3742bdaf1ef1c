#![allow(dead_code)]

use http_body::{Body as HttpBody, Frame};
use prost_types::FileDescriptorSet;
use sample_service::SampleSvcServer;
use std::convert::Infallible;
use std::future::{Future, poll_fn};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::Body;
use tonic::codegen::{Bytes, Service};
use tonic::service::Routes;
use tonic::transport::Server;
use tonic_reflection::server::v1::{ServerReflection, ServerReflectionServer};
use tonic_reflection::server::v1alpha::{
    ServerReflection as ServerReflectionV1Alpha,
    ServerReflectionServer as ServerReflectionServerV1Alpha,
};

/// A reflection service describing the given schema.
pub fn reflection_service(
    schema: FileDescriptorSet,
) -> ServerReflectionServer<impl ServerReflection> {
    tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(schema)
        .build_v1()
        .expect("Failed to setup Reflection Service")
}

/// A reflection service that knows about no user schema at all.
pub fn empty_reflection_service() -> ServerReflectionServer<impl ServerReflection> {
    tonic_reflection::server::Builder::configure()
        .build_v1()
        .expect("Failed to setup Reflection Service")
}

/// `rpc.SampleSvc` and reflection behind one in-process router.
pub fn sample_routes(server: SampleSvcServer) -> Routes {
    Routes::new(reflection_service(sample_service::file_descriptor_set())).add_service(server)
}

/// Serves `routes` over TCP on an ephemeral port and returns its URL.
pub async fn spawn_server(routes: Routes) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        Server::builder()
            .add_routes(routes)
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    format!("http://{addr}")
}

/// A `grpc.reflection.v1alpha` service describing the given schema. No v1 service is served.
pub fn reflection_service_v1alpha(
    schema: FileDescriptorSet,
) -> ServerReflectionServerV1Alpha<impl ServerReflectionV1Alpha> {
    tonic_reflection::server::Builder::configure()
        .register_file_descriptor_set(schema)
        .build_v1alpha()
        .expect("Failed to setup Reflection Service")
}

/// Holds back the response headers of the wrapped service until the first request message has
/// arrived, the way grpc-go servers behave.
#[derive(Clone)]
pub struct HeadersAfterFirstMessage<S>(pub S);

impl<S> Service<http::Request<Body>> for HeadersAfterFirstMessage<S>
where
    S: Service<http::Request<Body>, Response = http::Response<Body>, Error = Infallible>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = http::Response<Body>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: http::Request<Body>) -> Self::Future {
        let mut inner = self.0.clone();

        Box::pin(async move {
            let (parts, mut body) = request.into_parts();
            let first = poll_fn(|cx| Pin::new(&mut body).poll_frame(cx)).await;

            let body = Body::new(Replay {
                first: first.and_then(Result::ok),
                rest: body,
            });
            inner.call(http::Request::from_parts(parts, body)).await
        })
    }
}

/// A body that yields an already read frame before the rest of the original body.
struct Replay {
    first: Option<Frame<Bytes>>,
    rest: Body,
}

impl HttpBody for Replay {
    type Data = Bytes;
    type Error = tonic::Status;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if let Some(frame) = self.first.take() {
            return Poll::Ready(Some(Ok(frame)));
        }
        Pin::new(&mut self.rest).poll_frame(cx)
    }
}
