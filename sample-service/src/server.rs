//! A hand-written equivalent of the server `tonic-prost-build` would generate for
//! `rpc.SampleSvc`. Only `RPC_1` is implemented; every other path answers `UNIMPLEMENTED`.
use crate::pb::{Meta, SampleRequest, SampleResponse};
use std::sync::atomic::{AtomicU64, Ordering};
use tonic::codegen::*;
use tonic::{Request, Response, Status};

const SERVICE_NAME: &str = "rpc.SampleSvc";
const RPC_1_PATH: &str = "/rpc.SampleSvc/RPC_1";

/// Serves `rpc.SampleSvc`.
///
/// `RPC_1` greets the requested name and reports how many calls this server has handled.
#[derive(Debug, Clone, Default)]
pub struct SampleSvcServer {
    calls: Arc<AtomicU64>,
}

impl SampleSvcServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `RPC_1` calls handled so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn rpc_1(&self, request: SampleRequest) -> SampleResponse {
        let sequence = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        SampleResponse {
            message: format!("Hello, {}!", request.name),
            meta: Some(Meta {
                handler: "RPC_1".to_string(),
                sequence,
            }),
        }
    }
}

struct Rpc1Svc(SampleSvcServer);

impl tonic::server::UnaryService<SampleRequest> for Rpc1Svc {
    type Response = SampleResponse;
    type Future = BoxFuture<Response<Self::Response>, Status>;

    fn call(&mut self, request: Request<SampleRequest>) -> Self::Future {
        let server = self.0.clone();
        Box::pin(async move { Ok(Response::new(server.rpc_1(request.into_inner()))) })
    }
}

impl<B> Service<http::Request<B>> for SampleSvcServer
where
    B: Body + std::marker::Send + 'static,
    B::Error: Into<StdError> + std::marker::Send + 'static,
{
    type Response = http::Response<tonic::body::Body>;
    type Error = std::convert::Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        match req.uri().path() {
            RPC_1_PATH => {
                let method = Rpc1Svc(self.clone());
                Box::pin(async move {
                    let codec = tonic_prost::ProstCodec::default();
                    let mut grpc = tonic::server::Grpc::new(codec);
                    Ok(grpc.unary(method, req).await)
                })
            }
            path => {
                let status = Status::unimplemented(format!("'{path}' is not implemented"));
                Box::pin(async move { Ok(status.into_http()) })
            }
        }
    }
}

impl tonic::server::NamedService for SampleSvcServer {
    const NAME: &'static str = SERVICE_NAME;
}
