//! # Reflection Client
//!
//! A client implementation for `grpc.reflection.v1`, falling back to `grpc.reflection.v1alpha`
//! for servers that only implement the older version of the protocol.
//!
//! All requests of a [`ReflectionClient`] operation go through a single
//! `ServerReflectionInfo` stream (a *session*). Requests are strictly sequential: one request
//! is sent and its response awaited before the next one is sent. The first request is queued
//! before the stream is opened, since some servers (grpc-go among them) hold back the response
//! headers until they have received a request.
//!
//! Servers differ in how much they return for a symbol. Some send the defining file together
//! with all of its transitive imports, others (`tonic-reflection` among them) only send the
//! defining file. The client therefore inspects the imports of everything it receives and
//! asks for each missing file by name, never asking for the same file twice.
//!
//! ## References
//!
//! * [gRPC Server Reflection Protocol](https://github.com/grpc/grpc/blob/master/doc/server-reflection.md)
use crate::BoxError;
use crate::registry::{DescriptorRegistry, REFLECTION_PACKAGES};
use http_body::Body as HttpBody;
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::Channel;
use tonic::{Code, Streaming, client::GrpcService};
use tonic_reflection::pb::{v1, v1alpha};
use v1::{
    server_reflection_request::MessageRequest, server_reflection_response::MessageResponse,
};

#[derive(Debug, thiserror::Error)]
pub enum ReflectionResolveError {
    #[error(
        "Failed to start a stream request with the reflection server, reflection might not be supported: '{0}'"
    )]
    ServerStreamInitFailed(#[source] tonic::Status),

    #[error("The server stream returned an error status: '{0}'")]
    ServerStreamFailure(#[source] tonic::Status),

    #[error("Reflection stream closed unexpectedly")]
    StreamClosed,

    #[error("Internal error: Failed to send request to stream")]
    SendFailed,

    #[error("Server returned reflection error code {code}: {message}")]
    ServerError { code: i32, message: String },

    #[error("Protocol error: Received unexpected response type: {0}")]
    UnexpectedResponseType(String),

    #[error("Failed to decode FileDescriptorProto: {0}")]
    DecodeError(#[from] prost::DecodeError),

    #[error("The server does not expose any service through reflection")]
    NoServices,
}

impl ReflectionResolveError {
    /// Whether the session stream is unusable after this error.
    fn ends_session(&self) -> bool {
        matches!(
            self,
            Self::ServerStreamFailure(_) | Self::StreamClosed | Self::SendFailed
        )
    }
}

/// Version of the reflection protocol spoken with a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflectionVersion {
    /// `grpc.reflection.v1`
    V1,
    /// `grpc.reflection.v1alpha`
    V1Alpha,
}

/// Outcome of [`ReflectionClient::populate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulateReport {
    /// User services listed by the server.
    pub services: usize,
    /// Fragments newly stored in the registry.
    pub files_stored: usize,
    /// Requests that failed and were skipped.
    pub failures: usize,
}

/// A generic client for the gRPC Server Reflection Protocol.
#[derive(Debug, Clone)]
pub struct ReflectionClient<S = Channel> {
    v1: v1::server_reflection_client::ServerReflectionClient<S>,
    v1alpha: v1alpha::server_reflection_client::ServerReflectionClient<S>,
    host: String,
    version: Option<ReflectionVersion>,
}

impl<S> ReflectionClient<S>
where
    S: GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(service: S) -> Self {
        Self {
            v1: v1::server_reflection_client::ServerReflectionClient::new(service.clone()),
            v1alpha: v1alpha::server_reflection_client::ServerReflectionClient::new(service),
            host: String::new(),
            version: None,
        }
    }

    /// Sets the `host` sent with every reflection request. Empty by default, servers are
    /// free to ignore it.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// The `host` sent with every reflection request.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The protocol version the server answered to, once a session has been opened.
    pub fn version(&self) -> Option<ReflectionVersion> {
        self.version
    }

    /// Lists the services exposed by the server, the reflection service itself excluded.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionResolveError> {
        let (_, response) = self
            .open_session(MessageRequest::ListServices(String::new()))
            .await?;
        service_names(response)
    }

    /// Returns the file(s) the server sends for a fully qualified symbol.
    pub async fn file_containing_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<Vec<FileDescriptorProto>, ReflectionResolveError> {
        let (_, response) = self
            .open_session(MessageRequest::FileContainingSymbol(symbol.to_string()))
            .await?;
        files(response)
    }

    /// Returns the file(s) the server sends for a file name.
    pub async fn file_by_filename(
        &mut self,
        name: &str,
    ) -> Result<Vec<FileDescriptorProto>, ReflectionResolveError> {
        let (_, response) = self
            .open_session(MessageRequest::FileByFilename(name.to_string()))
            .await?;
        files(response)
    }

    /// Builds a self-contained `FileDescriptorSet` for a symbol (e.g., `my.package.MyService`):
    /// the file defining it plus every file it transitively imports.
    ///
    /// Any failure aborts the operation.
    pub async fn file_descriptor_set_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<FileDescriptorSet, ReflectionResolveError> {
        let (mut session, response) = self
            .open_session(MessageRequest::FileContainingSymbol(symbol.to_string()))
            .await?;

        let mut registry = DescriptorRegistry::new();
        registry.extend(files(response)?);

        let mut requested = HashSet::new();
        while let Some(dependency) = next_missing(&registry, &mut requested) {
            let response = session
                .round_trip(MessageRequest::FileByFilename(dependency))
                .await?;
            registry.extend(files(response)?);
        }

        Ok(registry.snapshot())
    }

    /// Discovers every service of the server and stores their schema in `registry`.
    ///
    /// Failing to open the session or to list the services is fatal, the caller may fall back
    /// to a local schema. A failure while fetching one service (or one of its imports) is
    /// logged and skipped, the remaining services are still fetched. Whether the collected
    /// schema is complete is checked when the universe is built.
    ///
    /// # Errors
    ///
    /// [`ReflectionResolveError::NoServices`] if the server lists no user service.
    pub async fn populate(
        &mut self,
        registry: &mut DescriptorRegistry,
    ) -> Result<PopulateReport, ReflectionResolveError> {
        let (opened, response) = self
            .open_session(MessageRequest::ListServices(String::new()))
            .await?;
        let services = service_names(response)?;

        if services.is_empty() {
            return Err(ReflectionResolveError::NoServices);
        }

        let mut report = PopulateReport {
            services: services.len(),
            ..Default::default()
        };
        let mut session = Some(opened);

        for service in services {
            let request = MessageRequest::FileContainingSymbol(service.clone());

            match self.fetch(&mut session, request).await.and_then(files) {
                Ok(files) => report.files_stored += store(registry, files),
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!(%service, error = %err, "skipping service, its schema could not be fetched");
                }
            }
        }

        let mut requested = HashSet::new();
        while let Some(dependency) = next_missing(registry, &mut requested) {
            let request = MessageRequest::FileByFilename(dependency.clone());

            match self.fetch(&mut session, request).await.and_then(files) {
                Ok(files) => report.files_stored += store(registry, files),
                Err(err) => {
                    report.failures += 1;
                    tracing::warn!(file = %dependency, error = %err, "failed to fetch imported file");
                }
            }
        }

        tracing::debug!(?report, "reflection discovery finished");
        Ok(report)
    }

    /// Sends one request on the current session, opening a new one if the previous request
    /// left the stream unusable.
    async fn fetch(
        &mut self,
        session: &mut Option<ReflectionSession>,
        request: MessageRequest,
    ) -> Result<MessageResponse, ReflectionResolveError> {
        let Some(mut active) = session.take() else {
            let (opened, response) = self.open_session(request).await?;
            *session = Some(opened);
            return Ok(response);
        };

        let result = active.round_trip(request).await;

        if !matches!(&result, Err(err) if err.ends_session()) {
            *session = Some(active);
        }

        result
    }

    /// Opens a session with `first` as its first request and waits for the response.
    ///
    /// Until a server has answered once, `v1` is tried first and `v1alpha` used when the
    /// server does not implement `v1`.
    async fn open_session(
        &mut self,
        first: MessageRequest,
    ) -> Result<(ReflectionSession, MessageResponse), ReflectionResolveError> {
        let mut session = match self.version {
            Some(ReflectionVersion::V1) => self.open_v1(first).await?,
            Some(ReflectionVersion::V1Alpha) => self.open_v1alpha(first).await?,
            None => match self.open_v1(first.clone()).await {
                Ok(session) => {
                    self.version = Some(ReflectionVersion::V1);
                    session
                }
                Err(ReflectionResolveError::ServerStreamInitFailed(status))
                    if status.code() == Code::Unimplemented =>
                {
                    tracing::debug!("grpc.reflection.v1 is not implemented, trying v1alpha");
                    let session = self.open_v1alpha(first).await?;
                    self.version = Some(ReflectionVersion::V1Alpha);
                    session
                }
                Err(err) => return Err(err),
            },
        };

        let response = session.receive().await?;
        Ok((session, response))
    }

    async fn open_v1(
        &mut self,
        first: MessageRequest,
    ) -> Result<ReflectionSession, ReflectionResolveError> {
        let (requests, rx) = mpsc::channel(1);
        requests
            .send(v1::ServerReflectionRequest {
                host: self.host.clone(),
                message_request: Some(first),
            })
            .await
            .map_err(|_| ReflectionResolveError::SendFailed)?;

        let responses = self
            .v1
            .server_reflection_info(ReceiverStream::new(rx))
            .await
            .map_err(ReflectionResolveError::ServerStreamInitFailed)?
            .into_inner();

        Ok(ReflectionSession {
            stream: SessionStream::V1 {
                requests,
                responses,
            },
            host: self.host.clone(),
        })
    }

    async fn open_v1alpha(
        &mut self,
        first: MessageRequest,
    ) -> Result<ReflectionSession, ReflectionResolveError> {
        let (requests, rx) = mpsc::channel(1);
        requests
            .send(v1alpha::ServerReflectionRequest {
                host: self.host.clone(),
                message_request: Some(to_v1alpha(first)),
            })
            .await
            .map_err(|_| ReflectionResolveError::SendFailed)?;

        let responses = self
            .v1alpha
            .server_reflection_info(ReceiverStream::new(rx))
            .await
            .map_err(ReflectionResolveError::ServerStreamInitFailed)?
            .into_inner();

        Ok(ReflectionSession {
            stream: SessionStream::V1Alpha {
                requests,
                responses,
            },
            host: self.host.clone(),
        })
    }
}

enum SessionStream {
    V1 {
        requests: mpsc::Sender<v1::ServerReflectionRequest>,
        responses: Streaming<v1::ServerReflectionResponse>,
    },
    V1Alpha {
        requests: mpsc::Sender<v1alpha::ServerReflectionRequest>,
        responses: Streaming<v1alpha::ServerReflectionResponse>,
    },
}

/// One open `ServerReflectionInfo` stream.
///
/// Dropping the session closes the request side of the stream.
struct ReflectionSession {
    stream: SessionStream,
    host: String,
}

impl ReflectionSession {
    async fn round_trip(
        &mut self,
        request: MessageRequest,
    ) -> Result<MessageResponse, ReflectionResolveError> {
        self.send(request).await?;
        self.receive().await
    }

    async fn send(&mut self, request: MessageRequest) -> Result<(), ReflectionResolveError> {
        tracing::debug!(?request, "reflection request");
        let host = self.host.clone();

        let sent = match &self.stream {
            SessionStream::V1 { requests, .. } => requests
                .send(v1::ServerReflectionRequest {
                    host,
                    message_request: Some(request),
                })
                .await
                .is_ok(),
            SessionStream::V1Alpha { requests, .. } => requests
                .send(v1alpha::ServerReflectionRequest {
                    host,
                    message_request: Some(to_v1alpha(request)),
                })
                .await
                .is_ok(),
        };

        if sent {
            Ok(())
        } else {
            Err(ReflectionResolveError::SendFailed)
        }
    }

    async fn receive(&mut self) -> Result<MessageResponse, ReflectionResolveError> {
        let response = match &mut self.stream {
            SessionStream::V1 { responses, .. } => responses
                .message()
                .await
                .map_err(ReflectionResolveError::ServerStreamFailure)?
                .ok_or(ReflectionResolveError::StreamClosed)?
                .message_response,
            SessionStream::V1Alpha { responses, .. } => responses
                .message()
                .await
                .map_err(ReflectionResolveError::ServerStreamFailure)?
                .ok_or(ReflectionResolveError::StreamClosed)?
                .message_response
                .map(from_v1alpha),
        };

        match response {
            Some(MessageResponse::ErrorResponse(e)) => Err(ReflectionResolveError::ServerError {
                code: e.error_code,
                message: e.error_message,
            }),
            Some(other) => Ok(other),
            None => Err(ReflectionResolveError::UnexpectedResponseType(
                "Empty Message".into(),
            )),
        }
    }
}

fn service_names(response: MessageResponse) -> Result<Vec<String>, ReflectionResolveError> {
    match response {
        MessageResponse::ListServicesResponse(resp) => Ok(resp
            .service
            .into_iter()
            .map(|s| s.name)
            .filter(|name| !is_reflection_service(name))
            .collect()),
        other => Err(ReflectionResolveError::UnexpectedResponseType(format!(
            "{other:?}"
        ))),
    }
}

fn files(response: MessageResponse) -> Result<Vec<FileDescriptorProto>, ReflectionResolveError> {
    match response {
        MessageResponse::FileDescriptorResponse(resp) => resp
            .file_descriptor_proto
            .iter()
            .map(|raw| {
                FileDescriptorProto::decode(raw.as_slice()).map_err(ReflectionResolveError::from)
            })
            .collect(),
        other => Err(ReflectionResolveError::UnexpectedResponseType(format!(
            "{other:?}"
        ))),
    }
}

fn to_v1alpha(request: MessageRequest) -> v1alpha::server_reflection_request::MessageRequest {
    use v1alpha::server_reflection_request::MessageRequest as Alpha;

    match request {
        MessageRequest::FileByFilename(name) => Alpha::FileByFilename(name),
        MessageRequest::FileContainingSymbol(symbol) => Alpha::FileContainingSymbol(symbol),
        MessageRequest::FileContainingExtension(ext) => {
            Alpha::FileContainingExtension(v1alpha::ExtensionRequest {
                containing_type: ext.containing_type,
                extension_number: ext.extension_number,
            })
        }
        MessageRequest::AllExtensionNumbersOfType(name) => Alpha::AllExtensionNumbersOfType(name),
        MessageRequest::ListServices(pattern) => Alpha::ListServices(pattern),
    }
}

fn from_v1alpha(response: v1alpha::server_reflection_response::MessageResponse) -> MessageResponse {
    use v1alpha::server_reflection_response::MessageResponse as Alpha;

    match response {
        Alpha::FileDescriptorResponse(resp) => {
            MessageResponse::FileDescriptorResponse(v1::FileDescriptorResponse {
                file_descriptor_proto: resp.file_descriptor_proto,
            })
        }
        Alpha::AllExtensionNumbersResponse(resp) => {
            MessageResponse::AllExtensionNumbersResponse(v1::ExtensionNumberResponse {
                base_type_name: resp.base_type_name,
                extension_number: resp.extension_number,
            })
        }
        Alpha::ListServicesResponse(resp) => {
            MessageResponse::ListServicesResponse(v1::ListServiceResponse {
                service: resp
                    .service
                    .into_iter()
                    .map(|s| v1::ServiceResponse { name: s.name })
                    .collect(),
            })
        }
        Alpha::ErrorResponse(resp) => MessageResponse::ErrorResponse(v1::ErrorResponse {
            error_code: resp.error_code,
            error_message: resp.error_message,
        }),
    }
}

fn is_reflection_service(name: &str) -> bool {
    REFLECTION_PACKAGES.iter().any(|package| {
        name.strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
    })
}

/// Next import that is neither held nor already requested in this session.
fn next_missing(registry: &DescriptorRegistry, requested: &mut HashSet<String>) -> Option<String> {
    registry
        .missing_dependencies()
        .into_iter()
        .find(|dependency| requested.insert(dependency.clone()))
}

fn store(registry: &mut DescriptorRegistry, files: Vec<FileDescriptorProto>) -> usize {
    files
        .into_iter()
        .map(|file| registry.insert(file))
        .filter(|stored| *stored)
        .count()
}
