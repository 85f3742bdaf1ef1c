//! # Client State: Online
//!
//! This module defines the `Client` behavior when it is connected to a server and has no
//! schema yet. The schema is either discovered through Server Reflection or supplied locally,
//! both of which move the client to the [`OnlineWithSchema`] state.
use super::{Client, Descriptor, Offline, Online, OnlineWithSchema};
use crate::{
    BoxError,
    grpc::client::GrpcClient,
    reflection::client::{ReflectionClient, ReflectionResolveError},
    registry::{DescriptorRegistry, RegistryError},
    schema::source::{SchemaSource, SchemaSourceError},
};
use http::Uri;
use http_body::Body as HttpBody;
use tonic::{
    Code,
    transport::{Channel, Endpoint},
};

/// Errors that can occur when connecting to a gRPC server.
#[derive(Debug, thiserror::Error)]
pub enum ClientConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// Errors that can occur while discovering the server's schema.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    #[error("Reflection resolution failed: '{0}'")]
    ReflectionResolve(#[from] ReflectionResolveError),
    #[error("The discovered schema is not usable: '{0}'")]
    Registry(#[from] RegistryError),
}

/// Errors that can occur when looking up a descriptor in Online mode.
#[derive(Debug, thiserror::Error)]
pub enum GetDescriptorError {
    #[error("Reflection resolution failed: '{0}'")]
    ReflectionResolve(#[from] ReflectionResolveError),
    #[error("Failed to build the schema of the symbol: '{0}'")]
    Registry(#[from] RegistryError),
    #[error("Descriptor at path '{0}' not found")]
    NotFound(String),
}

impl Client<Online<Channel>> {
    /// Connects to a gRPC server and initializes the client in the `Online` state.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server URI (e.g., `http://localhost:50051`).
    ///
    /// # Returns
    ///
    /// * `Ok(Client<Online>)` - The connected client.
    /// * `Err(ClientConnectError)` - If the URL is invalid or connection fails.
    pub async fn connect(addr: &str) -> Result<Self, ClientConnectError> {
        let endpoint = Endpoint::new(addr.to_string())
            .map_err(|e| ClientConnectError::InvalidUrl(addr.to_string(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ClientConnectError::ConnectionFailed(addr.to_string(), e))?;

        tracing::debug!(%addr, "connected");
        Ok(Self::from_channel(channel, endpoint.uri()))
    }

    /// Reflection requests carry the authority of `uri` as their `host`.
    fn from_channel(channel: Channel, uri: &Uri) -> Self {
        Self::new(Online {
            reflection_client: ReflectionClient::new(channel.clone()).with_host(reflection_host(uri)),
            grpc_client: GrpcClient::new(channel),
        })
    }
}

impl<S> Client<Online<S>>
where
    S: tonic::client::GrpcService<tonic::body::Body> + Clone,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a client from an existing Tonic service/channel.
    ///
    /// The reflection client and the call client share the same underlying connection.
    pub fn from_service(service: S) -> Self {
        let reflection_client = ReflectionClient::new(service.clone());
        let grpc_client = GrpcClient::new(service);
        Self::new(Online {
            reflection_client,
            grpc_client,
        })
    }

    /// Transitions to the **OnlineWithSchema** state using a local schema source.
    ///
    /// Reflection is not used at all.
    pub fn with_schema(
        self,
        source: &SchemaSource,
    ) -> Result<Client<OnlineWithSchema<S>>, SchemaSourceError> {
        let registry = source.load()?;
        Ok(self.with_registry(registry)?)
    }

    /// Transitions to the **OnlineWithSchema** state using an already populated registry.
    pub fn with_registry(
        self,
        registry: DescriptorRegistry,
    ) -> Result<Client<OnlineWithSchema<S>>, RegistryError> {
        let pool = registry.universe()?;

        Ok(Client::new(OnlineWithSchema::new(
            self.state.grpc_client,
            pool,
        )))
    }

    /// Discovers every service of the server through Reflection and returns a client holding
    /// the resulting schema.
    ///
    /// The current client is left untouched, so a caller can still fall back to a local
    /// schema if discovery fails.
    pub async fn discover(&mut self) -> Result<Client<OnlineWithSchema<S>>, DiscoverError> {
        let mut registry = DescriptorRegistry::new();
        self.state.reflection_client.populate(&mut registry).await?;

        let pool = registry.universe()?;

        Ok(Client::new(OnlineWithSchema::new(
            self.state.grpc_client.clone(),
            pool,
        )))
    }

    /// Lists services available on the server via Reflection.
    pub async fn list_services(&mut self) -> Result<Vec<String>, ReflectionResolveError> {
        self.state.reflection_client.list_services().await
    }

    /// Resolves a symbol using Reflection.
    ///
    /// Only the file defining the symbol and its imports are fetched. Methods are looked up
    /// through their service (`package.Service.Method`).
    pub async fn get_descriptor_by_symbol(
        &mut self,
        symbol: &str,
    ) -> Result<Descriptor, GetDescriptorError> {
        let fd_set = match self
            .state
            .reflection_client
            .file_descriptor_set_by_symbol(symbol)
            .await
        {
            Ok(fd_set) => fd_set,
            Err(err) if is_not_found(&err) => {
                // Servers do not always index methods as symbols, fall back to the service.
                let service = symbol
                    .rsplit_once('.')
                    .map(|(service, _)| service)
                    .ok_or_else(|| GetDescriptorError::NotFound(symbol.to_string()))?;

                self.state
                    .reflection_client
                    .file_descriptor_set_by_symbol(service)
                    .await
                    .map_err(|err| {
                        if is_not_found(&err) {
                            GetDescriptorError::NotFound(symbol.to_string())
                        } else {
                            GetDescriptorError::ReflectionResolve(err)
                        }
                    })?
            }
            Err(err) => return Err(err.into()),
        };

        let pool = DescriptorRegistry::from_file_descriptor_set(fd_set).universe()?;

        Client::new(Offline::new(pool))
            .get_descriptor_by_symbol(symbol)
            .ok_or_else(|| GetDescriptorError::NotFound(symbol.to_string()))
    }
}

/// The `host` sent with reflection requests: the authority of the target, e.g. `localhost:50051`.
fn reflection_host(uri: &Uri) -> String {
    uri.authority()
        .map(|authority| authority.as_str().to_string())
        .unwrap_or_default()
}

fn is_not_found(err: &ReflectionResolveError) -> bool {
    match err {
        ReflectionResolveError::ServerStreamInitFailed(status)
        | ReflectionResolveError::ServerStreamFailure(status) => status.code() == Code::NotFound,
        ReflectionResolveError::ServerError { code, .. } => *code == Code::NotFound as i32,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflection_host_is_the_target_authority() {
        let uri: Uri = "http://localhost:50051".parse().unwrap();
        assert_eq!(reflection_host(&uri), "localhost:50051");

        let uri: Uri = "https://api.example.com/prefix".parse().unwrap();
        assert_eq!(reflection_host(&uri), "api.example.com");
    }

    #[tokio::test]
    async fn connected_clients_send_the_target_host() {
        let endpoint = Endpoint::from_static("http://127.0.0.1:50051");
        let client = Client::from_channel(endpoint.connect_lazy(), endpoint.uri());

        assert_eq!(client.state.reflection_client.host(), "127.0.0.1:50051");
    }
}
