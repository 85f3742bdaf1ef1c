use crate::grpc::client::CallOptions;

/// A request object encapsulating all necessary information to perform a dynamic unary call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicRequest {
    /// Fully qualified method name (e.g., `my.package.Service.Method`).
    pub method: String,
    /// The request message as canonical protobuf JSON.
    pub body: String,
    /// Headers and deadline.
    pub options: CallOptions,
}
