//! Hand-written prost types for the messages the server actually exchanges.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SampleRequest {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SampleResponse {
    #[prost(string, tag = "1")]
    pub message: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub meta: ::core::option::Option<Meta>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Meta {
    #[prost(string, tag = "1")]
    pub handler: ::prost::alloc::string::String,
    #[prost(uint64, tag = "2")]
    pub sequence: u64,
}
