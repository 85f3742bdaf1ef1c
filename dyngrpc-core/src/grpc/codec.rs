//! # Dynamic Protobuf Codec
//!
//! This module implements `tonic::codec::Codec` over [`DynamicValue`], so `tonic` can frame and
//! transport messages that have no generated Rust struct.
//!
//! 1. **Encoder**: writes the value in the protobuf wire format. It refuses values whose type
//!    is not the request type the codec was built for.
//! 2. **Decoder**: merges the received bytes into an empty value of the response type. Bytes
//!    that do not decode as that type fail the call with `INTERNAL`.
use crate::value::DynamicValue;
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor};
use tonic::{
    Status,
    codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder},
};

/// A Codec whose request and response types are only known at runtime.
#[derive(Debug, Clone)]
pub struct DynamicCodec {
    request: MessageDescriptor,
    response: MessageDescriptor,
}

impl DynamicCodec {
    pub fn new(request: MessageDescriptor, response: MessageDescriptor) -> Self {
        Self { request, response }
    }
}

impl Codec for DynamicCodec {
    type Encode = DynamicValue;
    type Decode = DynamicValue;

    type Encoder = DynamicEncoder;
    type Decoder = DynamicDecoder;

    fn encoder(&mut self) -> Self::Encoder {
        DynamicEncoder(self.request.clone())
    }

    fn decoder(&mut self) -> Self::Decoder {
        DynamicDecoder(self.response.clone())
    }
}

#[derive(Debug)]
pub struct DynamicEncoder(MessageDescriptor);

impl Encoder for DynamicEncoder {
    type Item = DynamicValue;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        if item.descriptor() != self.0 {
            return Err(Status::internal(format!(
                "Cannot encode '{}' as '{}'",
                item.type_name(),
                self.0.full_name()
            )));
        }

        item.as_message().encode_raw(dst);
        Ok(())
    }
}

#[derive(Debug)]
pub struct DynamicDecoder(MessageDescriptor);

impl Decoder for DynamicDecoder {
    type Item = DynamicValue;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let mut msg = DynamicMessage::new(self.0.clone());
        msg.merge(src).map_err(|e| {
            Status::internal(format!(
                "Failed to decode response as '{}': {}",
                self.0.full_name(),
                e
            ))
        })?;

        Ok(Some(DynamicValue::from(msg)))
    }
}
