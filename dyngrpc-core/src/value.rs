//! # Dynamic Values
//!
//! A [`DynamicValue`] is a protobuf message whose shape is only known at runtime. It is bound
//! to one [`MessageDescriptor`] and every field access goes through that descriptor's field
//! table, by name. Unset fields stay absent until they are explicitly set.
//!
//! Values can be moved between three representations:
//!
//! * **Binary**: the protobuf wire format, used on the network.
//! * **JSON text**: the canonical protobuf JSON mapping. Field names use their camelCase
//!   projection and 64-bit integers are rendered as JSON strings (and accepted either as
//!   strings or numbers).
//! * **Structured JSON**: the same mapping as a `serde_json::Value`.
//!
//! Parsing is all-or-nothing: a failed decode returns an error and never a half-filled value.
use prost::Message;
use prost_reflect::{DynamicMessage, MessageDescriptor, ReflectMessage, Value};
use std::borrow::Cow;

#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    #[error("Message '{message}' has no field named '{field}'")]
    FieldNotFound { message: String, field: String },
    #[error("Value does not match the type of field '{field}' in message '{message}'")]
    InvalidFieldValue { message: String, field: String },
    #[error("Failed to parse JSON as '{message}': {source}")]
    Parse {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to render '{message}' as JSON: {source}")]
    Encode {
        message: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to decode protobuf bytes as '{message}': {source}")]
    Decode {
        message: String,
        #[source]
        source: prost::DecodeError,
    },
}

/// A runtime-typed protobuf message.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicValue(DynamicMessage);

impl DynamicValue {
    /// Creates an empty value of the given message type.
    pub fn new(descriptor: MessageDescriptor) -> Self {
        Self(DynamicMessage::new(descriptor))
    }

    pub fn descriptor(&self) -> MessageDescriptor {
        self.0.descriptor()
    }

    /// Fully qualified name of the message type, e.g. `rpc.SampleMessage`.
    pub fn type_name(&self) -> String {
        self.0.descriptor().full_name().to_string()
    }

    /// Assigns a field by its protobuf name, overwriting any previous value.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), ValueError> {
        let descriptor = self.0.descriptor();
        let field = descriptor
            .get_field_by_name(name)
            .ok_or_else(|| ValueError::FieldNotFound {
                message: descriptor.full_name().to_string(),
                field: name.to_string(),
            })?;

        self.0
            .try_set_field(&field, value)
            .map_err(|_| ValueError::InvalidFieldValue {
                message: descriptor.full_name().to_string(),
                field: name.to_string(),
            })
    }

    /// Returns the field's value if it is set.
    pub fn get_field(&self, name: &str) -> Option<Cow<'_, Value>> {
        if self.has_field(name) {
            self.0.get_field_by_name(name)
        } else {
            None
        }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.0.has_field_by_name(name)
    }

    pub fn clear_field(&mut self, name: &str) {
        self.0.clear_field_by_name(name);
    }

    /// Encodes the value in the protobuf wire format.
    pub fn encode_binary(&self) -> Vec<u8> {
        self.0.encode_to_vec()
    }

    /// Decodes protobuf wire bytes as a value of the given type.
    pub fn decode_binary(bytes: &[u8], descriptor: MessageDescriptor) -> Result<Self, ValueError> {
        let message = descriptor.full_name().to_string();
        DynamicMessage::decode(descriptor, bytes)
            .map(Self)
            .map_err(|source| ValueError::Decode { message, source })
    }

    /// Renders the value as canonical protobuf JSON text.
    pub fn encode_text(&self) -> Result<String, ValueError> {
        serde_json::to_string(&self.0).map_err(|source| ValueError::Encode {
            message: self.type_name(),
            source,
        })
    }

    /// Parses canonical protobuf JSON text as a value of the given type.
    ///
    /// Unknown field names and values whose shape does not fit the declared field kind are
    /// rejected, as is trailing input after the JSON object.
    pub fn decode_text(text: &str, descriptor: MessageDescriptor) -> Result<Self, ValueError> {
        let message = descriptor.full_name().to_string();
        let mut deserializer = serde_json::Deserializer::from_str(text);

        let value = DynamicMessage::deserialize(descriptor, &mut deserializer)
            .and_then(|value| deserializer.end().map(|_| value))
            .map_err(|source| ValueError::Parse { message, source })?;

        Ok(Self(value))
    }

    /// Same mapping as [`Self::encode_text`], as a structured JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, ValueError> {
        serde_json::to_value(&self.0).map_err(|source| ValueError::Encode {
            message: self.type_name(),
            source,
        })
    }

    /// Same mapping as [`Self::decode_text`], from a structured JSON value.
    pub fn from_json(
        json: serde_json::Value,
        descriptor: MessageDescriptor,
    ) -> Result<Self, ValueError> {
        let message = descriptor.full_name().to_string();
        DynamicMessage::deserialize(descriptor, json)
            .map(Self)
            .map_err(|source| ValueError::Parse { message, source })
    }

    pub fn as_message(&self) -> &DynamicMessage {
        &self.0
    }

    pub fn into_inner(self) -> DynamicMessage {
        self.0
    }
}

impl From<DynamicMessage> for DynamicValue {
    fn from(message: DynamicMessage) -> Self {
        Self(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_reflect::DescriptorPool;

    fn descriptor(name: &str) -> MessageDescriptor {
        let pool = DescriptorPool::from_file_descriptor_set(sample_service::file_descriptor_set())
            .expect("sample schema should be valid");
        pool.get_message_by_name(name).unwrap()
    }

    fn sample_message() -> DynamicValue {
        let mut value = DynamicValue::new(descriptor("rpc.SampleMessage"));
        value
            .set_field("string_value", Value::String("Hello World!!!".to_string()))
            .unwrap();
        value.set_field("integer_value", Value::I64(54321)).unwrap();
        value.set_field("boolean_value", Value::Bool(false)).unwrap();
        value
    }

    #[test]
    fn new_values_have_no_fields_set() {
        let value = DynamicValue::new(descriptor("rpc.SampleMessage"));

        assert!(!value.has_field("string_value"));
        assert!(value.get_field("integer_value").is_none());
        assert_eq!(value.encode_text().unwrap(), "{}");
        assert!(value.encode_binary().is_empty());
    }

    #[test]
    fn values_report_the_type_they_are_bound_to() {
        let value = DynamicValue::new(descriptor("rpc.SampleRequest"));

        assert_eq!(value.descriptor(), descriptor("rpc.SampleRequest"));
        assert_eq!(value.type_name(), "rpc.SampleRequest");
    }

    #[test]
    fn set_field_overwrites_previous_values() {
        let mut value = DynamicValue::new(descriptor("rpc.SampleMessage"));
        value.set_field("integer_value", Value::I64(1)).unwrap();
        value.set_field("integer_value", Value::I64(2)).unwrap();

        assert_eq!(value.get_field("integer_value").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn set_field_rejects_unknown_fields() {
        let mut value = DynamicValue::new(descriptor("rpc.SampleMessage"));

        let err = value
            .set_field("missing", Value::Bool(true))
            .unwrap_err();

        assert!(matches!(
            err,
            ValueError::FieldNotFound { message, field }
                if message == "rpc.SampleMessage" && field == "missing"
        ));
    }

    #[test]
    fn set_field_rejects_values_of_the_wrong_kind() {
        let mut value = DynamicValue::new(descriptor("rpc.SampleMessage"));

        let err = value
            .set_field("boolean_value", Value::String("yes".to_string()))
            .unwrap_err();

        assert!(matches!(err, ValueError::InvalidFieldValue { field, .. } if field == "boolean_value"));
        assert!(!value.has_field("boolean_value"));
    }

    #[test]
    fn text_encoding_uses_camel_case_and_stringified_int64() {
        let text = sample_message().encode_text().unwrap();

        assert_eq!(
            text,
            r#"{"stringValue":"Hello World!!!","integerValue":"54321","booleanValue":false}"#
        );
    }

    #[test]
    fn text_round_trip_reproduces_set_fields_only() {
        let original = sample_message();

        let decoded =
            DynamicValue::decode_text(&original.encode_text().unwrap(), original.descriptor())
                .unwrap();

        assert_eq!(decoded, original);
        assert_eq!(
            decoded.get_field("string_value").unwrap().as_str(),
            Some("Hello World!!!")
        );
        assert_eq!(decoded.get_field("integer_value").unwrap().as_i64(), Some(54321));
        assert_eq!(decoded.get_field("boolean_value").unwrap().as_bool(), Some(false));
        assert!(!decoded.has_field("tags"));
        assert!(!decoded.has_field("kind"));
    }

    #[test]
    fn int64_is_accepted_as_string_or_number() {
        let desc = descriptor("rpc.SampleMessage");

        let from_string = DynamicValue::decode_text(r#"{"integerValue":"54321"}"#, desc.clone())
            .unwrap();
        let from_number = DynamicValue::decode_text(r#"{"integerValue":54321}"#, desc).unwrap();

        assert_eq!(from_string, from_number);
    }

    #[test]
    fn proto_field_names_are_accepted_on_decode() {
        let decoded = DynamicValue::decode_text(
            r#"{"string_value":"x","tags":["a","b"],"kind":"SAMPLE_KIND_PRIMARY"}"#,
            descriptor("rpc.SampleMessage"),
        )
        .unwrap();

        assert_eq!(decoded.get_field("string_value").unwrap().as_str(), Some("x"));
        assert_eq!(decoded.get_field("kind").unwrap().as_enum_number(), Some(1));
        assert_eq!(
            decoded.get_field("tags").unwrap().as_list().map(|l| l.len()),
            Some(2)
        );
    }

    #[test]
    fn unknown_json_fields_are_rejected() {
        let result = DynamicValue::decode_text(
            r#"{"stringValue":"ok","notAField":1}"#,
            descriptor("rpc.SampleMessage"),
        );

        let err = result.unwrap_err();
        assert!(matches!(&err, ValueError::Parse { message, .. } if message == "rpc.SampleMessage"));
        assert!(err.to_string().contains("notAField"));
    }

    #[test]
    fn incompatible_json_shapes_are_rejected() {
        let desc = descriptor("rpc.SampleMessage");

        assert!(DynamicValue::decode_text(r#"{"booleanValue":"nope"}"#, desc.clone()).is_err());
        assert!(DynamicValue::decode_text(r#"{"integerValue":true}"#, desc.clone()).is_err());
        assert!(DynamicValue::decode_text(r#"{"tags":"not-a-list"}"#, desc.clone()).is_err());
        assert!(DynamicValue::decode_text(r#"{"stringValue":"a"} trailing"#, desc).is_err());
    }

    #[test]
    fn binary_round_trip_reproduces_set_fields() {
        let original = sample_message();

        let decoded =
            DynamicValue::decode_binary(&original.encode_binary(), original.descriptor()).unwrap();

        assert_eq!(decoded, original);
        assert!(decoded.has_field("boolean_value"));
    }

    #[test]
    fn binary_decode_failures_name_the_type() {
        let err = DynamicValue::decode_binary(&[0x0a, 0xff], descriptor("rpc.SampleMessage"))
            .unwrap_err();

        assert!(matches!(err, ValueError::Decode { message, .. } if message == "rpc.SampleMessage"));
    }

    #[test]
    fn structured_json_matches_text_mapping() {
        let value = sample_message();

        let json = value.to_json().unwrap();
        assert_eq!(json["integerValue"], "54321");

        let back = DynamicValue::from_json(json, value.descriptor()).unwrap();
        assert_eq!(back, value);
    }
}
