use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MethodDescriptorProto, OneofDescriptorProto,
    ServiceDescriptorProto,
    field_descriptor_proto::{Label, Type},
};

pub const COMMON_FILE: &str = "rpc/common.proto";
pub const SAMPLE_FILE: &str = "rpc/sample.proto";

/// The schema served by [`crate::SampleSvcServer`], dependencies first.
pub fn file_descriptor_set() -> FileDescriptorSet {
    FileDescriptorSet {
        file: vec![common_file(), sample_file()],
    }
}

fn common_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(COMMON_FILE.to_string()),
        package: Some("rpc.common".to_string()),
        message_type: vec![message(
            "Meta",
            vec![
                scalar("handler", 1, Type::String),
                scalar("sequence", 2, Type::Uint64),
            ],
        )],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn sample_file() -> FileDescriptorProto {
    let mut sample_message = message(
        "SampleMessage",
        vec![
            optional(scalar("string_value", 1, Type::String), 0),
            optional(scalar("integer_value", 2, Type::Int64), 1),
            optional(scalar("boolean_value", 3, Type::Bool), 2),
            repeated(scalar("tags", 4, Type::String)),
            typed("kind", 5, Type::Enum, ".rpc.SampleKind"),
        ],
    );
    sample_message.oneof_decl = ["_string_value", "_integer_value", "_boolean_value"]
        .into_iter()
        .map(|name| OneofDescriptorProto {
            name: Some(name.to_string()),
            ..Default::default()
        })
        .collect();

    FileDescriptorProto {
        name: Some(SAMPLE_FILE.to_string()),
        package: Some("rpc".to_string()),
        dependency: vec![COMMON_FILE.to_string()],
        message_type: vec![
            sample_message,
            message("SampleRequest", vec![scalar("name", 1, Type::String)]),
            message(
                "SampleResponse",
                vec![
                    scalar("message", 1, Type::String),
                    typed("meta", 2, Type::Message, ".rpc.common.Meta"),
                ],
            ),
        ],
        enum_type: vec![EnumDescriptorProto {
            name: Some("SampleKind".to_string()),
            value: vec![
                enum_value("SAMPLE_KIND_UNSPECIFIED", 0),
                enum_value("SAMPLE_KIND_PRIMARY", 1),
            ],
            ..Default::default()
        }],
        service: vec![ServiceDescriptorProto {
            name: Some("SampleSvc".to_string()),
            method: vec![
                method("RPC_1", false),
                method("RPC_Stream", true),
            ],
            ..Default::default()
        }],
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

fn message(name: &str, field: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field,
        ..Default::default()
    }
}

fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        json_name: Some(json_name(name)),
        ..Default::default()
    }
}

fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

fn optional(field: FieldDescriptorProto, oneof_index: i32) -> FieldDescriptorProto {
    FieldDescriptorProto {
        oneof_index: Some(oneof_index),
        proto3_optional: Some(true),
        ..field
    }
}

fn repeated(field: FieldDescriptorProto) -> FieldDescriptorProto {
    FieldDescriptorProto {
        label: Some(Label::Repeated as i32),
        ..field
    }
}

fn enum_value(name: &str, number: i32) -> EnumValueDescriptorProto {
    EnumValueDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        ..Default::default()
    }
}

fn method(name: &str, server_streaming: bool) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(".rpc.SampleRequest".to_string()),
        output_type: Some(".rpc.SampleResponse".to_string()),
        server_streaming: Some(server_streaming),
        ..Default::default()
    }
}

/// `string_value` -> `stringValue`, the way `protoc` fills `json_name`.
fn json_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
