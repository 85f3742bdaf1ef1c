use colored::*;
use dyngrpc_core::{
    InvokeError,
    client::{ClientConnectError, Descriptor, DynamicCallError, GetDescriptorError},
    grpc::client::GrpcRequestError,
    prost_reflect::{EnumDescriptor, Kind, MessageDescriptor, MethodDescriptor, ServiceDescriptor},
    reflection::client::ReflectionResolveError,
    schema::source::SchemaSourceError,
    tonic::Status,
};
use std::fmt::Display;

/// A wrapper struct for a formatted, colored string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

pub struct ServiceList(pub Vec<String>);

pub struct GenericError<T: Display>(pub &'static str, pub T);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f)?;
        writeln!(f, "{}", self.0)?;
        Ok(())
    }
}

impl From<serde_json::Value> for FormattedString {
    fn from(value: serde_json::Value) -> Self {
        FormattedString(serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()))
    }
}

impl From<&Status> for FormattedString {
    fn from(status: &Status) -> Self {
        FormattedString(format!(
            "{} code={:?} message={:?}",
            "gRPC Failed:".red().bold(),
            status.code(),
            status.message()
        ))
    }
}

impl From<InvokeError> for FormattedString {
    fn from(err: InvokeError) -> Self {
        match err {
            InvokeError::Call(DynamicCallError::GrpcRequestError(GrpcRequestError::Status(
                status,
            ))) => FormattedString::from(&status),
            InvokeError::Connect(err) => FormattedString::from(err),
            InvokeError::Schema(err) => FormattedString::from(err),
            InvokeError::Reflection(err) => FormattedString::from(err),
            err => FormattedString(format!("{}\n\n'{}'", "Call Failed:".red().bold(), err)),
        }
    }
}

impl From<ClientConnectError> for FormattedString {
    fn from(err: ClientConnectError) -> Self {
        FormattedString(format!("{}\n\n'{}'", "Connection Error:".red().bold(), err))
    }
}

impl From<ReflectionResolveError> for FormattedString {
    fn from(err: ReflectionResolveError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Server Reflection Failed:".red().bold(),
            err
        ))
    }
}

impl From<SchemaSourceError> for FormattedString {
    fn from(err: SchemaSourceError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Failed to load local schema:".red().bold(),
            err
        ))
    }
}

impl From<GetDescriptorError> for FormattedString {
    fn from(err: GetDescriptorError) -> Self {
        FormattedString(format!(
            "{}\n\n'{}'",
            "Symbol Lookup Failed:".red().bold(),
            err
        ))
    }
}

impl<T: Display> From<GenericError<T>> for FormattedString {
    fn from(GenericError(msg, err): GenericError<T>) -> Self {
        FormattedString(format!("{}:\n\n'{}'", msg.red().bold(), err))
    }
}

impl From<ServiceList> for FormattedString {
    fn from(ServiceList(services): ServiceList) -> Self {
        if services.is_empty() {
            return FormattedString("No services found.".yellow().to_string());
        }

        let mut out = String::new();
        out.push_str("Available Services:\n");
        for svc in services {
            out.push_str(&format!("  - {}\n", svc.green()));
        }
        FormattedString(out.trim_end().to_string())
    }
}

impl From<Descriptor> for FormattedString {
    fn from(descriptor: Descriptor) -> Self {
        match descriptor {
            Descriptor::ServiceDescriptor(d) => FormattedString::from(d),
            Descriptor::MethodDescriptor(d) => FormattedString::from(d),
            Descriptor::MessageDescriptor(d) => FormattedString::from(d),
            Descriptor::EnumDescriptor(d) => FormattedString::from(d),
        }
    }
}

impl From<ServiceDescriptor> for FormattedString {
    fn from(service: ServiceDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "service".cyan(),
            service.name().green()
        ));

        for method in service.methods() {
            out.push_str("  ");
            out.push_str(&FormattedString::from(method).0);
            out.push_str("\n\n");
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<MethodDescriptor> for FormattedString {
    fn from(method: MethodDescriptor) -> Self {
        let stream = |streaming: bool| {
            if streaming {
                format!("{} ", "stream".cyan())
            } else {
                String::new()
            }
        };

        FormattedString(format!(
            "{} {}({}{}) {} ({}{});",
            "rpc".cyan(),
            method.name().green(),
            stream(method.is_client_streaming()),
            method.input().full_name().yellow(),
            "returns".cyan(),
            stream(method.is_server_streaming()),
            method.output().full_name().yellow()
        ))
    }
}

impl From<MessageDescriptor> for FormattedString {
    fn from(message: MessageDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "message".cyan(),
            message.name().green()
        ));

        for field in message.fields() {
            let label = if field.is_list() {
                format!("{} ", "repeated".cyan())
            } else if field.containing_oneof().is_some_and(|o| o.is_synthetic()) {
                format!("{} ", "optional".cyan())
            } else {
                String::new()
            };

            if field.is_map() {
                let (key, value) = match field.kind() {
                    Kind::Message(entry) => (
                        kind_name(&entry.map_entry_key_field().kind()),
                        kind_name(&entry.map_entry_value_field().kind()),
                    ),
                    other => (kind_name(&other), String::new()),
                };
                out.push_str(&format!(
                    "  {}<{}, {}> {} = {};\n",
                    "map".cyan(),
                    key.yellow(),
                    value.yellow(),
                    field.name(),
                    field.number()
                ));
            } else {
                out.push_str(&format!(
                    "  {}{} {} = {};\n",
                    label,
                    kind_name(&field.kind()).yellow(),
                    field.name(),
                    field.number()
                ));
            }
        }
        out.push('}');
        FormattedString(out)
    }
}

impl From<EnumDescriptor> for FormattedString {
    fn from(enum_desc: EnumDescriptor) -> Self {
        let mut out = String::new();
        out.push_str(&format!(
            "{} {} {{\n",
            "enum".cyan(),
            enum_desc.name().green()
        ));

        for val in enum_desc.values() {
            out.push_str(&format!(
                "  {} = {};\n",
                val.name(),
                val.number().to_string().purple()
            ));
        }
        out.push('}');

        FormattedString(out)
    }
}

fn kind_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(m) => m.full_name().to_string(),
        Kind::Enum(e) => e.full_name().to_string(),
    }
}
