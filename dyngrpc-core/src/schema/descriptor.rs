use prost_reflect::{EnumDescriptor, MessageDescriptor, MethodDescriptor, ServiceDescriptor};

/// A generic wrapper for the different kinds of resolved schema symbols.
///
/// Symbol lookups return this enum, whether the symbol names a Service, a Method,
/// a Message or an Enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    MessageDescriptor(MessageDescriptor),
    ServiceDescriptor(ServiceDescriptor),
    MethodDescriptor(MethodDescriptor),
    EnumDescriptor(EnumDescriptor),
}

impl Descriptor {
    /// Returns the name (e.g.,`MyMessage`) of the inner descriptor
    pub fn name(&self) -> &str {
        match self {
            Descriptor::MessageDescriptor(v) => v.name(),
            Descriptor::ServiceDescriptor(v) => v.name(),
            Descriptor::MethodDescriptor(v) => v.name(),
            Descriptor::EnumDescriptor(v) => v.name(),
        }
    }

    /// Returns the full_name (e.g.,`my.package.v1.MyMessage`) of the inner descriptor
    pub fn full_name(&self) -> &str {
        match self {
            Descriptor::MessageDescriptor(v) => v.full_name(),
            Descriptor::ServiceDescriptor(v) => v.full_name(),
            Descriptor::MethodDescriptor(v) => v.full_name(),
            Descriptor::EnumDescriptor(v) => v.full_name(),
        }
    }

    /// Returns the package name (e.g.,`my.package.v1`) of the inner descriptor
    pub fn package_name(&self) -> &str {
        match self {
            Descriptor::MessageDescriptor(v) => v.package_name(),
            Descriptor::ServiceDescriptor(v) => v.package_name(),
            // `package.Service.Method`
            Descriptor::MethodDescriptor(v) => v.full_name().rsplitn(3, '.').nth(2).unwrap_or(""),
            Descriptor::EnumDescriptor(v) => v.package_name(),
        }
    }

    pub fn message_descriptor(&self) -> Option<&MessageDescriptor> {
        match self {
            Descriptor::MessageDescriptor(d) => Some(d),
            _ => None,
        }
    }

    pub fn service_descriptor(&self) -> Option<&ServiceDescriptor> {
        match self {
            Descriptor::ServiceDescriptor(d) => Some(d),
            _ => None,
        }
    }

    pub fn method_descriptor(&self) -> Option<&MethodDescriptor> {
        match self {
            Descriptor::MethodDescriptor(d) => Some(d),
            _ => None,
        }
    }

    pub fn enum_descriptor(&self) -> Option<&EnumDescriptor> {
        match self {
            Descriptor::EnumDescriptor(d) => Some(d),
            _ => None,
        }
    }
}
