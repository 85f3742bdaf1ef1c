//! # Descriptor Registry
//!
//! The registry accumulates `FileDescriptorProto` fragments as they arrive, possibly out of
//! order and with duplicates (reflection servers happily send the same file several times),
//! and lazily turns them into a queryable [`DescriptorPool`].
//!
//! Fragments are keyed by file name. The first insertion of a name wins, later insertions of
//! the same name are ignored. The schema of the reflection service itself is never stored: it
//! describes the discovery protocol, not the user's services.
use prost::Message;
use prost_reflect::{DescriptorError, DescriptorPool};
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use std::collections::{HashMap, HashSet};

/// File names under which reflection servers publish their own schema.
const REFLECTION_FILE_NAMES: &[&str] = &[
    "grpc/reflection/v1/reflection.proto",
    "grpc/reflection/v1alpha/reflection.proto",
    "src/proto/grpc/reflection/v1alpha/reflection.proto",
    "reflection_v1.proto",
    "reflection_v1alpha.proto",
];

/// Packages of the reflection protocol, matched when a server uses a non-standard file name.
pub(crate) const REFLECTION_PACKAGES: &[&str] = &["grpc.reflection.v1", "grpc.reflection.v1alpha"];

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to decode file descriptor set: '{0}'")]
    Decode(#[from] prost::DecodeError),
    #[error("File '{file}' depends on '{dependency}', which is not part of the schema")]
    MissingDependency { file: String, dependency: String },
    #[error("Failed to build descriptor pool: '{0}'")]
    Descriptor(#[from] DescriptorError),
}

/// An insertion-ordered, deduplicating collection of file descriptors.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRegistry {
    files: Vec<FileDescriptorProto>,
    index: HashMap<String, usize>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from an already assembled `FileDescriptorSet`.
    pub fn from_file_descriptor_set(set: FileDescriptorSet) -> Self {
        let mut registry = Self::new();
        registry.extend(set.file);
        registry
    }

    /// Decodes a binary `FileDescriptorSet` (as produced by `protoc --descriptor_set_out`).
    pub fn decode(bytes: &[u8]) -> Result<Self, RegistryError> {
        let set = FileDescriptorSet::decode(bytes)?;
        Ok(Self::from_file_descriptor_set(set))
    }

    /// Inserts a fragment unless a fragment with the same file name is already held.
    ///
    /// Returns `true` if the fragment was stored. Nameless fragments and the reflection
    /// protocol's own schema are never stored.
    pub fn insert(&mut self, fragment: FileDescriptorProto) -> bool {
        let Some(name) = fragment.name.clone() else {
            tracing::debug!("ignoring file descriptor without a name");
            return false;
        };

        if is_reflection_plumbing(&fragment) || self.index.contains_key(&name) {
            return false;
        }

        self.index.insert(name, self.files.len());
        self.files.push(fragment);
        true
    }

    pub fn extend(&mut self, fragments: impl IntoIterator<Item = FileDescriptorProto>) {
        for fragment in fragments {
            self.insert(fragment);
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.index.contains_key(file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&FileDescriptorProto> {
        self.index.get(file_name).map(|&i| &self.files[i])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File names in insertion order.
    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().filter_map(|f| f.name.as_deref())
    }

    /// Dependencies referenced by held fragments that are not themselves held.
    ///
    /// Each missing name is reported once, in the order it is first referenced.
    pub fn missing_dependencies(&self) -> Vec<String> {
        let mut seen = HashSet::new();

        self.files
            .iter()
            .flat_map(|f| f.dependency.iter())
            .filter(|dep| !self.contains(dep))
            .filter(|dep| seen.insert(dep.as_str()))
            .cloned()
            .collect()
    }

    /// Returns every held fragment, in insertion order.
    pub fn snapshot(&self) -> FileDescriptorSet {
        FileDescriptorSet {
            file: self.files.clone(),
        }
    }

    /// Builds the type universe from the current snapshot.
    ///
    /// Fails if any held fragment depends on a file that is not held, or if the fragments
    /// do not form a consistent schema (duplicate symbols, unresolvable type references).
    pub fn universe(&self) -> Result<DescriptorPool, RegistryError> {
        for file in &self.files {
            if let Some(dependency) = file.dependency.iter().find(|dep| !self.contains(dep)) {
                return Err(RegistryError::MissingDependency {
                    file: file.name().to_string(),
                    dependency: dependency.clone(),
                });
            }
        }

        Ok(DescriptorPool::from_file_descriptor_set(self.snapshot())?)
    }
}

/// Whether a fragment is the reflection protocol's own schema.
pub fn is_reflection_plumbing(fragment: &FileDescriptorProto) -> bool {
    is_reflection_file_name(fragment.name()) || REFLECTION_PACKAGES.contains(&fragment.package())
}

fn is_reflection_file_name(name: &str) -> bool {
    REFLECTION_FILE_NAMES.contains(&name)
}
