//! # Local Schema Sources
//!
//! A schema can be supplied locally instead of being discovered through reflection, either as
//! a binary `FileDescriptorSet` (`protoc --include_imports --descriptor_set_out=...`) or as
//! `.proto` sources compiled on the fly with `protoc`.
//!
//! Compiling sources requires the `protoc` feature (enabled by default) and a `protoc` binary,
//! found through the `PROTOC` environment variable or the `PATH`.
use crate::registry::{DescriptorRegistry, RegistryError};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SchemaSourceError {
    #[error("Failed to read descriptor set '{path}': '{source}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid descriptor set: '{0}'")]
    Registry(#[from] RegistryError),
    #[error("Failed to compile proto files: '{0}'")]
    Compile(#[source] std::io::Error),
    #[error("Compiling proto files requires the 'protoc' feature")]
    ProtocUnavailable,
}

/// Where a local schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// A binary encoded `FileDescriptorSet`.
    DescriptorSet(PathBuf),
    /// `.proto` files, resolved against the given import paths.
    Protos {
        files: Vec<PathBuf>,
        includes: Vec<PathBuf>,
    },
}

impl SchemaSource {
    /// Loads every fragment of the source into a fresh registry.
    pub fn load(&self) -> Result<DescriptorRegistry, SchemaSourceError> {
        match self {
            SchemaSource::DescriptorSet(path) => {
                let bytes = std::fs::read(path).map_err(|source| SchemaSourceError::Read {
                    path: path.clone(),
                    source,
                })?;
                let registry = DescriptorRegistry::decode(&bytes)?;
                tracing::debug!(path = %path.display(), files = registry.len(), "loaded descriptor set");
                Ok(registry)
            }
            SchemaSource::Protos { files, includes } => compile(files, includes),
        }
    }
}

#[cfg(feature = "protoc")]
fn compile(
    files: &[PathBuf],
    includes: &[PathBuf],
) -> Result<DescriptorRegistry, SchemaSourceError> {
    let set = prost_build::Config::new()
        .load_fds(files, includes)
        .map_err(SchemaSourceError::Compile)?;

    let registry = DescriptorRegistry::from_file_descriptor_set(set);
    tracing::debug!(files = registry.len(), "compiled proto sources");
    Ok(registry)
}

#[cfg(not(feature = "protoc"))]
fn compile(
    _files: &[PathBuf],
    _includes: &[PathBuf],
) -> Result<DescriptorRegistry, SchemaSourceError> {
    Err(SchemaSourceError::ProtocUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_a_binary_descriptor_set_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample_service::encoded_file_descriptor_set())
            .unwrap();

        let registry = SchemaSource::DescriptorSet(file.path().to_path_buf())
            .load()
            .unwrap();

        assert_eq!(
            registry.file_names().collect::<Vec<_>>(),
            vec![sample_service::COMMON_FILE, sample_service::SAMPLE_FILE]
        );
        assert!(registry.universe().is_ok());
    }

    #[test]
    fn missing_files_are_reported_with_their_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.bin");

        let err = SchemaSource::DescriptorSet(path.clone()).load().unwrap_err();

        assert!(matches!(err, SchemaSourceError::Read { path: p, .. } if p == path));
    }

    #[test]
    fn garbage_is_not_a_descriptor_set() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xff\xff\xff").unwrap();

        let err = SchemaSource::DescriptorSet(file.path().to_path_buf())
            .load()
            .unwrap_err();

        assert!(matches!(err, SchemaSourceError::Registry(RegistryError::Decode(_))));
    }

    #[cfg(feature = "protoc")]
    #[test]
    fn compiles_proto_sources_with_their_imports() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("rpc")).unwrap();
        std::fs::write(
            dir.path().join("rpc/common.proto"),
            "syntax = \"proto3\";\npackage rpc.common;\nmessage Meta { string handler = 1; }\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("rpc/sample.proto"),
            "syntax = \"proto3\";\npackage rpc;\nimport \"rpc/common.proto\";\n\
             message SampleRequest { string name = 1; }\n\
             message SampleResponse { string message = 1; rpc.common.Meta meta = 2; }\n\
             service SampleSvc { rpc RPC_1(SampleRequest) returns (SampleResponse); }\n",
        )
        .unwrap();

        let source = SchemaSource::Protos {
            files: vec![dir.path().join("rpc/sample.proto")],
            includes: vec![dir.path().to_path_buf()],
        };

        let registry = match source.load() {
            Err(SchemaSourceError::Compile(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                eprintln!("protoc is not installed, skipping: {err}");
                return;
            }
            result => result.unwrap(),
        };

        assert!(registry.contains("rpc/sample.proto"));
        assert!(registry.contains("rpc/common.proto"));
        let universe = registry.universe().unwrap();
        assert!(universe.get_service_by_name("rpc.SampleSvc").is_some());
    }

    #[cfg(not(feature = "protoc"))]
    #[test]
    fn proto_sources_require_the_protoc_feature() {
        let source = SchemaSource::Protos {
            files: vec!["rpc/sample.proto".into()],
            includes: vec![],
        };

        assert!(matches!(
            source.load(),
            Err(SchemaSourceError::ProtocUnavailable)
        ));
    }
}
