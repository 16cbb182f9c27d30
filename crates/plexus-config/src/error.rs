//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

use plexus_core::GraphError;

/// Errors that can occur while loading, saving or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A connection or exempt entry names a module the patch does not declare.
    #[error("unknown module: {0}")]
    UnknownModule(String),

    /// A connection names a plug its module does not declare.
    #[error("module '{module}' has no plug '{plug}'")]
    UnknownPlug {
        /// Module name.
        module: String,
        /// Plug name.
        plug: String,
    },

    /// Two modules share a name.
    #[error("duplicate module: {0}")]
    DuplicateModule(String),

    /// The patch could not be wired.
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    // --- factory methods ---

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path"))
        );
    }

    #[test]
    fn write_file_factory_produces_correct_variant() {
        let err = ConfigError::write_file("/out/path", mock_io_err());
        assert!(
            matches!(err, ConfigError::WriteFile { ref path, .. } if path == std::path::Path::new("/out/path"))
        );
    }

    // --- Display formatting ---

    #[test]
    fn read_file_display() {
        let err = ConfigError::read_file("/a/patch.toml", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to read file"), "got: {msg}");
        assert!(msg.contains("/a/patch.toml"), "got: {msg}");
    }

    #[test]
    fn create_dir_display() {
        let err = ConfigError::create_dir("/a/b", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to create directory"), "got: {msg}");
    }

    #[test]
    fn unknown_plug_display() {
        let err = ConfigError::UnknownPlug {
            module: "osc".to_string(),
            plug: "sync".to_string(),
        };
        assert_eq!(err.to_string(), "module 'osc' has no plug 'sync'");
    }

    #[test]
    fn duplicate_module_display() {
        let err = ConfigError::DuplicateModule("gain".to_string());
        assert_eq!(err.to_string(), "duplicate module: gain");
    }

    #[test]
    fn graph_error_converts() {
        let err: ConfigError = GraphError::TypeMismatch {
            output: plexus_core::DataType::scalar(),
            input: plexus_core::DataType::new("vec3"),
        }
        .into();
        assert!(matches!(err, ConfigError::Graph(_)));
        assert!(err.to_string().starts_with("graph error:"));
    }

    // --- Error::source() chain ---

    #[test]
    fn io_variants_expose_source() {
        assert!(ConfigError::read_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::write_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::create_dir("/x", mock_io_err()).source().is_some());
    }

    #[test]
    fn name_variants_have_no_source() {
        assert!(ConfigError::UnknownModule("m".to_string()).source().is_none());
        assert!(ConfigError::DuplicateModule("m".to_string()).source().is_none());
    }
}
