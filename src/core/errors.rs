//! ATL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, AtlError>;

/// Top-level error type for the timeline crate.
///
/// The rendering core never produces these; they come from the edges
/// (configuration, dataset loading, terminal I/O).
#[derive(Debug, Error)]
pub enum AtlError {
    #[error("[ATL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ATL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ATL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ATL-2001] dataset parse failure in {source_name}: {details}")]
    DatasetParse {
        source_name: String,
        details: String,
    },

    #[error("[ATL-2002] invalid event {id:?}: {reason}")]
    InvalidEvent { id: String, reason: String },

    #[error("[ATL-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ATL-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[ATL-3002] terminal failure: {source}")]
    Terminal {
        #[source]
        source: std::io::Error,
    },
}

impl AtlError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ATL-1001",
            Self::MissingConfig { .. } => "ATL-1002",
            Self::ConfigParse { .. } => "ATL-1003",
            Self::DatasetParse { .. } => "ATL-2001",
            Self::InvalidEvent { .. } => "ATL-2002",
            Self::Serialization { .. } => "ATL-2101",
            Self::Io { .. } => "ATL-3001",
            Self::Terminal { .. } => "ATL-3002",
        }
    }

    /// Whether the failure came from user-supplied input (config or dataset)
    /// rather than the environment.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
                | Self::DatasetParse { .. }
                | Self::InvalidEvent { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for AtlError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for AtlError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
