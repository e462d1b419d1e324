//! Error types for the image auditor.
//!
//! Every fatal condition maps to a distinct process exit code via
//! [`AuditError::exit_code`]. Individual images that fail their check are not
//! errors; they are recorded in the [`AuditResult`](crate::audit::AuditResult).
//!
//! # Error Categories
//!
//! - **Configuration**: [`ConfigNotFound`], [`ConfigRead`], [`ConfigParse`], [`ConfigInvalid`]
//! - **Image store**: [`StoreRead`], [`RepositoryRead`], [`RepositoryParse`], [`RepositoryNotFound`]
//! - **Checker**: [`Check`]
//!
//! [`ConfigNotFound`]: AuditError::ConfigNotFound
//! [`ConfigRead`]: AuditError::ConfigRead
//! [`ConfigParse`]: AuditError::ConfigParse
//! [`ConfigInvalid`]: AuditError::ConfigInvalid
//! [`StoreRead`]: AuditError::StoreRead
//! [`RepositoryRead`]: AuditError::RepositoryRead
//! [`RepositoryParse`]: AuditError::RepositoryParse
//! [`RepositoryNotFound`]: AuditError::RepositoryNotFound
//! [`Check`]: AuditError::Check

use std::path::PathBuf;

/// Result type alias for operations that may return an AuditError.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Fatal errors that abort an audit run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The daemon configuration file does not exist.
    #[error("{} not found", .0.display())]
    ConfigNotFound(PathBuf),

    /// The daemon configuration file exists but could not be read.
    #[error("could not read {}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The daemon configuration file is not valid JSON of the expected shape.
    #[error("could not deserialize {}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The configuration decoded but is unusable.
    #[error("invalid daemon configuration: {0}")]
    ConfigInvalid(String),

    /// The image store root could not be enumerated.
    #[error("could not list image store {}", path.display())]
    StoreRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A repositories.json file was found but could not be read.
    #[error("could not read {}", path.display())]
    RepositoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A repositories.json file was found but could not be decoded.
    #[error("could not deserialize {}", path.display())]
    RepositoryParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No subdirectory of the store root holds a repositories.json file.
    #[error("could not find repositories.json file under {}", .0.display())]
    RepositoryNotFound(PathBuf),

    /// The check command could not be started at all.
    #[error("could not run check for {reference}")]
    Check {
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

impl AuditError {
    /// The process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AuditError::ConfigNotFound(_) => 1,
            AuditError::ConfigRead { .. } | AuditError::ConfigParse { .. } => 2,
            AuditError::ConfigInvalid(_) => 3,
            AuditError::RepositoryRead { .. } | AuditError::RepositoryParse { .. } => 4,
            AuditError::StoreRead { .. } | AuditError::RepositoryNotFound(_) => 5,
            AuditError::Check { .. } => 6,
        }
    }
}
