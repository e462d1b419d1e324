//! Audit a container image store for images that can no longer be exported.
//!
//! The daemon configuration names the image store root and storage driver.
//! From there the repository metadata file is located, every image reference
//! in it is exported with the container CLI, and the references whose export
//! fails are reported as corrupt.

pub mod audit;
pub mod config;
pub mod error;
pub mod process;
pub mod repository;

pub use audit::{audit, AuditResult, CorruptImage, ImageCheck};
pub use config::DaemonConfig;
pub use error::{AuditError, Result};
pub use repository::RepositoryIndex;
