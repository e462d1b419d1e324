//! Discovery and parsing of the image repository metadata file.
//!
//! The daemon keeps a single `repositories.json` per store generation, mapping
//! each image reference to its tags and their content hashes:
//!
//! ```text
//! <store root>/
//! +-- <generation>/
//!     +-- image/
//!         +-- <storage driver>/
//!             +-- repositories.json
//! ```
//!
//! ```json
//! {"Repositories": {"app/web": {"app/web:latest": "sha256:..."}}}
//! ```
//!
//! Which generation directory is current is not recorded anywhere, so every
//! immediate subdirectory of the store root is probed and the first one that
//! holds a metadata file wins.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use serde::Deserialize;

use crate::{
    config::{from_json_object, nullable},
    error::{AuditError, Result},
};

/// File name of the repository metadata file.
pub const REPOSITORIES_FILE: &str = "repositories.json";

/// Tag (or digest alias) to content hash.
pub type TagMap = BTreeMap<String, String>;

/// Parsed contents of a repositories.json file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RepositoryIndex {
    /// Image reference to its tags.
    #[serde(rename = "Repositories", default, deserialize_with = "nullable")]
    pub repositories: BTreeMap<String, TagMap>,
}

impl RepositoryIndex {
    /// Parse repository metadata from JSON content.
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        from_json_object(content)
    }

    /// Read and parse the metadata file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            AuditError::RepositoryRead {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Self::from_json(&content).map_err(|source| AuditError::RepositoryParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Total number of (reference, tag) entries.
    pub fn entry_count(&self) -> usize {
        self.repositories.values().map(BTreeMap::len).sum()
    }
}

/// Path of the metadata file inside one store generation directory.
pub fn candidate_path(generation_dir: &Path, storage_driver: &str) -> PathBuf {
    generation_dir
        .join("image")
        .join(storage_driver)
        .join(REPOSITORIES_FILE)
}

/// Locate and parse the repository metadata under `store_root`.
///
/// Returns `Ok(None)` when the store root does not exist (or is not a
/// directory): a store that was never populated has no images to check.
/// Otherwise returns the path of the metadata file that was used along with
/// its parsed contents.
///
/// # Errors
///
/// - [`AuditError::StoreRead`] if the store root cannot be listed
/// - [`AuditError::RepositoryParse`] if the first metadata file found is invalid
/// - [`AuditError::RepositoryNotFound`] if no subdirectory holds a metadata file
pub fn locate(
    store_root: &Path,
    storage_driver: &str,
) -> Result<Option<(PathBuf, RepositoryIndex)>> {
    if !store_root.is_dir() {
        warn!("image store {store_root:?} does not exist");
        return Ok(None);
    }

    let store_err = |source| AuditError::StoreRead {
        path: store_root.to_path_buf(),
        source,
    };

    let mut generations = Vec::new();
    for entry in std::fs::read_dir(store_root).map_err(store_err)? {
        let path = entry.map_err(store_err)?.path();
        if path.is_dir() {
            generations.push(path);
        }
    }

    locate_in(store_root, generations, storage_driver).map(Some)
}

/// Probe `generations` in order and parse the first metadata file found.
///
/// Later generation directories are not looked at once a file is found, even
/// if the file turns out to be invalid.
pub fn locate_in(
    store_root: &Path,
    generations: impl IntoIterator<Item = impl AsRef<Path>>,
    storage_driver: &str,
) -> Result<(PathBuf, RepositoryIndex)> {
    for generation in generations {
        let candidate = candidate_path(generation.as_ref(), storage_driver);
        debug!("probing {candidate:?}");
        match std::fs::metadata(&candidate) {
            Ok(meta) if meta.is_file() => {
                let index = RepositoryIndex::load(&candidate)?;
                return Ok((candidate, index));
            }
            Ok(_) => continue,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => debug!("skipping {candidate:?}: {e}"),
        }
    }

    Err(AuditError::RepositoryNotFound(store_root.to_path_buf()))
}
