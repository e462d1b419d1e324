//! Parsing of the container daemon configuration.
//!
//! The daemon reads its settings from a JSON file, normally
//! `/etc/docker/daemon.json`:
//!
//! ```json
//! {
//!     "graph": "/var/lib/docker",
//!     "storage-driver": "overlay2",
//!     "insecure-registries": ["mirror.local:5000/"]
//! }
//! ```
//!
//! Only a handful of keys are recognized. Anything else in the file is
//! ignored, and recognized keys that are missing or `null` take their default
//! value. The only hard requirement is a non-empty `graph` (the image store
//! root), checked by [`DaemonConfig::validate`].

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{
    de::{DeserializeOwned, Error as _, Unexpected},
    Deserialize, Deserializer,
};
use serde_json::Value;

use crate::error::{AuditError, Result};

/// Well-known location of the daemon configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/docker/daemon.json";

/// Daemon configuration, as parsed from daemon.json.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DaemonConfig {
    /// Root of the image store.
    #[serde(rename = "graph", default, deserialize_with = "nullable")]
    pub store_root: PathBuf,

    /// Inter-container communication.
    #[serde(rename = "icc", default, deserialize_with = "nullable")]
    pub inter_container_communication: bool,

    #[serde(rename = "userland-proxy", default, deserialize_with = "nullable")]
    pub userland_proxy: String,

    #[serde(
        rename = "max-concurrent-downloads",
        default,
        deserialize_with = "nullable"
    )]
    pub max_concurrent_downloads: i64,

    /// Storage driver name; selects the `image/<driver>` metadata subdirectory.
    #[serde(rename = "storage-driver", default, deserialize_with = "nullable")]
    pub storage_driver: String,

    #[serde(rename = "bridge", default, deserialize_with = "nullable")]
    pub bridge_name: String,

    /// Registry prefixes whose images are mirrors of other entries.
    #[serde(rename = "insecure-registries", default, deserialize_with = "nullable")]
    pub insecure_registries: Vec<String>,
}

/// Treats an explicit JSON `null` the same as a missing key.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decodes `content`, which must be a single JSON object.
///
/// Derived struct deserializers also accept a sequence and fill fields by
/// position; metadata files are only ever objects.
pub(crate) fn from_json_object<T: DeserializeOwned>(
    content: &str,
) -> std::result::Result<T, serde_json::Error> {
    let unexpected = match serde_json::from_str(content)? {
        Value::Object(map) => return serde_json::from_value(Value::Object(map)),
        Value::Null => Unexpected::Unit,
        Value::Bool(b) => Unexpected::Bool(b),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(_) => Unexpected::Other("string"),
        Value::Array(_) => Unexpected::Seq,
    };
    Err(serde_json::Error::invalid_type(unexpected, &"a JSON object"))
}

impl DaemonConfig {
    /// Parse daemon configuration from JSON content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON object of the expected shape.
    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        from_json_object(content)
    }

    /// Read and parse the configuration file at `path`.
    ///
    /// A directory at `path` counts as a missing file. This does not validate
    /// the result; see [`DaemonConfig::validate`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound || path.is_dir() {
                AuditError::ConfigNotFound(path.to_path_buf())
            } else {
                AuditError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::from_json(&content).map_err(|source| AuditError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check that the configuration names an image store.
    pub fn validate(&self) -> Result<()> {
        if self.store_root.as_os_str().is_empty() {
            return Err(AuditError::ConfigInvalid(
                "could not find images (graph value empty)".to_string(),
            ));
        }
        Ok(())
    }
}
