//! Parsed object locations.
//!
//! # Examples
//!
//! ```text
//! gs://my-bucket/warehouse/t/f.parquet       root gs://my-bucket
//! alluxio://localhost:19998/warehouse/t      root alluxio://localhost:19998
//! file:///tmp/warehouse/t                    root file://
//! memory://test/a/b                          root memory://test
//! ```

use object_store::path::Path;
use url::Url;

use crate::error::{FileIoError, FileIoResult};

/// A location split into the store it lives in and the key inside that store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    /// The scheme (gs, s3, file, memory, alluxio, ...)
    pub scheme: String,
    /// Bucket or `host:port` (empty for file://)
    pub authority: String,
    /// Object key within the store
    pub key: Path,
}

impl StoreLocation {
    /// Parse a location like `gs://bucket/key` or `file:///path`.
    pub fn parse(location: &str) -> FileIoResult<Self> {
        let url = Url::parse(location).map_err(|e| FileIoError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = url.scheme().to_string();
        let authority = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };
        let key = Path::from_url_path(url.path()).map_err(|e| FileIoError::InvalidLocation {
            location: location.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            scheme,
            authority,
            key,
        })
    }

    /// `scheme://authority`, the key for one store client.
    pub fn root(&self) -> String {
        format!("{}://{}", self.scheme, self.authority)
    }

    /// Full URI of `key` in the same store.
    pub fn uri_for(&self, key: &Path) -> String {
        format!("{}/{}", self.root(), key)
    }

    /// Key to hand to `list`, `None` for the store root.
    pub fn list_prefix(&self) -> Option<&Path> {
        if self.key.as_ref().is_empty() {
            None
        } else {
            Some(&self.key)
        }
    }
}

/// Normalizes a user-supplied store root (`gs://bucket/` → `gs://bucket`).
pub(crate) fn normalize_root(root: &str) -> String {
    root.trim_end_matches('/').to_string()
}
