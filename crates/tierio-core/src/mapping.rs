//! Read-path prefix mapping.
//!
//! Reads of a canonical location are redirected to the cache tier when the
//! location starts with one of the configured canonical prefixes:
//!
//! ```text
//! cache.baseuri     = alluxio://localhost:19998/
//! canonical.baseuri = gs://my-bucket/
//!
//! gs://my-bucket/warehouse/t/f.parquet -> alluxio://localhost:19998/warehouse/t/f.parquet
//! ```
//!
//! Only the leading prefix is rewritten. A prefix string that recurs later in
//! the path is left alone.

use crate::config::MappingConfig;

/// Outcome of applying the mapping policy to one requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedLocation {
    effective_path: String,
    original_path: String,
    rewrite: Option<Rewrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rewrite {
    canonical_prefix: String,
    cache_base_uri: String,
}

impl MappedLocation {
    pub(crate) fn unchanged(path: &str) -> Self {
        Self {
            effective_path: path.to_string(),
            original_path: path.to_string(),
            rewrite: None,
        }
    }

    /// The location to actually open.
    pub fn effective_path(&self) -> &str {
        &self.effective_path
    }

    /// The location callers must observe.
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn is_remapped(&self) -> bool {
        self.effective_path != self.original_path
    }

    pub fn into_original_path(self) -> String {
        self.original_path
    }

    /// Maps a location under the effective path back to its canonical form.
    ///
    /// Used for listing results, which the delegate reports in cache-tier terms.
    pub fn restore_location(&self, location: &str) -> String {
        let Some(rewrite) = &self.rewrite else {
            return location.to_string();
        };
        match location.strip_prefix(rewrite.cache_base_uri.as_str()) {
            Some(rest) => format!("{}{}", rewrite.canonical_prefix, rest),
            None => location.to_string(),
        }
    }
}

impl MappingConfig {
    /// Decides where a read of `path` should be served from.
    ///
    /// First matching canonical prefix wins. Paths already under the cache
    /// base are never rewritten twice.
    pub fn resolve_read_location(&self, path: &str) -> MappedLocation {
        if !self.read_through_cache() {
            return MappedLocation::unchanged(path);
        }

        let cache_base_uri = self.cache_base_uri();
        if cache_base_uri.is_empty() || path.starts_with(cache_base_uri) {
            return MappedLocation::unchanged(path);
        }

        for prefix in self.canonical_base_prefixes() {
            if let Some(rest) = path.strip_prefix(prefix.as_str()) {
                return MappedLocation {
                    effective_path: format!("{cache_base_uri}{rest}"),
                    original_path: path.to_string(),
                    rewrite: Some(Rewrite {
                        canonical_prefix: prefix.clone(),
                        cache_base_uri: cache_base_uri.to_string(),
                    }),
                };
            }
        }

        tracing::warn!(
            path,
            "no canonical prefix matched, reading from the canonical location"
        );
        MappedLocation::unchanged(path)
    }
}
