//! Mapping configuration.
//!
//! A [`MappingConfig`] can be built from two sources that yield the same state:
//!
//! - a structured [`ConfigSource`] such as [`Conf`], via [`MappingConfig::from_source`].
//!   Missing keys silently default to `""`, nothing is validated.
//! - a flat [`Properties`] map, via [`MappingConfig::from_properties`]. This path
//!   validates that both `cache.baseuri` and `canonical.baseuri` are present.
//!
//! # Keys
//!
//! ```text
//! cache.baseuri       = alluxio://localhost:19998/
//! canonical.baseuri   = gs://bucket1/,gs://bucket2/data/
//! read.through.cache  = true
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FileIoError, FileIoResult};

/// Base URI of the cache tier.
pub const CACHE_BASE_URI: &str = "cache.baseuri";
/// Comma-separated canonical prefixes eligible for remapping.
pub const CANONICAL_BASE_URI: &str = "canonical.baseuri";
/// Master switch for read remapping.
pub const READ_THROUGH_CACHE: &str = "read.through.cache";

/// Flat string-keyed properties, as handed to [`crate::FileIo::initialize`].
pub type Properties = HashMap<String, String>;

/// Key lookups over a configuration source.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<&str>;

    fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Reads a boolean. `true`/`false` match case-insensitively; anything else
    /// keeps `default`.
    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(raw) => parse_bool(key, raw, default),
            None => default,
        }
    }
}

impl ConfigSource for Properties {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

fn parse_bool(key: &str, raw: &str, default: bool) -> bool {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        true
    } else if value.eq_ignore_ascii_case("false") {
        false
    } else {
        tracing::warn!(key, value = raw, default, "not a boolean, using default");
        default
    }
}

/// Structured configuration handed to [`crate::Configurable`] implementations.
///
/// Ordered and serializable so it can be captured and shipped to a remote
/// execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conf {
    entries: BTreeMap<String, String>,
}

impl Conf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.set(key, value.to_string())
    }

    pub fn unset(&mut self, key: &str) -> Option<String> {
        self.entries.remove(key)
    }

    /// Overlays `other` on top of this configuration.
    pub fn merge(&mut self, other: Conf) {
        self.entries.extend(other.entries);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_properties(&self) -> Properties {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl ConfigSource for Conf {
    fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl From<Properties> for Conf {
    fn from(properties: Properties) -> Self {
        Self {
            entries: properties.into_iter().collect(),
        }
    }
}

impl FromIterator<(String, String)> for Conf {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Where reads are redirected and when.
///
/// `canonical_base_prefixes` holds only non-blank entries, in configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConfig {
    cache_base_uri: String,
    canonical_base_prefixes: Vec<String>,
    read_through_cache: bool,
}

impl MappingConfig {
    /// Builds a config directly. Blank prefixes are dropped, nothing is validated.
    pub fn new<I, S>(
        cache_base_uri: impl Into<String>,
        canonical_base_prefixes: I,
        read_through_cache: bool,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cache_base_uri: cache_base_uri.into().trim().to_string(),
            canonical_base_prefixes: canonical_base_prefixes
                .into_iter()
                .map(|p| p.into().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            read_through_cache,
        }
    }

    /// Reads the mapping keys from any source, defaulting unset keys to `""`.
    pub fn from_source<S: ConfigSource + ?Sized>(source: &S) -> Self {
        Self::new(
            source.get_or(CACHE_BASE_URI, ""),
            split_prefixes(source.get_or(CANONICAL_BASE_URI, "")),
            source.get_bool(READ_THROUGH_CACHE, true),
        )
    }

    /// Reads the mapping keys from flat properties and validates them.
    ///
    /// Fails when `cache.baseuri` is blank, or when the first entry of
    /// `canonical.baseuri` is blank.
    pub fn from_properties(properties: &Properties) -> FileIoResult<Self> {
        let raw_prefixes = properties.get_or(CANONICAL_BASE_URI, "");
        let first_prefix_blank = split_prefixes(raw_prefixes)
            .next()
            .unwrap_or_default()
            .is_empty();

        let config = Self::from_source(properties);
        if config.cache_base_uri.is_empty() || first_prefix_blank {
            return Err(FileIoError::invalid_config(format!(
                "Both '{CACHE_BASE_URI}' and '{CANONICAL_BASE_URI}' properties must be specified"
            )));
        }
        Ok(config)
    }

    pub fn cache_base_uri(&self) -> &str {
        &self.cache_base_uri
    }

    pub fn canonical_base_prefixes(&self) -> &[String] {
        &self.canonical_base_prefixes
    }

    pub fn read_through_cache(&self) -> bool {
        self.read_through_cache
    }
}

fn split_prefixes(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim)
}

/// Loads a YAML mapping of scalar values into [`Properties`].
///
/// Sequences are joined with `,` so `canonical.baseuri` may be written as a
/// list.
pub fn load_properties_file(path: &Path) -> FileIoResult<Properties> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        FileIoError::invalid_config(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_properties_yaml(&content)
        .map_err(|e| FileIoError::invalid_config(format!("{}: {}", path.display(), e)))
}

pub(crate) fn parse_properties_yaml(content: &str) -> Result<Properties, String> {
    if content.trim().is_empty() {
        return Ok(Properties::new());
    }
    let raw: BTreeMap<String, serde_yaml::Value> =
        serde_yaml::from_str(content).map_err(|e| e.to_string())?;

    raw.into_iter()
        .map(|(key, value)| -> Result<(String, String), String> {
            let value = match value {
                serde_yaml::Value::Sequence(items) => items
                    .into_iter()
                    .map(|item| scalar_to_string(&key, item))
                    .collect::<Result<Vec<_>, _>>()?
                    .join(","),
                other => scalar_to_string(&key, other)?,
            };
            Ok((key, value))
        })
        .collect()
}

fn scalar_to_string(key: &str, value: serde_yaml::Value) -> Result<String, String> {
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        _ => Err(format!("value for '{key}' must be a scalar or a list of scalars")),
    }
}
