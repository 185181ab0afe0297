//! Read-through cache adapter.
//!
//! [`PathMappingFileIo`] wraps a delegate [`FileIo`] and redirects reads of
//! canonical locations to the cache tier. Writes and deletes always target the
//! canonical store. Handles opened from the cache tier still report the
//! canonical location, so manifests and metadata never record cache URIs.

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{Conf, MappingConfig, Properties};
use crate::error::{FileIoError, FileIoResult};
use crate::io::{ConfSupplier, Configurable, FileInfo, FileIo, InputFile, OutputFile};
use crate::mapping::MappedLocation;
use crate::object_store_io::ObjectStoreFileIo;

/// File io that serves reads from the cache tier.
///
/// Built either with [`FileIo::initialize`] (validated) or
/// [`Configurable::from_conf`]/[`Configurable::set_conf`] (not validated).
/// Re-initializing replaces the mapping and the delegate together.
#[derive(Debug)]
pub struct PathMappingFileIo<D = ObjectStoreFileIo> {
    state: Option<MappingState<D>>,
    closed: bool,
}

#[derive(Debug)]
struct MappingState<D> {
    config: MappingConfig,
    delegate: D,
}

impl<D> Default for PathMappingFileIo<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> PathMappingFileIo<D> {
    /// An uninitialized instance. Every operation except `close` fails until
    /// `initialize` or `set_conf` is called.
    pub fn new() -> Self {
        Self {
            state: None,
            closed: false,
        }
    }

    /// Wraps an already configured delegate.
    pub fn with_delegate(config: MappingConfig, delegate: D) -> Self {
        Self {
            state: Some(MappingState { config, delegate }),
            closed: false,
        }
    }

    pub fn mapping_config(&self) -> Option<&MappingConfig> {
        self.state.as_ref().map(|state| &state.config)
    }

    pub fn delegate(&self) -> Option<&D> {
        self.state.as_ref().map(|state| &state.delegate)
    }

    /// Where a read of `path` would be served from. Identity before
    /// initialization.
    pub fn resolve_read_location(&self, path: &str) -> MappedLocation {
        match &self.state {
            Some(state) => state.config.resolve_read_location(path),
            None => MappedLocation::unchanged(path),
        }
    }

    fn state(&self) -> FileIoResult<&MappingState<D>> {
        if self.closed {
            return Err(FileIoError::Closed);
        }
        self.state.as_ref().ok_or(FileIoError::NotInitialized)
    }
}

impl<D> MappingState<D> {
    fn resolve(&self, path: &str) -> MappedLocation {
        let mapped = self.config.resolve_read_location(path);
        if mapped.is_remapped() {
            tracing::debug!(
                original = mapped.original_path(),
                effective = mapped.effective_path(),
                "serving read from cache tier"
            );
        }
        mapped
    }
}

/// Puts the original location back on a handle opened at the mapped one.
fn report_original(input: Box<dyn InputFile>, mapped: MappedLocation) -> Box<dyn InputFile> {
    if mapped.is_remapped() {
        Box::new(MappedInputFile::new(input, mapped.into_original_path()))
    } else {
        input
    }
}

#[async_trait]
impl<D: FileIo + Default> FileIo for PathMappingFileIo<D> {
    fn initialize(&mut self, properties: Properties) -> FileIoResult<()> {
        let config = MappingConfig::from_properties(&properties)?;
        let mut delegate = D::default();
        delegate.initialize(properties)?;

        self.state = Some(MappingState { config, delegate });
        self.closed = false;
        Ok(())
    }

    fn properties(&self) -> Properties {
        self.state
            .as_ref()
            .map(|state| state.delegate.properties())
            .unwrap_or_default()
    }

    fn new_input_file(&self, path: &str) -> FileIoResult<Box<dyn InputFile>> {
        let state = self.state()?;
        let mapped = state.resolve(path);
        let input = state.delegate.new_input_file(mapped.effective_path())?;
        Ok(report_original(input, mapped))
    }

    fn new_input_file_with_length(
        &self,
        path: &str,
        length: u64,
    ) -> FileIoResult<Box<dyn InputFile>> {
        let state = self.state()?;
        let mapped = state.resolve(path);
        let input = state
            .delegate
            .new_input_file_with_length(mapped.effective_path(), length)?;
        Ok(report_original(input, mapped))
    }

    // Writes always land in the canonical store.
    fn new_output_file(&self, path: &str) -> FileIoResult<Box<dyn OutputFile>> {
        self.state()?.delegate.new_output_file(path)
    }

    async fn delete_file(&self, path: &str) -> FileIoResult<()> {
        self.state()?.delegate.delete_file(path).await
    }

    async fn delete_prefix(&self, prefix: &str) -> FileIoResult<()> {
        self.state()?.delegate.delete_prefix(prefix).await
    }

    async fn list_prefix(&self, prefix: &str) -> FileIoResult<Vec<FileInfo>> {
        let state = self.state()?;
        let mapped = state.resolve(prefix);
        let entries = state.delegate.list_prefix(mapped.effective_path()).await?;
        if !mapped.is_remapped() {
            return Ok(entries);
        }

        Ok(entries
            .into_iter()
            .map(|info| FileInfo {
                location: mapped.restore_location(&info.location),
                ..info
            })
            .collect())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(state) = self.state.as_mut() {
            state.delegate.close();
            self.closed = true;
        }
    }
}

impl<D: Configurable> Configurable for PathMappingFileIo<D> {
    fn from_conf(conf: Conf) -> Self {
        let config = MappingConfig::from_source(&conf);
        Self::with_delegate(config, D::from_conf(conf))
    }

    fn set_conf(&mut self, conf: Conf) {
        *self = Self::from_conf(conf);
    }

    fn conf(&self) -> Option<Conf> {
        self.state.as_ref().and_then(|state| state.delegate.conf())
    }

    fn serialize_conf_with(&mut self, serializer: &dyn Fn(Conf) -> ConfSupplier) {
        if let Some(state) = self.state.as_mut() {
            state.delegate.serialize_conf_with(serializer);
        }
    }
}

/// Read handle that reports a location other than the one it reads from.
///
/// Everything except [`InputFile::location`] is forwarded to the wrapped handle.
#[derive(Debug)]
pub struct MappedInputFile {
    inner: Box<dyn InputFile>,
    location: String,
}

impl MappedInputFile {
    pub fn new(inner: Box<dyn InputFile>, location: impl Into<String>) -> Self {
        Self {
            inner,
            location: location.into(),
        }
    }

    pub fn into_inner(self) -> Box<dyn InputFile> {
        self.inner
    }
}

#[async_trait]
impl InputFile for MappedInputFile {
    fn location(&self) -> &str {
        &self.location
    }

    fn effective_location(&self) -> &str {
        self.inner.effective_location()
    }

    async fn length(&self) -> FileIoResult<u64> {
        self.inner.length().await
    }

    async fn read(&self) -> FileIoResult<Bytes> {
        self.inner.read().await
    }

    async fn read_range(&self, range: Range<u64>) -> FileIoResult<Bytes> {
        self.inner.read_range(range).await
    }

    async fn exists(&self) -> FileIoResult<bool> {
        self.inner.exists().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CACHE_BASE_URI, CANONICAL_BASE_URI, READ_THROUGH_CACHE};
    use object_store::memory::InMemory;
    use std::sync::Arc;

    const CACHE_ROOT: &str = "alluxio://localhost:19998";

    fn scenario_properties(read_through: &str) -> Properties {
        [
            (CACHE_BASE_URI, "alluxio://localhost:19998/"),
            (CANONICAL_BASE_URI, "gs://my-bucket/"),
            (READ_THROUGH_CACHE, read_through),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    fn memory_properties() -> Properties {
        [
            (CACHE_BASE_URI, "memory://cache/"),
            (CANONICAL_BASE_URI, "memory://canonical/"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Canonical and cache stores hold different bytes for the same key, so a
    /// read shows which tier served it.
    async fn two_tier_io(read_through: &str) -> PathMappingFileIo {
        let delegate = ObjectStoreFileIo::new()
            .with_store("gs://my-bucket", Arc::new(InMemory::new()))
            .with_store(CACHE_ROOT, Arc::new(InMemory::new()));

        delegate
            .new_output_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .unwrap()
            .create(Bytes::from("canonical"))
            .await
            .unwrap();
        delegate
            .new_output_file("alluxio://localhost:19998/warehouse/t/data/f.parquet")
            .unwrap()
            .create(Bytes::from("cached"))
            .await
            .unwrap();

        let config = MappingConfig::from_properties(&scenario_properties(read_through)).unwrap();
        PathMappingFileIo::with_delegate(config, delegate)
    }

    #[tokio::test]
    async fn test_read_served_from_cache_reports_canonical_location() {
        let io = two_tier_io("true").await;
        let input = io
            .new_input_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .unwrap();

        assert_eq!(input.location(), "gs://my-bucket/warehouse/t/data/f.parquet");
        assert_eq!(input.read().await.unwrap(), Bytes::from("cached"));
        assert_eq!(input.length().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_read_with_length_reports_canonical_location() {
        let io = two_tier_io("true").await;
        let input = io
            .new_input_file_with_length("gs://my-bucket/warehouse/t/data/f.parquet", 6)
            .unwrap();
        assert_eq!(input.location(), "gs://my-bucket/warehouse/t/data/f.parquet");
        assert_eq!(input.read_range(0..3).await.unwrap(), Bytes::from("cac"));
    }

    #[tokio::test]
    async fn test_output_file_targets_canonical_store() {
        let io = two_tier_io("true").await;
        let output = io
            .new_output_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .unwrap();
        assert_eq!(output.location(), "gs://my-bucket/warehouse/t/data/f.parquet");
        assert_eq!(
            output.to_input_file().read().await.unwrap(),
            Bytes::from("canonical")
        );
    }

    #[tokio::test]
    async fn test_delete_targets_canonical_store() {
        let io = two_tier_io("true").await;
        io.delete_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .await
            .unwrap();

        let delegate = io.delegate().unwrap();
        let canonical = delegate
            .new_input_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .unwrap();
        assert!(!canonical.exists().await.unwrap());
        let cached = delegate
            .new_input_file("alluxio://localhost:19998/warehouse/t/data/f.parquet")
            .unwrap();
        assert!(cached.exists().await.unwrap());
    }

    #[tokio::test]
    async fn test_list_prefix_reports_canonical_locations() {
        let io = two_tier_io("true").await;
        let listed = io.list_prefix("gs://my-bucket/warehouse/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].location, "gs://my-bucket/warehouse/t/data/f.parquet");
        // size comes from the cache tier copy
        assert_eq!(listed[0].size, 6);
    }

    #[tokio::test]
    async fn test_list_prefix_restores_non_normalized_cache_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cache/t")).unwrap();
        std::fs::write(dir.path().join("cache/t/f.txt"), "cached").unwrap();

        let cache_base = format!("file://localhost{}/cache/", dir.path().display());
        let config = MappingConfig::new(cache_base, ["gs://my-bucket/"], true);
        let io = PathMappingFileIo::with_delegate(config, ObjectStoreFileIo::new());

        let listed: Vec<String> = io
            .list_prefix("gs://my-bucket/t/")
            .await
            .unwrap()
            .into_iter()
            .map(|info| info.location)
            .collect();
        assert_eq!(listed, vec!["gs://my-bucket/t/f.txt"]);

        let input = io.new_input_file("gs://my-bucket/t/f.txt").unwrap();
        assert_eq!(input.location(), "gs://my-bucket/t/f.txt");
        assert_eq!(input.read().await.unwrap(), Bytes::from("cached"));
    }

    #[tokio::test]
    async fn test_disabled_read_through_reads_canonical() {
        let io = two_tier_io("false").await;
        let input = io
            .new_input_file("gs://my-bucket/warehouse/t/data/f.parquet")
            .unwrap();
        assert_eq!(input.read().await.unwrap(), Bytes::from("canonical"));
    }

    #[test]
    fn test_uninitialized_operations_fail() {
        let io: PathMappingFileIo = PathMappingFileIo::new();
        assert!(matches!(
            io.new_input_file("gs://my-bucket/x").unwrap_err(),
            FileIoError::NotInitialized
        ));
        assert!(io.properties().is_empty());
        assert!(io.conf().is_none());
        assert_eq!(
            io.resolve_read_location("gs://my-bucket/x").effective_path(),
            "gs://my-bucket/x"
        );
    }

    #[test]
    fn test_close_without_delegate_is_noop() {
        let mut io: PathMappingFileIo = PathMappingFileIo::new();
        io.close();
        io.close();
        io.initialize(memory_properties()).unwrap();
        let input = io.new_input_file("memory://canonical/x").unwrap();
        assert_eq!(input.location(), "memory://canonical/x");
    }

    #[test]
    fn test_operations_after_close_fail() {
        let mut io: PathMappingFileIo = PathMappingFileIo::new();
        io.initialize(memory_properties()).unwrap();
        io.close();
        assert!(matches!(
            io.new_output_file("memory://canonical/x").unwrap_err(),
            FileIoError::Closed
        ));
    }

    #[test]
    fn test_failed_initialize_keeps_previous_state() {
        let mut io: PathMappingFileIo = PathMappingFileIo::new();
        io.initialize(memory_properties()).unwrap();

        let err = io.initialize(Properties::new()).unwrap_err();
        assert!(err.is_config_error());
        assert_eq!(io.mapping_config().unwrap().cache_base_uri(), "memory://cache/");
        assert_eq!(io.properties().len(), 2);
    }

    #[test]
    fn test_mapped_input_file_exposes_effective_location() {
        let delegate = ObjectStoreFileIo::new();
        let inner = delegate.new_input_file("memory://cache/x").unwrap();
        let mapped = MappedInputFile::new(inner, "gs://bucket/x");
        assert_eq!(mapped.location(), "gs://bucket/x");
        assert_eq!(mapped.effective_location(), "memory://cache/x");

        let nested = MappedInputFile::new(Box::new(mapped), "gs://other/x");
        assert_eq!(nested.effective_location(), "memory://cache/x");
        let inner = nested.into_inner();
        assert_eq!(inner.location(), "gs://bucket/x");
        assert_eq!(inner.effective_location(), "memory://cache/x");
    }
}
