//! [`FileIo`] backed by the `object_store` crate.
//!
//! Locations are URIs. One store client is built per `scheme://authority`
//! root on first use and cached:
//!
//! - `file://`: local filesystem
//! - `memory://{name}`: in-process store (testing)
//! - `s3://{bucket}`, `s3a://{bucket}`: `AmazonS3Builder::from_env`, plus the
//!   `s3.*` properties below
//! - `gs://{bucket}`: `GoogleCloudStorageBuilder::from_env`
//!
//! Other schemes (a cache tier such as `alluxio://host:port`) must be
//! registered with [`ObjectStoreFileIo::register_store`], or, for the
//! `cache.baseuri` root, served by an S3-compatible endpoint configured with
//! `cache.s3.endpoint` and `cache.s3.bucket`.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path;
use object_store::{ObjectStore, ObjectStoreExt, PutMode, PutOptions, PutPayload};

use crate::config::{Conf, ConfigSource, Properties, CACHE_BASE_URI};
use crate::error::{FileIoError, FileIoResult};
use crate::io::{ConfSupplier, Configurable, FileInfo, FileIo, InputFile, OutputFile};
use crate::location::{normalize_root, StoreLocation};

pub const S3_ENDPOINT: &str = "s3.endpoint";
pub const S3_REGION: &str = "s3.region";
pub const S3_ACCESS_KEY_ID: &str = "s3.access-key-id";
pub const S3_SECRET_ACCESS_KEY: &str = "s3.secret-access-key";
/// S3-compatible endpoint serving the `cache.baseuri` root (e.g. an Alluxio S3 proxy).
pub const CACHE_S3_ENDPOINT: &str = "cache.s3.endpoint";
/// Bucket holding the cache tier behind [`CACHE_S3_ENDPOINT`].
pub const CACHE_S3_BUCKET: &str = "cache.s3.bucket";

/// File io over `object_store` clients.
#[derive(Default)]
pub struct ObjectStoreFileIo {
    properties: Properties,
    conf: Option<ConfSupplier>,
    stores: RwLock<HashMap<String, Arc<dyn ObjectStore>>>,
    closed: bool,
}

impl fmt::Debug for ObjectStoreFileIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roots: Vec<String> = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        f.debug_struct("ObjectStoreFileIo")
            .field("properties", &self.properties)
            .field("has_conf", &self.conf.is_some())
            .field("stores", &roots)
            .field("closed", &self.closed)
            .finish()
    }
}

impl ObjectStoreFileIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `store` for every location under `root` (e.g. `alluxio://localhost:19998`).
    pub fn register_store(&self, root: &str, store: Arc<dyn ObjectStore>) {
        self.stores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(normalize_root(root), store);
    }

    /// Builder form of [`register_store`](Self::register_store).
    pub fn with_store(self, root: &str, store: Arc<dyn ObjectStore>) -> Self {
        self.register_store(root, store);
        self
    }

    /// Properties overlaid with the current conf.
    fn settings(&self) -> Conf {
        let mut settings = Conf::from(self.properties.clone());
        if let Some(conf) = self.conf() {
            settings.merge(conf);
        }
        settings
    }

    fn ensure_open(&self) -> FileIoResult<()> {
        if self.closed {
            return Err(FileIoError::Closed);
        }
        Ok(())
    }

    fn open(&self, location: &str) -> FileIoResult<(StoreLocation, Arc<dyn ObjectStore>)> {
        self.ensure_open()?;
        let parsed = StoreLocation::parse(location)?;
        let store = self.store_for(&parsed, location)?;
        Ok((parsed, store))
    }

    fn store_for(
        &self,
        parsed: &StoreLocation,
        location: &str,
    ) -> FileIoResult<Arc<dyn ObjectStore>> {
        let root = parsed.root();
        if let Some(store) = self
            .stores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&root)
        {
            return Ok(Arc::clone(store));
        }

        let store = self.build_store(parsed, location)?;
        tracing::debug!(root = %root, "created object store client");
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(stores.entry(root).or_insert(store)))
    }

    fn build_store(
        &self,
        parsed: &StoreLocation,
        location: &str,
    ) -> FileIoResult<Arc<dyn ObjectStore>> {
        let store: Arc<dyn ObjectStore> = match parsed.scheme.as_str() {
            "memory" => Arc::new(object_store::memory::InMemory::new()),
            "file" => {
                if !parsed.authority.is_empty() && parsed.authority != "localhost" {
                    return Err(FileIoError::InvalidLocation {
                        location: location.to_string(),
                        reason: format!(
                            "file URIs cannot name a remote host '{}'",
                            parsed.authority
                        ),
                    });
                }
                Arc::new(object_store::local::LocalFileSystem::new())
            }
            "s3" | "s3a" => {
                let settings = self.settings();
                let endpoint = non_blank(&settings, S3_ENDPOINT);
                Arc::new(s3_builder(&settings, &parsed.authority, endpoint).build()?)
            }
            "gs" => Arc::new(
                object_store::gcp::GoogleCloudStorageBuilder::from_env()
                    .with_bucket_name(parsed.authority.as_str())
                    .build()?,
            ),
            scheme => match self.cache_tier_store(parsed)? {
                Some(store) => store,
                None => {
                    return Err(FileIoError::UnsupportedScheme {
                        scheme: scheme.to_string(),
                        location: location.to_string(),
                    })
                }
            },
        };
        Ok(store)
    }

    /// S3-compatible client for the `cache.baseuri` root, when
    /// `cache.s3.endpoint` is configured.
    fn cache_tier_store(
        &self,
        parsed: &StoreLocation,
    ) -> FileIoResult<Option<Arc<dyn ObjectStore>>> {
        let settings = self.settings();
        let Some(endpoint) = non_blank(&settings, CACHE_S3_ENDPOINT) else {
            return Ok(None);
        };
        let serves_root = non_blank(&settings, CACHE_BASE_URI)
            .and_then(|base| StoreLocation::parse(base).ok())
            .is_some_and(|cache| cache.root() == parsed.root());
        if !serves_root {
            return Ok(None);
        }

        let bucket = non_blank(&settings, CACHE_S3_BUCKET).ok_or_else(|| {
            FileIoError::invalid_config(format!(
                "'{CACHE_S3_BUCKET}' must be set together with '{CACHE_S3_ENDPOINT}'"
            ))
        })?;
        let store = s3_builder(&settings, bucket, Some(endpoint)).build()?;
        Ok(Some(Arc::new(store)))
    }
}

fn non_blank<'a>(settings: &'a Conf, key: &str) -> Option<&'a str> {
    settings.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn s3_builder(settings: &Conf, bucket: &str, endpoint: Option<&str>) -> AmazonS3Builder {
    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

    if let Some(endpoint) = endpoint {
        builder = builder
            .with_allow_http(endpoint.starts_with("http://"))
            .with_endpoint(endpoint);
    }
    if let Some(region) = non_blank(settings, S3_REGION) {
        builder = builder.with_region(region);
    }
    if let Some(key_id) = non_blank(settings, S3_ACCESS_KEY_ID) {
        builder = builder.with_access_key_id(key_id);
    }
    if let Some(secret) = non_blank(settings, S3_SECRET_ACCESS_KEY) {
        builder = builder.with_secret_access_key(secret);
    }
    builder
}

/// Location of a listed object, spelled with the caller's `prefix`.
///
/// `Url` normalizes roots (`file://localhost/x` becomes `file:///x`), so
/// rebuilding from [`StoreLocation::root`] could change a prefix the caller
/// compares against.
fn listed_location(prefix: &str, parsed: &StoreLocation, key: &Path) -> String {
    let relative = key
        .as_ref()
        .strip_prefix(parsed.key.as_ref())
        .map(|rest| rest.trim_start_matches('/'));
    match relative {
        Some(rest) => format!("{}/{}", prefix.trim_end_matches('/'), rest),
        None => parsed.uri_for(key),
    }
}

#[async_trait]
impl FileIo for ObjectStoreFileIo {
    fn initialize(&mut self, properties: Properties) -> FileIoResult<()> {
        self.properties = properties;
        self.stores
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.closed = false;
        Ok(())
    }

    fn properties(&self) -> Properties {
        self.properties.clone()
    }

    fn new_input_file(&self, path: &str) -> FileIoResult<Box<dyn InputFile>> {
        let (parsed, store) = self.open(path)?;
        Ok(Box::new(ObjectStoreInputFile {
            location: path.to_string(),
            key: parsed.key,
            store,
            length: None,
        }))
    }

    fn new_input_file_with_length(
        &self,
        path: &str,
        length: u64,
    ) -> FileIoResult<Box<dyn InputFile>> {
        let (parsed, store) = self.open(path)?;
        Ok(Box::new(ObjectStoreInputFile {
            location: path.to_string(),
            key: parsed.key,
            store,
            length: Some(length),
        }))
    }

    fn new_output_file(&self, path: &str) -> FileIoResult<Box<dyn OutputFile>> {
        let (parsed, store) = self.open(path)?;
        Ok(Box::new(ObjectStoreOutputFile {
            location: path.to_string(),
            key: parsed.key,
            store,
        }))
    }

    async fn delete_file(&self, path: &str) -> FileIoResult<()> {
        let (parsed, store) = self.open(path)?;
        match store.delete(&parsed.key).await {
            Ok(()) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(path, "delete of missing file ignored");
                Ok(())
            }
            Err(e) => Err(FileIoError::from_object_store(e, path)),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> FileIoResult<()> {
        let (parsed, store) = self.open(prefix)?;
        let entries: Vec<_> = store
            .list(parsed.list_prefix())
            .try_collect()
            .await
            .map_err(|e| FileIoError::from_object_store(e, prefix))?;

        for meta in &entries {
            match store.delete(&meta.location).await {
                Ok(()) | Err(object_store::Error::NotFound { .. }) => {}
                Err(e) => {
                    let location = parsed.uri_for(&meta.location);
                    return Err(FileIoError::from_object_store(e, &location));
                }
            }
        }
        tracing::debug!(prefix, deleted = entries.len(), "deleted prefix");
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> FileIoResult<Vec<FileInfo>> {
        let (parsed, store) = self.open(prefix)?;
        let entries: Vec<_> = store
            .list(parsed.list_prefix())
            .try_collect()
            .await
            .map_err(|e| FileIoError::from_object_store(e, prefix))?;

        Ok(entries
            .iter()
            .map(|meta| FileInfo {
                location: listed_location(prefix, &parsed, &meta.location),
                size: meta.size,
                created_at_millis: meta.last_modified.timestamp_millis(),
            })
            .collect())
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.stores
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Configurable for ObjectStoreFileIo {
    fn from_conf(conf: Conf) -> Self {
        let mut io = Self::default();
        io.set_conf(conf);
        io
    }

    fn set_conf(&mut self, conf: Conf) {
        self.conf = Some(Arc::new(move || conf.clone()));
        self.stores
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.closed = false;
    }

    fn conf(&self) -> Option<Conf> {
        self.conf.as_ref().map(|supplier| supplier())
    }

    fn serialize_conf_with(&mut self, serializer: &dyn Fn(Conf) -> ConfSupplier) {
        let current = self
            .conf()
            .unwrap_or_else(|| Conf::from(self.properties.clone()));
        self.conf = Some(serializer(current));
    }
}

/// Lazy read handle for one object.
#[derive(Debug)]
pub struct ObjectStoreInputFile {
    location: String,
    key: Path,
    store: Arc<dyn ObjectStore>,
    length: Option<u64>,
}

#[async_trait]
impl InputFile for ObjectStoreInputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn length(&self) -> FileIoResult<u64> {
        if let Some(length) = self.length {
            return Ok(length);
        }
        let meta = self
            .store
            .head(&self.key)
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))?;
        Ok(meta.size)
    }

    async fn read(&self) -> FileIoResult<Bytes> {
        let result = self
            .store
            .get(&self.key)
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))?;

        result
            .bytes()
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))
    }

    async fn read_range(&self, range: Range<u64>) -> FileIoResult<Bytes> {
        self.store
            .get_range(&self.key, range)
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))
    }

    async fn exists(&self) -> FileIoResult<bool> {
        match self.store.head(&self.key).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(FileIoError::from_object_store(e, &self.location)),
        }
    }
}

/// Lazy write handle for one object.
#[derive(Debug)]
pub struct ObjectStoreOutputFile {
    location: String,
    key: Path,
    store: Arc<dyn ObjectStore>,
}

#[async_trait]
impl OutputFile for ObjectStoreOutputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn create(&self, bytes: Bytes) -> FileIoResult<()> {
        let opts = PutOptions {
            mode: PutMode::Create, // Fails if object exists
            ..Default::default()
        };
        self.store
            .put_opts(&self.key, PutPayload::from_bytes(bytes), opts)
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))?;
        Ok(())
    }

    async fn create_or_overwrite(&self, bytes: Bytes) -> FileIoResult<()> {
        self.store
            .put(&self.key, PutPayload::from_bytes(bytes))
            .await
            .map_err(|e| FileIoError::from_object_store(e, &self.location))?;
        Ok(())
    }

    fn to_input_file(&self) -> Box<dyn InputFile> {
        Box::new(ObjectStoreInputFile {
            location: self.location.clone(),
            key: self.key.clone(),
            store: Arc::clone(&self.store),
            length: None,
        })
    }
}
