//! File access capability traits.
//!
//! [`FileIo`] is what a table engine talks to: it hands out lazy
//! [`InputFile`]/[`OutputFile`] handles and performs deletes and prefix
//! listings. Implementations own the actual storage client.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::{Conf, Properties};
use crate::error::FileIoResult;

/// A readable file. Creating one performs no I/O.
#[async_trait]
pub trait InputFile: Send + Sync + fmt::Debug {
    /// The location reported to callers.
    fn location(&self) -> &str;

    /// The location bytes are actually read from. Differs from
    /// [`location`](Self::location) when a read is served from another tier.
    fn effective_location(&self) -> &str {
        self.location()
    }

    /// Size in bytes, fetched from the store unless known up front.
    async fn length(&self) -> FileIoResult<u64>;

    async fn read(&self) -> FileIoResult<Bytes>;

    async fn read_range(&self, range: Range<u64>) -> FileIoResult<Bytes>;

    async fn exists(&self) -> FileIoResult<bool>;
}

/// A writable file. Creating one performs no I/O.
#[async_trait]
pub trait OutputFile: Send + Sync + fmt::Debug {
    fn location(&self) -> &str;

    /// Writes the file, failing with `AlreadyExists` if it is present.
    async fn create(&self, bytes: Bytes) -> FileIoResult<()>;

    async fn create_or_overwrite(&self, bytes: Bytes) -> FileIoResult<()>;

    /// A handle for reading back what was written.
    fn to_input_file(&self) -> Box<dyn InputFile>;
}

/// One entry of a prefix listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub location: String,
    pub size: u64,
    pub created_at_millis: i64,
}

/// The file access capability set.
#[async_trait]
pub trait FileIo: Send + Sync {
    /// Configures the file io from flat properties. May be called again to
    /// replace the configuration.
    fn initialize(&mut self, properties: Properties) -> FileIoResult<()>;

    /// The properties passed to `initialize` (empty when built from a [`Conf`]).
    fn properties(&self) -> Properties;

    fn new_input_file(&self, path: &str) -> FileIoResult<Box<dyn InputFile>>;

    /// Like `new_input_file`, with the file length already known.
    fn new_input_file_with_length(
        &self,
        path: &str,
        length: u64,
    ) -> FileIoResult<Box<dyn InputFile>>;

    fn new_output_file(&self, path: &str) -> FileIoResult<Box<dyn OutputFile>>;

    async fn delete_file(&self, path: &str) -> FileIoResult<()>;

    /// Deletes every file under `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> FileIoResult<()>;

    async fn list_prefix(&self, prefix: &str) -> FileIoResult<Vec<FileInfo>>;

    /// Releases storage clients. Idempotent.
    fn close(&mut self);
}

/// Produces a [`Conf`] on demand, possibly after deserializing it.
pub type ConfSupplier = Arc<dyn Fn() -> Conf + Send + Sync>;

/// File ios configured from a structured [`Conf`].
pub trait Configurable {
    fn from_conf(conf: Conf) -> Self
    where
        Self: Sized;

    /// Replaces the configuration (and anything derived from it).
    fn set_conf(&mut self, conf: Conf);

    /// The current configuration, `None` before one was supplied.
    fn conf(&self) -> Option<Conf>;

    /// Swaps the held configuration for the supplier `serializer` returns.
    ///
    /// Lets a caller capture the configuration in a form that can be shipped
    /// to a remote execution context. The supplier is not called here.
    fn serialize_conf_with(&mut self, serializer: &dyn Fn(Conf) -> ConfSupplier);
}
