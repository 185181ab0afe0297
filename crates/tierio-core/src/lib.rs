//! Read-through cache file access for table storage.
//!
//! [`PathMappingFileIo`] wraps a [`FileIo`] delegate and serves reads of
//! canonical locations (`gs://bucket/...`) from a cache tier
//! (`alluxio://host:port/...`) while writes and deletes go to the canonical
//! store.

pub mod config;
pub mod error;
pub mod io;
pub mod location;
pub mod mapping;
pub mod object_store_io;
pub mod path_mapping;

// Convenience re-exports
pub use config::{
    load_properties_file, Conf, ConfigSource, MappingConfig, Properties, CACHE_BASE_URI,
    CANONICAL_BASE_URI, READ_THROUGH_CACHE,
};
pub use error::{FileIoError, FileIoResult};
pub use io::{ConfSupplier, Configurable, FileInfo, FileIo, InputFile, OutputFile};
pub use location::StoreLocation;
pub use mapping::MappedLocation;
pub use object_store_io::ObjectStoreFileIo;
pub use path_mapping::{MappedInputFile, PathMappingFileIo};

// Re-export bytes for CLI convenience
pub use bytes::Bytes;
