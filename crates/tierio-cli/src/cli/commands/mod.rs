pub mod cat;
pub mod dispatch;
pub mod ls;
pub mod put;
pub mod resolve;
pub mod rm;

pub use dispatch::dispatch;

use anyhow::{Context, Result};
use tierio_core::{load_properties_file, FileIo, PathMappingFileIo, Properties};

use super::args::ConfigArgs;

/// Config file first, then `--set` overrides in order.
pub fn load_properties(args: &ConfigArgs) -> Result<Properties> {
    let mut properties = match &args.config {
        Some(path) => load_properties_file(path)?,
        None => Properties::new(),
    };
    for (key, value) in &args.overrides {
        properties.insert(key.clone(), value.clone());
    }
    Ok(properties)
}

/// Builds and initializes the mapping file io over the default object store delegate.
pub fn open_file_io(args: &ConfigArgs) -> Result<PathMappingFileIo> {
    let properties = load_properties(args)?;
    tracing::debug!(keys = properties.len(), "initializing file io");

    let mut io = PathMappingFileIo::new();
    io.initialize(properties)
        .context("failed to initialize file io")?;
    Ok(io)
}
