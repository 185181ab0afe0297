//! `tierio put` - Upload a local file to canonical storage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tierio_core::{Bytes, FileIo};

use super::open_file_io;
use crate::cli::args::ConfigArgs;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Args, Clone)]
pub struct PutArgs {
    /// Local file to upload
    #[arg(value_name = "LOCAL_FILE")]
    pub local: PathBuf,

    /// Destination location (never remapped)
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Fail if the destination already exists
    #[arg(long)]
    pub no_overwrite: bool,
}

pub async fn cmd_put(config: &ConfigArgs, args: PutArgs) -> Result<i32> {
    let content = std::fs::read(&args.local)
        .with_context(|| format!("failed to read {}", args.local.display()))?;
    let len = content.len();

    let io = open_file_io(config)?;
    let output = io.new_output_file(&args.path)?;

    let written = if args.no_overwrite {
        output.create(Bytes::from(content)).await
    } else {
        output.create_or_overwrite(Bytes::from(content)).await
    };
    written.with_context(|| format!("failed to write {}", args.path))?;

    eprintln!("Uploaded {} bytes: {}", len, output.location());
    Ok(SUCCESS)
}
