//! `tierio cat` - Read a file through the cache mapping.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use tierio_core::FileIo;

use super::open_file_io;
use crate::cli::args::ConfigArgs;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Args, Clone)]
pub struct CatArgs {
    /// Canonical location to read
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Known file length in bytes (skips the size lookup)
    #[arg(long)]
    pub length: Option<u64>,
}

pub async fn cmd_cat(config: &ConfigArgs, args: CatArgs) -> Result<i32> {
    let io = open_file_io(config)?;

    let input = match args.length {
        Some(length) => io.new_input_file_with_length(&args.path, length)?,
        None => io.new_input_file(&args.path)?,
    };
    let bytes = input
        .read()
        .await
        .with_context(|| format!("failed to read {}", args.path))?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&bytes)
        .context("failed to write to stdout")?;
    stdout.flush().context("failed to write to stdout")?;

    eprintln!(
        "Read {} bytes: {} (served from {})",
        bytes.len(),
        input.location(),
        input.effective_location()
    );
    Ok(SUCCESS)
}
