//! `tierio ls` - List files under a prefix.

use anyhow::{Context, Result};
use clap::Args;
use tierio_core::FileIo;

use super::open_file_io;
use crate::cli::args::ConfigArgs;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Args, Clone)]
pub struct LsArgs {
    /// Prefix to list (e.g. gs://bucket/warehouse/t/)
    #[arg(value_name = "PREFIX")]
    pub prefix: String,
}

pub async fn cmd_ls(config: &ConfigArgs, args: LsArgs) -> Result<i32> {
    let io = open_file_io(config)?;

    let mut entries = io
        .list_prefix(&args.prefix)
        .await
        .with_context(|| format!("failed to list {}", args.prefix))?;
    entries.sort_by(|a, b| a.location.cmp(&b.location));

    for info in &entries {
        println!("{:>12}  {}", info.size, info.location);
    }
    eprintln!("{} file(s) under {}", entries.len(), args.prefix);
    Ok(SUCCESS)
}
