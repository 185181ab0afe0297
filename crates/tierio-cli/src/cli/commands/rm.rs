//! `tierio rm` - Delete from canonical storage.

use anyhow::{Context, Result};
use clap::Args;
use tierio_core::FileIo;

use super::open_file_io;
use crate::cli::args::ConfigArgs;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Args, Clone)]
pub struct RmArgs {
    /// Location to delete (never remapped)
    #[arg(value_name = "PATH")]
    pub path: String,

    /// Delete every file under PATH
    #[arg(long)]
    pub prefix: bool,
}

pub async fn cmd_rm(config: &ConfigArgs, args: RmArgs) -> Result<i32> {
    let io = open_file_io(config)?;

    if args.prefix {
        io.delete_prefix(&args.path)
            .await
            .with_context(|| format!("failed to delete prefix {}", args.path))?;
    } else {
        io.delete_file(&args.path)
            .await
            .with_context(|| format!("failed to delete {}", args.path))?;
    }

    eprintln!("Deleted: {}", args.path);
    Ok(SUCCESS)
}
