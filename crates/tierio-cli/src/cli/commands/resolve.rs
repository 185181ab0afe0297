//! `tierio resolve` - Show the effective read location of each path.

use anyhow::Result;
use clap::Args;

use super::open_file_io;
use crate::cli::args::ConfigArgs;
use crate::exit_codes::SUCCESS;

#[derive(Debug, Args, Clone)]
pub struct ResolveArgs {
    /// Locations to resolve (e.g. gs://bucket/warehouse/t/f.parquet)
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<String>,
}

pub fn cmd_resolve(config: &ConfigArgs, args: ResolveArgs) -> Result<i32> {
    let io = open_file_io(config)?;

    for path in &args.paths {
        let mapped = io.resolve_read_location(path);
        println!("{} -> {}", mapped.original_path(), mapped.effective_path());
    }
    Ok(SUCCESS)
}
