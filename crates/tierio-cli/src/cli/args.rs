use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use super::commands::cat::CatArgs;
use super::commands::ls::LsArgs;
use super::commands::put::PutArgs;
use super::commands::resolve::ResolveArgs;
use super::commands::rm::RmArgs;

#[derive(Parser)]
#[command(
    name = "tierio",
    version,
    about = "Read-through cache file access: reads from the cache tier, writes to canonical storage"
)]
pub struct Cli {
    #[command(flatten)]
    pub config: ConfigArgs,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show where reads of each path are served from (no I/O)
    Resolve(ResolveArgs),
    /// Read a file through the cache mapping and write it to stdout
    Cat(CatArgs),
    /// List files under a prefix
    Ls(LsArgs),
    /// Upload a local file to its canonical location
    Put(PutArgs),
    /// Delete a file, or every file under a prefix
    Rm(RmArgs),
}

/// Where the mapping properties come from.
#[derive(Debug, Args, Clone, Default)]
pub struct ConfigArgs {
    /// Properties file (YAML mapping of keys to values)
    /// Can also be set via TIERIO_CONFIG
    #[arg(long, global = true, env = "TIERIO_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Set a property, overriding the config file (repeatable)
    /// e.g. --set read.through.cache=false
    #[arg(long = "set", global = true, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub overrides: Vec<(String, String)>,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
