use super::super::args::{Cli, Command};

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Resolve(args) => super::resolve::cmd_resolve(&cli.config, args),
        Command::Cat(args) => super::cat::cmd_cat(&cli.config, args).await,
        Command::Ls(args) => super::ls::cmd_ls(&cli.config, args).await,
        Command::Put(args) => super::put::cmd_put(&cli.config, args).await,
        Command::Rm(args) => super::rm::cmd_rm(&cli.config, args).await,
    }
}
