use clap::Parser;
use color_eyre::eyre::{self, WrapErr};
use kube_schema_resolver_cli::{Cli, run, setup_logging};

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    setup_logging(cli.log.log_level, cli.log.log_format, cli.log.color.into())?;

    run(&cli).wrap_err_with(|| format!("resolve {} {}", cli.api_version, cli.kind))?;
    Ok(())
}
