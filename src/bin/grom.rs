use clap::Parser;
use grom::cli::{run_cli, Cli};
use grom::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;
    run_cli(cli)
}
