// src/bin/cli.rs
use hh_ingest::{cli, log};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let _guard = log::init()?;

    let args = cli::parse_args(std::env::args().skip(1))?;
    cli::run(args)?;
    Ok(())
}
