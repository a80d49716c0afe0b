use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;
mod output;
pub mod ux_error;

use commands::{Cli, Commands};
use ux_error::UxError;

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Get(args) => commands::get::run(&cli.sources, args),
        Commands::Set(args) => commands::set::run(&cli.sources, args),
        Commands::Unset(args) => commands::unset::run(&cli.sources, args),
        Commands::Dump(args) => commands::dump::run(&cli.sources, args),
        Commands::Owner(args) => commands::owner::run(&cli.sources, args),
    };

    if let Err(err) = &result {
        if let Some(ux) = err.downcast_ref::<UxError>() {
            ux.display();
            std::process::exit(1);
        }
    }
    result
}
