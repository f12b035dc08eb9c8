use anyhow::Result;
use clap::Parser;

use jrun::cli::{Cli, Commands};
use jrun::{commands, logging};

fn main() -> Result<()> {
    // Initialize structured logging
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let code = commands::run::run(args)?;
            std::process::exit(code);
        }
        Commands::Build(args) => commands::build::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Trust(args) => commands::trust::run(args),
        Commands::Cache(args) => commands::cache::run(args),
    }
}
