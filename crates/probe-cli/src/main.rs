//! storefront-probe: end-to-end checks for the Chitai-Gorod storefront
//!
//! ## Usage
//!
//! ```bash
//! storefront-probe run api                       # Cart API suites
//! storefront-probe run ui --filter cart          # Browser suites, filtered
//! storefront-probe run all --report run.json     # Everything, JSON report
//! storefront-probe cart view                     # Current cart
//! storefront-probe config check                  # Resolved settings
//! ```

use clap::Parser;
use std::process::ExitCode;
use storefront_probe_cli::{
    logging, render_response, Cli, CliConfig, CliResult, Commands, ConfigAction, ProbeRunner,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = CliConfig::from_cli(&cli);
    logging::init(config.verbosity);
    let runner = ProbeRunner::new(config);

    match cli.command {
        Commands::Run(args) => runner.run(&args).await?.into_outcome(),
        Commands::Cart(args) => {
            let response = runner.cart(args.action).await?;
            println!("{}", render_response(&response));
            Ok(())
        }
        Commands::RandomId => {
            println!("{}", runner.random_id().await?);
            Ok(())
        }
        Commands::Config(args) => match args.action {
            ConfigAction::Check => {
                println!("{}", runner.check_config()?);
                runner.reporter().success("configuration is valid");
                Ok(())
            }
        },
    }
}
