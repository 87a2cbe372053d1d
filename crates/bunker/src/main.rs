mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use bunker_core::Inventory;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "bunker", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config_or_default();
            let inventory_config = config::build_inventory_config(&cli.global, &cfg)?;
            tracing::debug!(
                api_url = %inventory_config.api_url,
                ws_url = %inventory_config.ws_url,
                "resolved inventory server"
            );
            let inventory = Inventory::new(inventory_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            commands::dispatch(cmd, &inventory, &cli.global).await
        }
    }
}
