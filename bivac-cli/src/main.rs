mod cli;
mod commands;
mod output;

use std::io::{self, IsTerminal};
use std::process;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser};
#[cfg(feature = "colored-output")]
use colored::*;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::{
    cli::{Args, Commands},
    commands::CommandExecutor,
    output::OutputManager,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let json_errors = args.output.is_json();

    if let Err(e) = run(args).await {
        if json_errors {
            let error_json = serde_json::json!({
                "status": "error",
                "message": format!("{e:#}"),
            });
            println!("{error_json}");
        } else {
            error!("Application error: {e:#}");
            #[cfg(feature = "colored-output")]
            {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
            }
            #[cfg(not(feature = "colored-output"))]
            {
                eprintln!("Error: {e:#}");
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    if let Commands::Completions { shell } = args.command {
        let mut command = Args::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose, args.quiet, args.log_json);

    let config = CommandExecutor::build_config(
        args.remote_address,
        args.psk,
        Duration::from_secs(args.timeout),
        args.proxy,
        args.proxy_username,
        args.proxy_password,
    );
    debug!(remote = %config.base_url, "Using bivac manager");

    let colored = !args.output.is_json() && io::stdout().is_terminal();
    let executor = CommandExecutor::new(config, OutputManager::new(args.output, colored));

    match args.command {
        Commands::Ping => executor.ping().await,
        Commands::Info => executor.info().await,
        Commands::Volumes { ids } => executor.volumes(&ids).await,
        Commands::Backup { ids, force } => executor.backup(&ids, force).await,
        Commands::Restore {
            volume,
            snapshot,
            force,
        } => executor.restore(&volume, &snapshot, force).await,
        Commands::Restic { volume, command } => executor.restic(&volume, &command).await,
        Commands::Watch { interval_ms } => {
            executor.watch(Duration::from_millis(interval_ms)).await
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn init_logging(verbose: bool, quiet: bool, json: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(verbose)
                    .with_writer(io::stderr),
            )
            .init();
    }
}
