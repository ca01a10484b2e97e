//! Tabmark CLI
//!
//! Drives the popup state engine headlessly against recorded platform
//! fixtures:
//! - `inspect`: load a fixture, refresh both stores, print the popup state
//! - `flow run`: replay a scripted key/assert flow and fail on the first miss

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tabmark_logging::{init_logging, LogConfig};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "tabmark", about = "Headless driver for the Tabmark popup engine")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Engine config file (defaults to $TABMARK_HOME/config.toml when present)
    #[arg(long, global = true, env = "TABMARK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a fixture and print the tab list and folder tree
    Inspect(cli::inspect::InspectArgs),

    /// Scripted popup flows
    Flow {
        #[command(subcommand)]
        command: cli::flow_runner::FlowCommand,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "tabmark",
        verbose: cli.verbose,
    }) {
        eprintln!("Warning: failed to initialize logging: {:#}", err);
    }

    let json_mode = matches!(&cli.command, Commands::Inspect(args) if args.json);

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}

fn run_command(cli: Cli) -> Result<()> {
    let config = cli::config::load_engine_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Inspect(args) => cli::inspect::run(args, &config),
        Commands::Flow { command } => cli::flow_runner::run(command, &config),
    }
}
