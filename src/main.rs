//! CLI entry point for autofolio.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use autofolio::config::{self, Config};
use autofolio::error::Error;
use autofolio::execution::{self, ExecuteOptions};
use autofolio::fidelity::FidelityClient;

#[derive(Parser)]
#[command(name = "autofolio")]
#[command(about = "Automated mutual-fund portfolio rebalancer")]
#[command(version)]
struct Cli {
    /// Path to config.toml
    #[arg(long, default_value_os_t = config::default_config_path())]
    config: PathBuf,

    /// Override the plan file location
    #[arg(long)]
    plan: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the allocation plan from current holdings and save it
    Calculate,

    /// Submit the buys from the saved plan, then delete it
    Execute {
        /// Skip confirmation prompt (for automation/cron)
        #[arg(long)]
        force: bool,
    },

    /// Show current holdings
    Positions,

    /// Check that the brokerage session works
    Status,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            process::exit(1);
        }
    };

    let plan_path = cli
        .plan
        .clone()
        .unwrap_or_else(|| config.plan.path.clone());

    let mut broker = match FidelityClient::new(config.credentials.clone()) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Calculate => execution::calculate(&config, &mut broker, &plan_path),
        Command::Execute { force } => {
            execution::execute(&config, &mut broker, &plan_path, &ExecuteOptions { force })
        }
        Command::Positions => execution::show_positions(&config, &mut broker),
        Command::Status => execution::check_status(&mut broker),
    };

    if let Err(e) = result {
        match &e {
            Error::Aborted(msg) => {
                eprintln!("{msg}");
                process::exit(0);
            }
            _ => {
                eprintln!("Error: {e}");
                process::exit(1);
            }
        }
    }
}
