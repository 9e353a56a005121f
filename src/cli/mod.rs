pub mod process;
pub mod stats;

use anyhow::Result;
use clap::{Parser, Subcommand};
use process::{restart_server, stop_servers};
use stats::{process_stats_command, StatsCommand};
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{args::StoreArgs, start_daemon},
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "kbdcounter", version, long_about = None)]
#[command(about = "Records keyboard and pointer activity per application", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },
    #[command(about = "Summarize recorded activity of a day")]
    Stats {
        #[command(flatten)]
        command: StatsCommand,
    },
    #[command(
        about = "Run a daemon directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[command(flatten)]
        store: StoreArgs,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    enable_logging(
        CLI_PREFIX,
        &create_application_default_path()?,
        logging_level,
        args.log,
    )?;

    match args.commands {
        Commands::Init { store } => restart_server(&store),
        Commands::Stop {} => stop_servers(),
        Commands::Serve { store } => start_daemon(store.config()?).await,
        Commands::Stats { command } => process_stats_command(command),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_serve_takes_store_options() {
        let args = Args::parse_from(["kbdcounter", "serve", "--storepath", "/tmp/a.db"]);
        match args.commands {
            Commands::Serve { store } => {
                assert_eq!(store.storepath, std::path::PathBuf::from("/tmp/a.db"));
                assert_eq!(store.flush_interval, 60);
            }
            other => panic!("Unexpected command {other:?}"),
        }
    }
}
