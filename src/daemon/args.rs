use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::utils::dir::{resolve_store_path, DEFAULT_STORE_FILE};

use super::DEFAULT_FLUSH_INTERVAL;

/// Options shared by every command that runs the daemon.
#[derive(clap::Args, Debug, Clone)]
pub struct StoreArgs {
    #[arg(
        long,
        default_value = DEFAULT_STORE_FILE,
        help = "SQLite file the records are written into"
    )]
    pub storepath: PathBuf,
    #[arg(
        long = "flush-interval",
        default_value_t = DEFAULT_FLUSH_INTERVAL.as_secs(),
        help = "Seconds between writes to the store"
    )]
    pub flush_interval: u64,
}

#[derive(Parser)]
pub struct DaemonArgs {
    #[arg(long)]
    pub force: bool,
    #[command(flatten)]
    pub store: StoreArgs,
    /// This option is for debugging purposes only.
    #[arg(long = "log-console")]
    pub log_console: bool,
    #[arg(long = "log-filter")]
    pub log: Option<LevelFilter>,
}

/// Settings [start_daemon](super::start_daemon) runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub store_path: PathBuf,
    pub flush_interval: Duration,
}

impl StoreArgs {
    pub fn config(&self) -> Result<DaemonConfig> {
        ensure!(self.flush_interval > 0, "Flush interval must be at least a second");
        Ok(DaemonConfig {
            store_path: resolve_store_path(&self.storepath)?,
            flush_interval: Duration::from_secs(self.flush_interval),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = DaemonArgs::parse_from(["kbdcounter-daemon"]);
        let config = args.store.config().unwrap();

        assert!(!args.force);
        assert!(config.store_path.ends_with(".kbdcounter.db"));
        assert!(config.store_path.is_absolute());
        assert_eq!(config.flush_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_explicit_options() {
        let args = DaemonArgs::parse_from([
            "kbdcounter-daemon",
            "--force",
            "--storepath",
            "/tmp/counter.db",
            "--flush-interval",
            "5",
            "--log-filter",
            "debug",
        ]);
        let config = args.store.config().unwrap();

        assert!(args.force);
        assert_eq!(args.log, Some(LevelFilter::DEBUG));
        assert_eq!(config.store_path, PathBuf::from("/tmp/counter.db"));
        assert_eq!(config.flush_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_relative_store_survives_directory_change() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let previous = std::env::current_dir()?;
        std::env::set_current_dir(dir.path())?;
        let started_in = std::env::current_dir()?;

        let args = DaemonArgs::parse_from(["kbdcounter-daemon", "--storepath", "rel.db"]);
        let config = args.store.config();
        std::env::set_current_dir("/")?;
        let config = config?;
        std::env::set_current_dir(previous)?;

        assert_eq!(config.store_path, started_in.join("rel.db"));
        Ok(())
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let args = DaemonArgs::parse_from(["kbdcounter-daemon", "--flush-interval", "0"]);
        assert!(args.store.config().is_err());
    }
}
