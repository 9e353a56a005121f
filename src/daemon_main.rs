use std::env::args;

use anyhow::Result;
use clap::Parser;
use kbdcounter::{
    daemon::{
        args::{DaemonArgs, DaemonConfig},
        start_daemon,
    },
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() -> Result<()> {
    run_service(args().collect::<Vec<_>>())
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = DaemonArgs::parse_from(&command_args);
    // Detaching moves the process to `/`, relative store paths have to be resolved before that.
    let config = args.store.config()?;

    if !args.force {
        #[cfg(unix)]
        {
            use daemonize::Daemonize;
            use tracing::error;

            let daemonize = Daemonize::new()
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent
                        .inspect_err(|e| error!("Failed to create daemon on parent side {e:?}"))?;
                    println!("Created daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(_) => (),
            }
        }
    }

    run(args, config)
}

fn run(args: DaemonArgs, config: DaemonConfig) -> Result<()> {
    let app_dir = create_application_default_path()?;
    enable_logging(DAEMON_PREFIX, &app_dir, args.log, args.log_console)?;
    single_thread_runtime()?.block_on(async move { start_daemon(config).await })?;
    Ok(())
}
