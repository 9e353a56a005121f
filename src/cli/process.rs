use std::{
    env,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use anyhow::{anyhow, Context, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

use crate::daemon::args::StoreArgs;

/// Path of the standalone daemon binary installed next to `cli_path`.
pub fn to_daemon_path(mut cli_path: PathBuf) -> PathBuf {
    cli_path.set_file_name("kbdcounter-daemon");
    cli_path
}

/// Terminates every other process running one of `names`. SIGTERM is tried first so the daemon
/// gets to write its last batch.
pub fn kill_previous_servers(names: &[&Path]) -> Result<()> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't find own pid: {e}"))?;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| names.contains(v))
            .is_some()
        {
            info!("Stopping process {pid}");
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
        }
    }
    Ok(())
}

/// Stops running daemons of this installation.
pub fn stop_servers() -> Result<()> {
    let process_name = env::current_exe().context("Can't locate own executable")?;
    let daemon_name = to_daemon_path(process_name.clone());
    kill_previous_servers(&[&process_name, &daemon_name])
}

/// Arguments the detached `serve` process is started with.
fn serve_arguments(store: &StoreArgs) -> Vec<String> {
    vec![
        "serve".into(),
        "--storepath".into(),
        store.storepath.to_string_lossy().into_owned(),
        "--flush-interval".into(),
        store.flush_interval.to_string(),
    ]
}

/// Cuts the child off from the launching terminal.
fn detach(command: &mut Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());
}

/// Intended for shutting down previous server and starting new one. Currently for simplicity sake
/// it operates using a detached process. This is not great but it's not as hard to configure.
pub fn restart_server(store: &StoreArgs) -> Result<()> {
    // Resolve now, the new process shouldn't depend on the working directory it inherits.
    let config = store.config()?;
    let store = StoreArgs {
        storepath: config.store_path,
        ..store.clone()
    };

    stop_servers()?;
    let process_name = env::current_exe().context("Can't locate own executable")?;
    let mut command = Command::new(process_name);
    command.args(serve_arguments(&store));
    detach(&mut command);

    println!("Spawning");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    println!("Success");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_daemon_path_is_a_sibling() {
        assert_eq!(
            to_daemon_path(PathBuf::from("/usr/local/bin/kbdcounter")),
            PathBuf::from("/usr/local/bin/kbdcounter-daemon")
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_detached_child_has_no_terminal() -> anyhow::Result<()> {
        let mut command = Command::new("sh");
        command.args([
            "-c",
            r#"for fd in 0 1 2; do [ "$(readlink /proc/$$/fd/$fd)" = /dev/null ] || exit 1; done"#,
        ]);
        detach(&mut command);

        assert!(command.spawn()?.wait()?.success());
        Ok(())
    }

    #[test]
    fn test_serve_arguments() {
        let store = StoreArgs {
            storepath: PathBuf::from("/home/user/.kbdcounter.db"),
            flush_interval: 30,
        };
        assert_eq!(
            serve_arguments(&store),
            [
                "serve",
                "--storepath",
                "/home/user/.kbdcounter.db",
                "--flush-interval",
                "30"
            ]
        );
    }
}
