use std::{
    env, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// File the daemon writes into when no store path is given.
pub const DEFAULT_STORE_FILE: &str = "~/.kbdcounter.db";

fn home_dir() -> Result<PathBuf> {
    env::var("HOME")
        .map(PathBuf::from)
        .context("HOME is not set")
}

/// Directory for logs and other state that isn't the store itself.
pub fn create_application_default_path() -> Result<PathBuf> {
    let mut path = env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| {
            home_dir().map(|mut path| {
                path.push(".local/state");
                path
            })
        })
        .context("Couldn't find neither XDG_STATE_HOME nor HOME")?;
    path.push("kbdcounter");

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

/// Replaces a leading `~` with the home directory. Other paths are returned untouched.
pub fn expand_home(path: &Path) -> Result<PathBuf> {
    match path.strip_prefix("~") {
        Ok(rest) => Ok(home_dir()?.join(rest)),
        Err(_) => Ok(path.to_path_buf()),
    }
}

/// Turns a user supplied store path into an absolute one. The daemon changes its working
/// directory, so relative paths would otherwise point somewhere else.
pub fn resolve_store_path(path: &Path) -> Result<PathBuf> {
    let expanded = expand_home(path)?;
    std::path::absolute(&expanded)
        .with_context(|| format!("Can't resolve store path {}", expanded.display()))
}
