use std::{
    fs::File,
    ops::DerefMut,
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use fs4::fs_std::FileExt;
use rusqlite::{params, Connection, OpenFlags};
use tracing::{debug, info};

use super::entities::{StoredRecord, UsageRecord};

/// Interface for abstracting storage of records.
#[cfg_attr(test, mockall::automock)]
pub trait RecordStore {
    /// Inserts every record and commits them together. Either all rows become visible or none do.
    fn append(&mut self, records: &[UsageRecord]) -> Result<()>;
}

impl<T: DerefMut> RecordStore for T
where
    T::Target: RecordStore,
{
    fn append(&mut self, records: &[UsageRecord]) -> Result<()> {
        self.deref_mut().append(records)
    }
}

/// The main realization of [RecordStore], backed by a single SQLite file.
pub struct SqliteRecordStore {
    connection: Connection,
}

impl SqliteRecordStore {
    /// Opens or creates the store. The file is restricted to its owner because it effectively
    /// contains a keylog.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create store directory {}", parent.display())
            })?;
        }

        let connection = Connection::open(path)
            .with_context(|| format!("failed to open store {}", path.display()))?;
        restrict_permissions(path)?;

        let store = Self::with_connection(connection)?;
        info!("Store opened at {}", path.display());
        Ok(store)
    }

    /// Opens an existing store for reading. Nothing is created, a missing file is an error.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        ensure!(path.is_file(), "store {} doesn't exist", path.display());
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open store {}", path.display()))?;
        Ok(Self { connection })
    }

    /// Store that lives only as long as the value. Used for dry runs and tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS record
                 (time text, app_name text, code text, scancode text, value text)",
                [],
            )
            .context("failed to create record table")?;
        Ok(Self { connection })
    }

    /// Reads every stored row in insertion order.
    pub fn read_all(&self) -> Result<Vec<StoredRecord>> {
        let mut statement = self.connection.prepare(
            "SELECT time, app_name, code, scancode, value FROM record ORDER BY rowid",
        )?;
        let rows = statement.query_map([], |row| {
            Ok(StoredRecord {
                time: row.get(0)?,
                app_name: row.get(1)?,
                code: row.get(2)?,
                scancode: row.get(3)?,
                value: row.get(4)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

impl RecordStore for SqliteRecordStore {
    fn append(&mut self, records: &[UsageRecord]) -> Result<()> {
        let transaction = self.connection.transaction()?;
        {
            let mut statement = transaction.prepare_cached(
                "INSERT INTO record (time, app_name, code, scancode, value)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for record in records {
                statement
                    .execute(params![
                        record.time_column(),
                        &*record.app_name,
                        &*record.code,
                        record.scancode.to_string(),
                        record.value.to_string(),
                    ])
                    .context("failed to insert record")?;
            }
        }
        transaction.commit().context("failed to commit records")?;
        debug!("Committed {} records", records.len());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .with_context(|| format!("failed to restrict permissions of {}", path.display()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Exclusive lock next to the store. Two daemons writing into the same file would interleave
/// their batches, so the second one refuses to start.
pub struct StoreLock {
    _file: File,
    path: PathBuf,
}

impl StoreLock {
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let mut path = store_path.as_os_str().to_owned();
        path.push(".lock");
        let path = PathBuf::from(path);

        let file = File::options()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .with_context(|| format!("failed to open lock file {}", path.display()))?;
        FileExt::try_lock_exclusive(&file).with_context(|| {
            format!(
                "store {} is already used by another daemon",
                store_path.display()
            )
        })?;

        Ok(Self { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
