//!  Storage is organized through [record_storage::SqliteRecordStore].
//!  The basic idea is:
//!   - There is a single SQLite file with a single `record` table.
//!   - Every column is text, so rows written by older versions stay readable.
//!   - Rows are only ever appended, a whole flush at a time.

pub mod entities;
pub mod record_storage;
