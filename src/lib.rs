//! Small daemon that records what you type and how far the pointer travels, per application.
//! Records are batched and written into a local SQLite file once a minute, the cli can then
//! summarize them without any other tooling.
//!

pub mod cli;
pub mod daemon;
pub mod input_api;
pub mod utils;
pub mod window_api;
