//! Everything that happens on the input side of the daemon: the event types and the thread that
//! reads them.

pub mod events;
pub mod listener;
