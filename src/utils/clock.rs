use chrono::{DateTime, Local};

/// Represents an entity responsible for providing dates across application. This can allow it to
/// be used for testing
pub trait Clock: Send + 'static {
    fn time(&self) -> DateTime<Local>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }
}
