use std::{fmt::Display, sync::Arc};

use chrono::{DateTime, Local};

use crate::utils::time::format_record_time;

/// Code of the synthetic record carrying pointer distance.
pub const MOVEMENT_CODE: &str = "EV_MOV";
/// Scancode stored with every movement record.
pub const MOVEMENT_SCANCODE: u32 = 128;
/// Window name stored with movement records. They aggregate samples from any window.
pub const MOVEMENT_APP_NAME: &str = "NULL";

/// Value column of a record. Key records carry the raw integer value of the event, movement
/// records carry a distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordValue {
    Int(i32),
    Distance(f64),
}

impl RecordValue {
    pub fn is_zero(&self) -> bool {
        match *self {
            RecordValue::Int(v) => v == 0,
            RecordValue::Distance(v) => v == 0.,
        }
    }
}

impl Display for RecordValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordValue::Int(v) => write!(f, "{v}"),
            // Debug keeps the trailing ".0" for whole distances, which is how older rows look.
            RecordValue::Distance(v) => write!(f, "{v:?}"),
        }
    }
}

/// Represents one row of the `record` table.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageRecord {
    pub moment: DateTime<Local>,
    pub app_name: Arc<str>,
    pub code: Arc<str>,
    pub scancode: u32,
    pub value: RecordValue,
}

impl UsageRecord {
    /// Creates the per-flush movement aggregate.
    pub fn movement(moment: DateTime<Local>, distance: f64) -> Self {
        Self {
            moment,
            app_name: MOVEMENT_APP_NAME.into(),
            code: MOVEMENT_CODE.into(),
            scancode: MOVEMENT_SCANCODE,
            value: RecordValue::Distance(distance),
        }
    }

    pub fn is_movement(&self) -> bool {
        &*self.code == MOVEMENT_CODE
    }

    /// Selection applied to every flushed batch. Only movement aggregates and records with a zero
    /// value reach the store; key records with any other value are dropped.
    pub fn is_persisted(&self) -> bool {
        self.is_movement() || self.value.is_zero()
    }

    /// Text representation of the `time` column.
    pub fn time_column(&self) -> String {
        format_record_time(self.moment)
    }
}

/// A row as it's read back from the store. Every column is text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub time: String,
    pub app_name: String,
    pub code: String,
    pub scancode: String,
    pub value: String,
}
