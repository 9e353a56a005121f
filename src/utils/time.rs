use chrono::{DateTime, Local, NaiveDateTime, ParseResult};

/// Layout of the `time` column. Existing stores use day-first local time with microseconds
/// separated by a colon, so this has to stay exactly as is.
pub const RECORD_TIME_FORMAT: &str = "%d/%m/%Y, %H:%M:%S:%6f";

/// This is the standard way of converting a moment to a string in kbdcounter.
pub fn format_record_time(moment: DateTime<Local>) -> String {
    moment.format(RECORD_TIME_FORMAT).to_string()
}

pub fn parse_record_time(value: &str) -> ParseResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, RECORD_TIME_FORMAT)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    #[test]
    fn test_record_time_layout() {
        let naive = NaiveDate::from_ymd_opt(2018, 7, 4)
            .unwrap()
            .and_hms_micro_opt(9, 5, 3, 42)
            .unwrap();
        let moment = Local.from_local_datetime(&naive).single().unwrap();

        assert_eq!(format_record_time(moment), "04/07/2018, 09:05:03:000042");
    }

    #[test]
    fn test_record_time_parses_back() {
        let parsed = parse_record_time("31/12/2024, 23:59:59:999999").unwrap();
        assert_eq!(
            parsed,
            NaiveDate::from_ymd_opt(2024, 12, 31)
                .unwrap()
                .and_hms_micro_opt(23, 59, 59, 999_999)
                .unwrap()
        );
    }

    #[test]
    fn test_record_time_rejects_iso() {
        assert!(parse_record_time("2024-12-31T23:59:59").is_err());
    }
}
