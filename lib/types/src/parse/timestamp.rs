use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

/// Explorer timestamp, e.g. `Jan-05-2024 09:15:30 AM +UTC`.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([a-z]{3})-(\d{2})-(\d{4}) (\d{2}):(\d{2}):(\d{2}) (A|P)")
        .expect("timestamp pattern is valid")
});

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    #[error("Timestamp not found in `{0}`")]
    NotFound(String),
    #[error("Unknown month `{0}`")]
    UnknownMonth(String),
    #[error("Malformed {field} `{value}`")]
    MalformedField { field: &'static str, value: String },
}

/// Extracts the first explorer timestamp from free text and interprets it as UTC.
///
/// 12-hour clock conversion only adds 12 hours to hours below 12 with an upper-case `P`
/// marker, so `12:xx AM` is read as noon and a lower-case `pm` is left unshifted.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, TimestampError> {
    let captures = TIMESTAMP_RE
        .captures(text)
        .ok_or_else(|| TimestampError::NotFound(text.trim().to_owned()))?;
    // Every group is mandatory in the pattern.
    let group = |index: usize| captures.get(index).map_or("", |m| m.as_str());

    let month_token = group(1);
    let month = MONTHS
        .iter()
        .position(|name| *name == month_token)
        .ok_or_else(|| TimestampError::UnknownMonth(month_token.to_owned()))?
        as u32
        + 1;

    let day: u32 = parse_field("day", group(2))?;
    let year: i32 = parse_field("year", group(3))?;
    let mut hour: u32 = parse_field("hour", group(4))?;
    let minute: u32 = parse_field("minute", group(5))?;
    let second: u32 = parse_field("second", group(6))?;
    if group(7) == "P" && hour < 12 {
        hour += 12;
    }

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        TimestampError::MalformedField {
            field: "date",
            value: format!("{year:04}-{month:02}-{day:02}"),
        }
    })?;
    let datetime = date.and_hms_opt(hour, minute, second).ok_or_else(|| {
        TimestampError::MalformedField {
            field: "time",
            value: format!("{hour:02}:{minute:02}:{second:02}"),
        }
    })?;
    Ok(datetime.and_utc())
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, TimestampError> {
    value.parse().map_err(|_| TimestampError::MalformedField {
        field,
        value: value.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(rfc3339: &str) -> i64 {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn morning_and_afternoon() {
        assert_eq!(
            parse_timestamp("Jan-05-2024 09:15:30 AM").unwrap().timestamp_millis(),
            millis("2024-01-05T09:15:30Z")
        );
        assert_eq!(
            parse_timestamp("Jan-05-2024 09:15:30 PM").unwrap().timestamp_millis(),
            millis("2024-01-05T21:15:30Z")
        );
    }

    #[test]
    fn finds_timestamp_in_surrounding_text() {
        let text = "\n  2 hrs ago (Nov-23-2023 11:02:47 PM +UTC)\n";
        assert_eq!(
            parse_timestamp(text).unwrap().timestamp_millis(),
            millis("2023-11-23T23:02:47Z")
        );
        // Only an upper-case marker shifts to the afternoon.
        assert_eq!(
            parse_timestamp("Mar-01-2024 01:00:00 pm").unwrap().timestamp_millis(),
            millis("2024-03-01T01:00:00Z")
        );
    }

    #[test]
    fn noon_and_midnight_are_not_special_cased() {
        assert_eq!(
            parse_timestamp("Jan-05-2024 12:00:00 PM").unwrap().timestamp_millis(),
            millis("2024-01-05T12:00:00Z")
        );
        assert_eq!(
            parse_timestamp("Jan-05-2024 12:00:00 AM").unwrap().timestamp_millis(),
            millis("2024-01-05T12:00:00Z")
        );
    }

    #[test]
    fn errors() {
        assert!(matches!(
            parse_timestamp("no timestamp here"),
            Err(TimestampError::NotFound(_))
        ));
        assert_eq!(
            parse_timestamp("Foo-05-2024 09:15:30 AM"),
            Err(TimestampError::UnknownMonth("Foo".to_owned()))
        );
        assert_eq!(
            parse_timestamp("JAN-05-2024 09:15:30 AM"),
            Err(TimestampError::UnknownMonth("JAN".to_owned()))
        );
        assert!(matches!(
            parse_timestamp("Feb-30-2024 09:15:30 AM"),
            Err(TimestampError::MalformedField { field: "date", .. })
        ));
        assert!(matches!(
            parse_timestamp("Feb-10-2024 09:75:30 AM"),
            Err(TimestampError::MalformedField { field: "time", .. })
        ));
    }
}
