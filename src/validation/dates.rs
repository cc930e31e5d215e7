use serde_json::Value;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, Time};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// Time suffixes accepted after a `T` or space separator.
const TIME_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[hour]:[minute]:[second].[subsecond]"),
    format_description!("[hour]:[minute]:[second]"),
    format_description!("[hour]:[minute]"),
];

/// Source of "today" for the future-date check.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Local calendar date, falling back to UTC when the offset is unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        OffsetDateTime::now_local()
            .unwrap_or_else(|_| OffsetDateTime::now_utc())
            .date()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("Missing invoice date")]
    Missing,

    #[error("Invalid date format: {0}")]
    InvalidFormat(String),

    #[error("Invoice date {0} is in the future")]
    InFuture(String),
}

/// Parse `YYYY-MM-DD` or `YYYY/MM/DD`, optionally followed by a time of day.
pub fn parse_invoice_date(raw: &str) -> Option<Date> {
    let candidate = raw.replace('/', "-");
    if let Ok(date) = Date::parse(&candidate, DATE_FORMAT) {
        return Some(date);
    }

    let (date_part, rest) = candidate.split_at_checked(10)?;
    let time_part = rest.strip_prefix(['T', ' '])?;
    let date = Date::parse(date_part, DATE_FORMAT).ok()?;

    TIME_FORMATS
        .iter()
        .any(|format| Time::parse(time_part, format).is_ok())
        .then_some(date)
}

pub fn format_date(date: Date) -> String {
    // Formatting a plain date with a date-only description cannot fail.
    date.format(DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}

/// Check the invoice date: present, parseable, and not after `today`.
pub fn check_date(invoice: &Value, today: Date) -> Result<(), DateError> {
    let raw = match invoice.get("date") {
        None | Some(Value::Null) => return Err(DateError::Missing),
        Some(Value::String(s)) if s.is_empty() => return Err(DateError::Missing),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    let date = parse_invoice_date(&raw).ok_or_else(|| DateError::InvalidFormat(raw.clone()))?;
    if date > today {
        return Err(DateError::InFuture(raw));
    }

    Ok(())
}
