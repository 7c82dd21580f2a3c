use std::fmt;

use time::{macros::format_description, Date, Month};

/// Parse a stored `YYYY-MM-DD` date. Empty or malformed text yields `None`.
pub fn parse_iso_date(s: &str) -> Option<Date> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    Date::parse(trimmed, format_description!("[year]-[month]-[day]")).ok()
}

pub fn format_iso_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}

/// Calendar year + month a payment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BillingPeriod {
    year: i32,
    month: u8,
}

impl BillingPeriod {
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: u8::from(date.month()),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> Month {
        Month::try_from(self.month).unwrap_or(Month::January)
    }

    pub fn contains(&self, date: Date) -> bool {
        Self::of(date) == *self
    }

    /// Human-readable form used by the event log, e.g. "March 2024".
    pub fn label(&self) -> String {
        format!("{} {}", self.month(), self.year)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
