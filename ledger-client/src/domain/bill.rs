use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::Date;

use super::{format_iso_date, parse_iso_date, DomainError};

/// The bills a resident can mark as paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillCategory {
    Maintenance,
    Water,
}

impl BillCategory {
    pub const ALL: [BillCategory; 2] = [BillCategory::Maintenance, BillCategory::Water];

    pub fn label(self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::Water => "Water",
        }
    }

    /// Free-text payment type written to the event log.
    pub fn event_label(self) -> &'static str {
        match self {
            Self::Maintenance => "Maintenance",
            Self::Water => "Water Bill",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Maintenance => Self::Water,
            Self::Water => Self::Maintenance,
        }
    }
}

impl fmt::Display for BillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the category names used by both store layouts ("Water Bill",
/// "Maintenance Paid", ...) case-insensitively.
impl FromStr for BillCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "maintenance" | "maintenance paid" => Ok(Self::Maintenance),
            "water" | "water bill" | "water paid" => Ok(Self::Water),
            _ => Err(DomainError::UnknownBillCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaidFlag {
    Yes,
    #[default]
    No,
}

impl PaidFlag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }

    /// Anything other than a literal "Yes" counts as unpaid.
    pub fn from_stored(s: &str) -> Self {
        if s.trim() == "Yes" {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Paid flag and date of one bill category.
///
/// `paid_date` keeps the stored text as-is (possibly empty or malformed); it is
/// only interpreted through [`BillStatus::parsed_date`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillStatus {
    pub paid: PaidFlag,
    pub paid_date: String,
}

impl BillStatus {
    pub fn unpaid() -> Self {
        Self::default()
    }

    pub fn paid_on(date: Date) -> Self {
        Self {
            paid: PaidFlag::Yes,
            paid_date: format_iso_date(date),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.paid == PaidFlag::Yes
    }

    pub fn parsed_date(&self) -> Option<Date> {
        parse_iso_date(&self.paid_date)
    }

    /// True when a date is stored but cannot be read as `YYYY-MM-DD`.
    pub fn has_malformed_date(&self) -> bool {
        !self.paid_date.trim().is_empty() && self.parsed_date().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn bill_category_parses_labels_from_both_layouts() {
        assert_eq!("maintenance".parse::<BillCategory>(), Ok(BillCategory::Maintenance));
        assert_eq!(" Water Bill ".parse::<BillCategory>(), Ok(BillCategory::Water));
        assert_eq!("Water Paid".parse::<BillCategory>(), Ok(BillCategory::Water));
        assert_eq!(
            "electricity".parse::<BillCategory>(),
            Err(DomainError::UnknownBillCategory("electricity".to_string()))
        );
    }

    #[test]
    fn paid_flag_only_accepts_literal_yes() {
        assert_eq!(PaidFlag::from_stored("Yes"), PaidFlag::Yes);
        assert_eq!(PaidFlag::from_stored("No"), PaidFlag::No);
        assert_eq!(PaidFlag::from_stored("yes"), PaidFlag::No);
        assert_eq!(PaidFlag::from_stored(""), PaidFlag::No);
    }

    #[test]
    fn bill_status_distinguishes_missing_and_malformed_dates() {
        let paid = BillStatus::paid_on(date!(2024 - 03 - 05));
        assert_eq!(paid.paid_date, "2024-03-05");
        assert_eq!(paid.parsed_date(), Some(date!(2024 - 03 - 05)));
        assert!(!paid.has_malformed_date());

        let missing = BillStatus {
            paid: PaidFlag::Yes,
            paid_date: String::new(),
        };
        assert!(missing.parsed_date().is_none());
        assert!(!missing.has_malformed_date());

        let malformed = BillStatus {
            paid: PaidFlag::Yes,
            paid_date: "not-a-date".to_string(),
        };
        assert!(malformed.has_malformed_date());
    }
}
