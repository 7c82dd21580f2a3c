use serde::{Deserialize, Serialize};
use time::Date;

use super::{format_iso_date, normalize_apartment_id, parse_iso_date, BillCategory, BillingPeriod};

pub const PAID_STATUS: &str = "Paid";

/// One entry of the append-only event log.
///
/// Column layout: `Flat Number, Payment Type, Status, Month, Payment Date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub flat_number: String,
    pub payment_type: String,
    pub status: String,
    /// `Month YYYY`, kept for display; duplicate checks use `payment_date`.
    pub month: String,
    pub payment_date: String,
}

impl PaymentEvent {
    pub fn paid(flat_number: &str, category: BillCategory, date: Date) -> Self {
        Self {
            flat_number: normalize_apartment_id(flat_number),
            payment_type: category.event_label().to_string(),
            status: PAID_STATUS.to_string(),
            month: BillingPeriod::of(date).label(),
            payment_date: format_iso_date(date),
        }
    }

    pub fn category(&self) -> Option<BillCategory> {
        self.payment_type.parse().ok()
    }

    pub fn is_paid(&self) -> bool {
        self.status.trim().eq_ignore_ascii_case(PAID_STATUS)
    }

    pub fn payment_day(&self) -> Option<Date> {
        parse_iso_date(&self.payment_date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn paid_event_uses_sheet_labels() {
        let ev = PaymentEvent::paid("g1", BillCategory::Water, date!(2024 - 03 - 05));
        assert_eq!(ev.flat_number, "G1");
        assert_eq!(ev.payment_type, "Water Bill");
        assert_eq!(ev.status, "Paid");
        assert_eq!(ev.month, "March 2024");
        assert_eq!(ev.payment_date, "2024-03-05");
        assert_eq!(ev.category(), Some(BillCategory::Water));
        assert!(ev.is_paid());
    }
}
