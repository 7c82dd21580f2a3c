use serde::{Deserialize, Serialize};
use time::Date;

use super::{BillCategory, BillStatus};

/// Canonical apartment key: trimmed and upper-cased.
pub fn normalize_apartment_id(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// One row of the row-model store: the payment state of an apartment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Stored as written; compare through [`PaymentRecord::key`].
    pub apartment_id: String,
    pub resident_name: String,
    pub maintenance: BillStatus,
    pub water: BillStatus,
}

impl PaymentRecord {
    /// Record for an apartment's first submission: `category` paid on `date`,
    /// the other category unpaid with no date.
    pub fn first_payment(apartment_id: &str, resident_name: &str, category: BillCategory, date: Date) -> Self {
        let mut record = Self {
            apartment_id: normalize_apartment_id(apartment_id),
            resident_name: resident_name.trim().to_string(),
            maintenance: BillStatus::unpaid(),
            water: BillStatus::unpaid(),
        };
        *record.status_mut(category) = BillStatus::paid_on(date);
        record
    }

    pub fn key(&self) -> String {
        normalize_apartment_id(&self.apartment_id)
    }

    pub fn matches(&self, apartment_id: &str) -> bool {
        self.key() == normalize_apartment_id(apartment_id)
    }

    pub fn status(&self, category: BillCategory) -> &BillStatus {
        match category {
            BillCategory::Maintenance => &self.maintenance,
            BillCategory::Water => &self.water,
        }
    }

    pub fn status_mut(&mut self, category: BillCategory) -> &mut BillStatus {
        match category {
            BillCategory::Maintenance => &mut self.maintenance,
            BillCategory::Water => &mut self.water,
        }
    }
}
