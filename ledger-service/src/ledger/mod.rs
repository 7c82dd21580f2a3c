use ledger_client::{
    db::record_queries::find_by_apartment,
    domain::{normalize_apartment_id, BillCategory, BillingPeriod, BillStatus, PaymentRecord},
};
use serde::Deserialize;
use time::Date;

use crate::store::StoreError;

/// What to do with a stored date that is marked paid but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedDatePolicy {
    /// Treat it as "not paid this period" and accept the new payment.
    #[default]
    FailOpen,
    /// Refuse the new payment until the stored date is fixed.
    FailClosed,
}

/// Whether a later submission replaces the stored resident name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    #[default]
    Overwrite,
    KeepFirst,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerPolicy {
    #[serde(default)]
    pub malformed_date: MalformedDatePolicy,
    #[serde(default)]
    pub name: NamePolicy,
    #[serde(default = "default_require_name")]
    pub require_name: bool,
}

fn default_require_name() -> bool {
    true
}

impl Default for LedgerPolicy {
    fn default() -> Self {
        Self {
            malformed_date: MalformedDatePolicy::default(),
            name: NamePolicy::default(),
            require_name: default_require_name(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{apartment_id} has already paid the {category} bill for {period} on {paid_on}")]
    Duplicate {
        apartment_id: String,
        category: BillCategory,
        period: BillingPeriod,
        paid_on: String,
    },
    #[error("stored {category} date '{raw}' for {apartment_id} is unreadable")]
    UnverifiableDate {
        apartment_id: String,
        category: BillCategory,
        raw: String,
    },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// A resident's "mark as paid" request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub apartment_id: String,
    pub resident_name: String,
    pub category: BillCategory,
    pub submitted_on: Date,
}

impl Submission {
    /// Build a submission from untyped form input.
    pub fn parse(apartment_id: &str, resident_name: &str, bill: &str, submitted_on: Date) -> Result<Self, LedgerError> {
        let category: BillCategory = bill.parse().map_err(|e| LedgerError::Validation(format!("{e}")))?;
        Ok(Self {
            apartment_id: apartment_id.to_string(),
            resident_name: resident_name.to_string(),
            category,
            submitted_on,
        })
    }

    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::of(self.submitted_on)
    }
}

/// Fields to overwrite on an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    /// Canonical key of the record to change.
    pub apartment_id: String,
    pub category: BillCategory,
    pub paid_on: Date,
    /// `None` leaves the stored name alone.
    pub resident_name: Option<String>,
}

impl RecordUpdate {
    /// Applies the update in place. The other category is never touched.
    pub fn apply_to(&self, record: &mut PaymentRecord) {
        *record.status_mut(self.category) = BillStatus::paid_on(self.paid_on);
        if let Some(name) = &self.resident_name {
            record.resident_name = name.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    AlreadyPaid {
        apartment_id: String,
        category: BillCategory,
        period: BillingPeriod,
        paid_on: String,
    },
    UnverifiableDate {
        apartment_id: String,
        category: BillCategory,
        raw: String,
    },
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Self::AlreadyPaid { .. } => "already_paid",
            Self::UnverifiableDate { .. } => "unverifiable_date",
        }
    }
}

impl From<Rejection> for LedgerError {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::AlreadyPaid {
                apartment_id,
                category,
                period,
                paid_on,
            } => LedgerError::Duplicate {
                apartment_id,
                category,
                period,
                paid_on,
            },
            Rejection::UnverifiableDate {
                apartment_id,
                category,
                raw,
            } => LedgerError::UnverifiableDate {
                apartment_id,
                category,
                raw,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Reject(Rejection),
    Insert(PaymentRecord),
    Update(RecordUpdate),
}

/// Pure validation of a submission.
///
/// Rules:
/// - the apartment id must be non-empty after trimming.
/// - the resident name must be non-empty when the policy requires it.
///
/// Returns the canonical apartment key.
pub fn validate_submission(submission: &Submission, policy: &LedgerPolicy) -> Result<String, LedgerError> {
    let key = normalize_apartment_id(&submission.apartment_id);
    if key.is_empty() {
        return Err(LedgerError::Validation("apartment id must not be empty".to_string()));
    }
    if policy.require_name && submission.resident_name.trim().is_empty() {
        return Err(LedgerError::Validation("resident name must not be empty".to_string()));
    }
    Ok(key)
}

/// Decide how a submission changes the store.
///
/// A payment is a duplicate only when the stored category is marked paid with
/// a readable date inside the submission's billing period. Missing, older or
/// (under [`MalformedDatePolicy::FailOpen`]) unreadable dates lead to an update.
pub fn decide(records: &[PaymentRecord], submission: &Submission, policy: &LedgerPolicy) -> Result<Decision, LedgerError> {
    let key = validate_submission(submission, policy)?;
    let category = submission.category;
    let name = submission.resident_name.trim();

    let Some((_, existing)) = find_by_apartment(records, &key) else {
        return Ok(Decision::Insert(PaymentRecord::first_payment(
            &key,
            name,
            category,
            submission.submitted_on,
        )));
    };

    let status = existing.status(category);
    if status.is_paid() {
        let period = submission.period();
        match status.parsed_date() {
            Some(paid_on) if period.contains(paid_on) => {
                return Ok(Decision::Reject(Rejection::AlreadyPaid {
                    apartment_id: key,
                    category,
                    period,
                    paid_on: status.paid_date.trim().to_string(),
                }));
            }
            None if status.has_malformed_date() && policy.malformed_date == MalformedDatePolicy::FailClosed => {
                return Ok(Decision::Reject(Rejection::UnverifiableDate {
                    apartment_id: key,
                    category,
                    raw: status.paid_date.clone(),
                }));
            }
            _ => {}
        }
    }

    let replace_name = !name.is_empty()
        && (policy.name == NamePolicy::Overwrite || existing.resident_name.trim().is_empty());

    Ok(Decision::Update(RecordUpdate {
        apartment_id: key,
        category,
        paid_on: submission.submitted_on,
        resident_name: replace_name.then(|| name.to_string()),
    }))
}
