mod clock;
mod keyed_locks;

pub use clock::Clock;
pub use keyed_locks::{KeyGuard, KeyedLocks};

use ledger_client::{
    db::record_queries::{find_by_apartment, unpaid_flats, unpaid_residents, UnpaidFlat},
    domain::{normalize_apartment_id, BillCategory, BuildingLayout, PaymentEvent, PaymentRecord},
};
use serde::Serialize;

use crate::{
    ledger::{decide, Decision, LedgerError, LedgerPolicy, Submission},
    store::{PaymentStore, StoreError},
};

/// Result of an accepted submission, carrying the record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Recorded {
    Inserted(PaymentRecord),
    Updated(PaymentRecord),
}

impl Recorded {
    pub fn record(&self) -> &PaymentRecord {
        match self {
            Self::Inserted(r) | Self::Updated(r) => r,
        }
    }
}

/// Runs submissions against a store.
///
/// Each submission is one read-decide-write sequence, serialised per
/// apartment key so two concurrent payments for the same flat cannot both
/// pass the duplicate check.
pub struct PaymentLedger<S> {
    store: S,
    policy: LedgerPolicy,
    layout: BuildingLayout,
    locks: KeyedLocks,
}

impl<S: PaymentStore> PaymentLedger<S> {
    pub fn new(store: S, policy: LedgerPolicy, layout: BuildingLayout) -> Self {
        Self {
            store,
            policy,
            layout,
            locks: KeyedLocks::default(),
        }
    }

    pub fn layout(&self) -> &BuildingLayout {
        &self.layout
    }

    pub async fn submit(&self, submission: Submission) -> Result<Recorded, LedgerError> {
        let key = normalize_apartment_id(&submission.apartment_id);
        if !key.is_empty() && !self.layout.contains(&key) {
            metrics::counter!("payments_rejected_total", "reason" => "validation").increment(1);
            return Err(LedgerError::Validation(format!("unknown apartment '{key}'")));
        }

        let _guard = self.locks.lock(&key).await;
        let records = self
            .store
            .records_for_period(submission.period())
            .await
            .map_err(store_failure)?;

        let decision = match decide(&records, &submission, &self.policy) {
            Ok(d) => d,
            Err(e) => {
                metrics::counter!("payments_rejected_total", "reason" => "validation").increment(1);
                return Err(e);
            }
        };

        match decision {
            Decision::Reject(rejection) => {
                tracing::info!(
                    apartment = %key,
                    bill = %submission.category,
                    period = %submission.period(),
                    reason = rejection.reason(),
                    "payment rejected"
                );
                metrics::counter!("payments_rejected_total", "reason" => rejection.reason()).increment(1);
                Err(rejection.into())
            }
            Decision::Insert(record) => {
                self.store.insert(&record).await.map_err(store_failure)?;
                tracing::info!(apartment = %key, bill = %submission.category, "payment recorded for new apartment");
                metrics::counter!("payments_recorded_total", "outcome" => "inserted").increment(1);
                Ok(Recorded::Inserted(record))
            }
            Decision::Update(update) => {
                self.store.update(&update).await.map_err(store_failure)?;
                let mut record = find_by_apartment(&records, &key)
                    .map(|(_, r)| r.clone())
                    .ok_or_else(|| store_failure(StoreError::NotFound(key.clone())))?;
                update.apply_to(&mut record);
                tracing::info!(apartment = %key, bill = %submission.category, "payment updated");
                metrics::counter!("payments_recorded_total", "outcome" => "updated").increment(1);
                Ok(Recorded::Updated(record))
            }
        }
    }

    pub async fn records(&self) -> Result<Vec<PaymentRecord>, LedgerError> {
        self.store.records().await.map_err(store_failure)
    }

    pub async fn events(&self) -> Result<Vec<PaymentEvent>, LedgerError> {
        self.store.events().await.map_err(store_failure)
    }

    /// Records not yet marked paid for `category`, in store order.
    pub async fn unpaid(&self, category: BillCategory) -> Result<Vec<PaymentRecord>, LedgerError> {
        let records = self.records().await?;
        Ok(unpaid_residents(&records, category).into_iter().cloned().collect())
    }

    /// Unpaid records plus flats of the building that never submitted.
    pub async fn unpaid_flats(&self, category: BillCategory) -> Result<Vec<UnpaidFlat>, LedgerError> {
        let records = self.records().await?;
        Ok(unpaid_flats(&self.layout, &records, category))
    }
}

fn store_failure(e: StoreError) -> LedgerError {
    tracing::error!(error = %e, "payment store failure");
    metrics::counter!("store_errors_total").increment(1);
    LedgerError::Store(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ledger::MalformedDatePolicy,
        store::MemoryStore,
    };
    use ledger_client::domain::{BillStatus, PaidFlag};
    use std::sync::Arc;
    use time::{macros::date, Date};

    /// Gives other tasks a turn between a submission's read and its write.
    #[derive(Default)]
    struct InterleavingStore(MemoryStore);

    #[async_trait::async_trait]
    impl PaymentStore for InterleavingStore {
        async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError> {
            self.0.records().await
        }

        async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
            self.0.events().await
        }

        async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.insert(record).await
        }

        async fn update(&self, update: &crate::ledger::RecordUpdate) -> Result<(), StoreError> {
            tokio::task::yield_now().await;
            self.0.update(update).await
        }
    }

    fn ledger(records: Vec<PaymentRecord>) -> PaymentLedger<MemoryStore> {
        PaymentLedger::new(
            MemoryStore::with_records(records),
            LedgerPolicy::default(),
            BuildingLayout::default(),
        )
    }

    fn pay(apartment: &str, category: BillCategory, on: Date) -> Submission {
        Submission {
            apartment_id: apartment.to_string(),
            resident_name: "Alice".to_string(),
            category,
            submitted_on: on,
        }
    }

    #[tokio::test]
    async fn first_payment_creates_one_record() {
        let ledger = ledger(Vec::new());

        let recorded = ledger
            .submit(pay("g1", BillCategory::Maintenance, date!(2024 - 03 - 05)))
            .await
            .expect("submit");

        let expected = PaymentRecord {
            apartment_id: "G1".to_string(),
            resident_name: "Alice".to_string(),
            maintenance: BillStatus::paid_on(date!(2024 - 03 - 05)),
            water: BillStatus::unpaid(),
        };
        assert_eq!(recorded, Recorded::Inserted(expected.clone()));
        assert_eq!(ledger.records().await.expect("records"), vec![expected]);
    }

    #[tokio::test]
    async fn duplicate_in_same_period_leaves_store_unchanged() {
        let ledger = ledger(Vec::new());
        ledger
            .submit(pay("G1", BillCategory::Maintenance, date!(2024 - 03 - 05)))
            .await
            .expect("first");
        let before = ledger.records().await.expect("records");

        let res = ledger
            .submit(pay("g1 ", BillCategory::Maintenance, date!(2024 - 03 - 20)))
            .await;

        match res {
            Err(LedgerError::Duplicate { paid_on, .. }) => assert_eq!(paid_on, "2024-03-05"),
            other => panic!("expected duplicate, got {other:?}"),
        }
        assert_eq!(ledger.records().await.expect("records"), before);
    }

    #[tokio::test]
    async fn next_period_updates_and_keeps_other_category() {
        let ledger = ledger(Vec::new());
        ledger
            .submit(pay("G1", BillCategory::Water, date!(2024 - 03 - 01)))
            .await
            .expect("water");
        ledger
            .submit(pay("G1", BillCategory::Maintenance, date!(2024 - 03 - 05)))
            .await
            .expect("maintenance");

        let recorded = ledger
            .submit(pay("G1", BillCategory::Maintenance, date!(2024 - 04 - 02)))
            .await
            .expect("april");

        let Recorded::Updated(record) = recorded else {
            panic!("expected update");
        };
        assert_eq!(record.maintenance.paid_date, "2024-04-02");
        assert_eq!(record.water.paid_date, "2024-03-01");
        assert_eq!(ledger.records().await.expect("records"), vec![record]);
    }

    #[tokio::test]
    async fn malformed_stored_date_is_treated_as_unpaid() {
        let ledger = ledger(vec![PaymentRecord {
            apartment_id: "G1".to_string(),
            resident_name: "Alice".to_string(),
            maintenance: BillStatus {
                paid: PaidFlag::Yes,
                paid_date: "not-a-date".to_string(),
            },
            water: BillStatus::unpaid(),
        }]);

        let recorded = ledger
            .submit(pay("G1", BillCategory::Maintenance, date!(2024 - 04 - 02)))
            .await
            .expect("fail-open update");
        assert_eq!(recorded.record().maintenance.paid_date, "2024-04-02");
    }

    #[tokio::test]
    async fn fail_closed_policy_surfaces_unreadable_date() {
        let ledger = PaymentLedger::new(
            MemoryStore::with_records(vec![PaymentRecord {
                apartment_id: "G1".to_string(),
                resident_name: "Alice".to_string(),
                maintenance: BillStatus {
                    paid: PaidFlag::Yes,
                    paid_date: "31/03/2024".to_string(),
                },
                water: BillStatus::unpaid(),
            }]),
            LedgerPolicy {
                malformed_date: MalformedDatePolicy::FailClosed,
                ..LedgerPolicy::default()
            },
            BuildingLayout::default(),
        );

        let res = ledger
            .submit(pay("G1", BillCategory::Maintenance, date!(2024 - 04 - 02)))
            .await;
        assert!(matches!(res, Err(LedgerError::UnverifiableDate { raw, .. }) if raw == "31/03/2024"));
    }

    #[tokio::test]
    async fn apartments_outside_the_building_are_rejected() {
        let ledger = ledger(Vec::new());
        let res = ledger
            .submit(pay("999", BillCategory::Water, date!(2024 - 03 - 05)))
            .await;
        assert!(matches!(res, Err(LedgerError::Validation(_))));
        assert!(ledger.records().await.expect("records").is_empty());
    }

    #[tokio::test]
    async fn concurrent_submissions_mark_paid_once() {
        let ledger = Arc::new(PaymentLedger::new(
            InterleavingStore::default(),
            LedgerPolicy::default(),
            BuildingLayout::default(),
        ));

        let attempts = (0..8).map(|i| {
            let ledger = ledger.clone();
            let apartment = if i % 2 == 0 { "g1" } else { " G1 " };
            tokio::spawn(async move {
                ledger
                    .submit(pay(apartment, BillCategory::Water, date!(2024 - 03 - 05)))
                    .await
            })
        });
        let results = futures::future::join_all(attempts).await;

        let accepted = results
            .into_iter()
            .map(|r| r.expect("task panicked"))
            .filter(|r| r.is_ok())
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(ledger.records().await.expect("records").len(), 1);
    }

    #[tokio::test]
    async fn lock_entries_are_released_after_each_submission() {
        let ledger = PaymentLedger::new(
            MemoryStore::default(),
            LedgerPolicy::default(),
            BuildingLayout { floors: Vec::new() },
        );

        for i in 0..1000 {
            ledger
                .submit(pay(&format!("X{i}"), BillCategory::Water, date!(2024 - 03 - 05)))
                .await
                .expect("submit");
        }

        assert_eq!(ledger.records().await.expect("records").len(), 1000);
        assert!(ledger.locks.is_empty());
    }

    #[tokio::test]
    async fn unpaid_views_follow_store_order() {
        let ledger = ledger(Vec::new());
        for apartment in ["301", "G2", "101"] {
            ledger
                .submit(pay(apartment, BillCategory::Water, date!(2024 - 03 - 05)))
                .await
                .expect("submit");
        }
        ledger
            .submit(pay("G2", BillCategory::Maintenance, date!(2024 - 03 - 05)))
            .await
            .expect("submit");

        let unpaid: Vec<String> = ledger
            .unpaid(BillCategory::Maintenance)
            .await
            .expect("unpaid")
            .into_iter()
            .map(|r| r.apartment_id)
            .collect();
        assert_eq!(unpaid, vec!["301", "101"]);

        let flats = ledger.unpaid_flats(BillCategory::Maintenance).await.expect("flats");
        assert_eq!(flats.len(), 24);
        assert!(flats.iter().all(|f| f.apartment_id != "G2"));
    }
}
