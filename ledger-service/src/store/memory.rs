use ledger_client::{
    db::{event_queries::events_from_records, record_queries::find_by_apartment},
    domain::{PaymentEvent, PaymentRecord},
};
use tokio::sync::Mutex;

use super::{PaymentStore, StoreError};
use crate::ledger::RecordUpdate;

/// Row-model store kept in process memory.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PaymentRecord>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<PaymentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }
}

#[async_trait::async_trait]
impl PaymentStore for MemoryStore {
    async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        Ok(self.records.lock().await.clone())
    }

    async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
        Ok(events_from_records(&self.records.lock().await))
    }

    async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn update(&self, update: &RecordUpdate) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        let idx = find_by_apartment(&records, &update.apartment_id)
            .map(|(idx, _)| idx)
            .ok_or_else(|| StoreError::NotFound(update.apartment_id.clone()))?;
        update.apply_to(&mut records[idx]);
        Ok(())
    }
}
