use std::{
    fs::{self, File, OpenOptions},
    path::{Path, PathBuf},
};

use csv::StringRecord;
use ledger_client::{
    db::event_queries::{records_for_period, records_from_events},
    domain::{BillCategory, BillingPeriod, PaymentEvent, PaymentRecord},
};
use tokio::sync::Mutex;

use super::{unreadable_row, PaymentStore, StoreError};
use crate::ledger::RecordUpdate;

pub const EVENT_HEADERS: [&str; 5] = ["Flat Number", "Payment Type", "Status", "Month", "Payment Date"];

/// Append-only event log in the spreadsheet layout.
///
/// Every accepted submission appends one row; nothing is ever rewritten.
/// Records are derived by folding the log. Duplicate checks use
/// [`records_for_period`], which compares parsed payment dates against the
/// submission's month rather than the `Month` text.
pub struct CsvEventLogStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl CsvEventLogStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path)?;
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = rdr.headers()?.clone();

        let mut events = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(unreadable_row)?;
            events.push(row_to_event(&row, &headers, &self.path).map_err(unreadable_row)?);
        }
        Ok(events)
    }

    fn append(&self, events: &[PaymentEvent]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        let is_new = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if is_new {
            wtr.write_record(EVENT_HEADERS)?;
        }
        for ev in events {
            wtr.write_record([
                ev.flat_number.as_str(),
                ev.payment_type.as_str(),
                ev.status.as_str(),
                ev.month.as_str(),
                ev.payment_date.as_str(),
            ])?;
        }
        wtr.flush()?;
        Ok(())
    }
}

fn row_to_event(row: &StringRecord, headers: &StringRecord, path: &Path) -> Result<PaymentEvent, StoreError> {
    let get = |name: &'static str| -> Result<&str, StoreError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .map(|idx| row.get(idx).unwrap_or(""))
            .ok_or_else(|| StoreError::MissingColumn {
                column: name,
                path: path.display().to_string(),
            })
    };

    Ok(PaymentEvent {
        flat_number: get("Flat Number")?.trim().to_string(),
        payment_type: get("Payment Type")?.trim().to_string(),
        status: get("Status")?.trim().to_string(),
        month: get("Month").unwrap_or("").trim().to_string(),
        payment_date: get("Payment Date")?.trim().to_string(),
    })
}

#[async_trait::async_trait]
impl PaymentStore for CsvEventLogStore {
    async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let events = self.read_events()?;
        let records = records_from_events(&events);
        tracing::debug!(events = events.len(), flats = records.len(), "folded payment history");
        Ok(records)
    }

    async fn records_for_period(&self, period: BillingPeriod) -> Result<Vec<PaymentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        let events = self.read_events()?;
        let records = records_for_period(&events, period);
        tracing::debug!(events = events.len(), flats = records.len(), %period, "folded payment history");
        Ok(records)
    }

    async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_events()
    }

    async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let events: Vec<PaymentEvent> = BillCategory::ALL
            .into_iter()
            .filter_map(|c| {
                let day = record.status(c).parsed_date()?;
                record.status(c).is_paid().then(|| PaymentEvent::paid(&record.apartment_id, c, day))
            })
            .collect();
        self.append(&events)
    }

    async fn update(&self, update: &RecordUpdate) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.append(&[PaymentEvent::paid(&update.apartment_id, update.category, update.paid_on)])
    }
}
