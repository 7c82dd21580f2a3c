use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};

use csv::StringRecord;
use ledger_client::{
    db::{event_queries::events_from_records, record_queries::find_by_apartment},
    domain::{BillStatus, PaidFlag, PaymentEvent, PaymentRecord},
};
use tokio::sync::Mutex;

use super::{unreadable_row, PaymentStore, StoreError};
use crate::ledger::RecordUpdate;

pub const ROW_HEADERS: [&str; 6] = [
    "Apartment",
    "Name",
    "Maintenance Paid",
    "Water Paid",
    "Maintenance Date",
    "Water Date",
];

/// Row-model CSV store: one row per apartment.
///
/// Header columns (by name):
/// - Apartment
/// - Name (optional)
/// - Maintenance Paid / Water Paid ("Yes" or "No", optional)
/// - Maintenance Date / Water Date (`YYYY-MM-DD`, optional)
///
/// The file is created with only the header row when missing. Every write
/// rewrites the whole file through a temporary sibling and a rename.
pub struct CsvRowStore {
    path: PathBuf,
    // Serialises read-modify-write cycles on the file.
    lock: Mutex<()>,
}

impl CsvRowStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn ensure_file(&self) -> Result<(), StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "creating empty payments file");
            write_rows(&self.path, &[])?;
        }
        Ok(())
    }

    fn read_rows(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        // Blocking reads are fine here: the file holds one row per apartment.
        self.ensure_file()?;
        let file = File::open(&self.path)?;
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(file);
        let headers = rdr.headers()?.clone();

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.map_err(unreadable_row)?;
            records.push(row_to_record(&row, &headers, &self.path).map_err(unreadable_row)?);
        }
        Ok(records)
    }
}

fn row_to_record(row: &StringRecord, headers: &StringRecord, path: &Path) -> Result<PaymentRecord, StoreError> {
    let get = |name: &str| -> Option<&str> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| row.get(idx))
    };

    let apartment_id = get("Apartment").ok_or_else(|| StoreError::MissingColumn {
        column: "Apartment",
        path: path.display().to_string(),
    })?;

    let status = |paid_col: &str, date_col: &str| BillStatus {
        paid: PaidFlag::from_stored(get(paid_col).unwrap_or("")),
        paid_date: get(date_col).unwrap_or("").trim().to_string(),
    };

    Ok(PaymentRecord {
        apartment_id: apartment_id.trim().to_string(),
        resident_name: get("Name").unwrap_or("").trim().to_string(),
        maintenance: status("Maintenance Paid", "Maintenance Date"),
        water: status("Water Paid", "Water Date"),
    })
}

fn write_rows(path: &Path, records: &[PaymentRecord]) -> Result<(), StoreError> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = csv::Writer::from_path(&tmp)?;
        wtr.write_record(ROW_HEADERS)?;
        for r in records {
            wtr.write_record([
                r.apartment_id.as_str(),
                r.resident_name.as_str(),
                r.maintenance.paid.as_str(),
                r.water.paid.as_str(),
                r.maintenance.paid_date.as_str(),
                r.water.paid_date.as_str(),
            ])?;
        }
        wtr.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[async_trait::async_trait]
impl PaymentStore for CsvRowStore {
    async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        let _guard = self.lock.lock().await;
        self.read_rows()
    }

    async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(events_from_records(&self.read_rows()?))
    }

    async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_rows()?;
        records.push(record.clone());
        write_rows(&self.path, &records)
    }

    async fn update(&self, update: &RecordUpdate) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut records = self.read_rows()?;
        let idx = find_by_apartment(&records, &update.apartment_id)
            .map(|(idx, _)| idx)
            .ok_or_else(|| StoreError::NotFound(update.apartment_id.clone()))?;
        update.apply_to(&mut records[idx]);
        write_rows(&self.path, &records)
    }
}
