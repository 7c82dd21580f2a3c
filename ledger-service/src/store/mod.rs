pub mod csv_events;
pub mod csv_rows;
pub mod memory;

pub use csv_events::CsvEventLogStore;
pub use csv_rows::CsvRowStore;
pub use memory::MemoryStore;

use ledger_client::domain::{BillingPeriod, PaymentEvent, PaymentRecord};

use crate::{
    config::{StoreConfig, StoreKind},
    ledger::RecordUpdate,
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column '{column}' in {path}")]
    MissingColumn { column: &'static str, path: String },
    #[error("no record for apartment {0}")]
    NotFound(String),
}

/// Counts a row of a payments file that could not be read.
fn unreadable_row(e: impl Into<StoreError>) -> StoreError {
    metrics::counter!("csv_row_parse_errors_total").increment(1);
    e.into()
}

/// Read/write access to the payment records.
///
/// Implementations only move data; duplicate detection happens in
/// [`crate::ledger::decide`] before `insert` or `update` is called.
#[async_trait::async_trait]
pub trait PaymentStore: Send + Sync {
    /// All records, in the store's native order.
    async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError>;

    /// Records as a submission in `period` must see them. Row-model stores
    /// hold one date per bill, so this is the same as [`Self::records`].
    async fn records_for_period(&self, _period: BillingPeriod) -> Result<Vec<PaymentRecord>, StoreError> {
        self.records().await
    }

    /// Payment history.
    async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError>;

    async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError>;

    async fn update(&self, update: &RecordUpdate) -> Result<(), StoreError>;
}

/// The backend selected in the configuration.
pub enum ConfiguredStore {
    Rows(CsvRowStore),
    Events(CsvEventLogStore),
    Memory(MemoryStore),
}

impl ConfiguredStore {
    pub fn from_config(cfg: &StoreConfig) -> Self {
        match cfg.kind {
            StoreKind::CsvRows => Self::Rows(CsvRowStore::new(&cfg.path)),
            StoreKind::CsvEvents => Self::Events(CsvEventLogStore::new(&cfg.path)),
            StoreKind::Memory => Self::Memory(MemoryStore::default()),
        }
    }
}

#[async_trait::async_trait]
impl PaymentStore for ConfiguredStore {
    async fn records(&self) -> Result<Vec<PaymentRecord>, StoreError> {
        match self {
            Self::Rows(s) => s.records().await,
            Self::Events(s) => s.records().await,
            Self::Memory(s) => s.records().await,
        }
    }

    async fn records_for_period(&self, period: BillingPeriod) -> Result<Vec<PaymentRecord>, StoreError> {
        match self {
            Self::Rows(s) => s.records_for_period(period).await,
            Self::Events(s) => s.records_for_period(period).await,
            Self::Memory(s) => s.records_for_period(period).await,
        }
    }

    async fn events(&self) -> Result<Vec<PaymentEvent>, StoreError> {
        match self {
            Self::Rows(s) => s.events().await,
            Self::Events(s) => s.events().await,
            Self::Memory(s) => s.events().await,
        }
    }

    async fn insert(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        match self {
            Self::Rows(s) => s.insert(record).await,
            Self::Events(s) => s.insert(record).await,
            Self::Memory(s) => s.insert(record).await,
        }
    }

    async fn update(&self, update: &RecordUpdate) -> Result<(), StoreError> {
        match self {
            Self::Rows(s) => s.update(update).await,
            Self::Events(s) => s.update(update).await,
            Self::Memory(s) => s.update(update).await,
        }
    }
}
