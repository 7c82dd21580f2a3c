pub mod config;
pub mod http;
pub mod ledger;
pub mod metrics_server;
pub mod observability;
pub mod service;
pub mod store;

pub use ledger::{decide, Decision, LedgerError, Submission};
pub use service::PaymentLedger;
