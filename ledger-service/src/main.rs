use std::sync::Arc;

use anyhow::Result;
use ledger_service::{
    config::AppConfig,
    http, metrics_server, observability,
    service::{Clock, PaymentLedger},
    store::ConfiguredStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let clock = Clock::system(cfg.utc_offset()?);
    let store = ConfiguredStore::from_config(&cfg.store);
    tracing::info!(
        kind = ?cfg.store.kind,
        path = %cfg.store.path.display(),
        malformed_date = ?cfg.policy.malformed_date,
        name_policy = ?cfg.policy.name,
        "payment store configured"
    );

    let ledger = Arc::new(PaymentLedger::new(store, cfg.policy.clone(), cfg.building.clone()));
    http::serve(&cfg.http.bind_addr, http::router(ledger, clock)).await
}
