use anyhow::{bail, Result};
use ledger_client::domain::BillCategory;
use ledger_service::{config::AppConfig, observability, service::PaymentLedger, store::ConfiguredStore};
use std::{env, io};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: unpaid_report <maintenance|water>");
    }
    let category: BillCategory = args[1].parse()?;

    // Same config file as the server (LEDGER_CONFIG).
    let cfg = AppConfig::load()?;
    let ledger = PaymentLedger::new(
        ConfiguredStore::from_config(&cfg.store),
        cfg.policy.clone(),
        cfg.building.clone(),
    );

    let unpaid = ledger.unpaid_flats(category).await?;

    let mut wtr = csv::Writer::from_writer(io::stdout().lock());
    wtr.write_record(["Apartment", "Floor", "Name", "Has Record"])?;
    for flat in &unpaid {
        wtr.write_record([
            flat.apartment_id.as_str(),
            flat.floor.as_deref().unwrap_or(""),
            flat.resident_name.as_str(),
            if flat.has_record { "Yes" } else { "No" },
        ])?;
    }
    wtr.flush()?;

    tracing::info!(bill = %category, unpaid = unpaid.len(), "unpaid report written");
    Ok(())
}
