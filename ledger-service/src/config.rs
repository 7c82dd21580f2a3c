use ledger_client::domain::BuildingLayout;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use time::UtcOffset;

use crate::ledger::LedgerPolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// One row per apartment (`Apartment, Name, Maintenance Paid, ...`).
    CsvRows,
    /// Append-only log (`Flat Number, Payment Type, Status, Month, Payment Date`).
    CsvEvents,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub kind: StoreKind,
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("payments.csv")
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    pub bind_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Offset of the building's local time; billing periods follow local dates.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub http: HttpConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub policy: LedgerPolicy,
    #[serde(default)]
    pub building: BuildingLayout,
    pub metrics: Option<MetricsConfig>,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        let path = env::var("LEDGER_CONFIG").unwrap_or_else(|_| "ledger-config.toml".to_string());
        let contents = fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read config file '{path}': {e}"))?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn utc_offset(&self) -> anyhow::Result<UtcOffset> {
        UtcOffset::from_whole_seconds(self.utc_offset_minutes.saturating_mul(60))
            .map_err(|e| anyhow::anyhow!("invalid utc_offset_minutes {}: {e}", self.utc_offset_minutes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{MalformedDatePolicy, NamePolicy};

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [http]
            bind_addr = "127.0.0.1:8080"

            [store]
            kind = "csv_rows"
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.store.kind, StoreKind::CsvRows);
        assert_eq!(cfg.store.path, PathBuf::from("payments.csv"));
        assert_eq!(cfg.policy, LedgerPolicy::default());
        assert!(cfg.policy.require_name);
        assert_eq!(cfg.building.flats().count(), 25);
        assert!(cfg.metrics.is_none());
        assert_eq!(cfg.utc_offset().expect("offset"), UtcOffset::UTC);
    }

    #[test]
    fn full_config_overrides_policy_and_layout() {
        let cfg = AppConfig::from_toml_str(
            r#"
            utc_offset_minutes = 330

            [http]
            bind_addr = "0.0.0.0:8080"

            [store]
            kind = "csv_events"
            path = "/var/lib/ledger/events.csv"

            [policy]
            malformed_date = "fail_closed"
            name = "keep_first"
            require_name = false

            [[building.floors]]
            name = "Ground"
            flats = ["G1", "G2"]

            [metrics]
            bind_addr = "127.0.0.1:9100"
            "#,
        )
        .expect("parse");

        assert_eq!(cfg.store.kind, StoreKind::CsvEvents);
        assert_eq!(cfg.policy.malformed_date, MalformedDatePolicy::FailClosed);
        assert_eq!(cfg.policy.name, NamePolicy::KeepFirst);
        assert!(!cfg.policy.require_name);
        assert_eq!(cfg.building.flats().collect::<Vec<_>>(), vec!["G1", "G2"]);
        assert_eq!(cfg.utc_offset().expect("offset").whole_minutes(), 330);
        assert_eq!(cfg.metrics.map(|m| m.bind_addr).as_deref(), Some("127.0.0.1:9100"));
    }

    #[test]
    fn unknown_store_kind_is_rejected() {
        let res = AppConfig::from_toml_str(
            r#"
            [http]
            bind_addr = "127.0.0.1:8080"

            [store]
            kind = "google_sheets"
            "#,
        );
        assert!(res.is_err());
    }
}
