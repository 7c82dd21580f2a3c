use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "warn,ledger_service=info";

/// Install the global fmt subscriber. `RUST_LOG` overrides the defaults.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
