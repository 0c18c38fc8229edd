//! Logging setup for the CLI.
//!
//! Stdout only. `RUST_LOG` takes precedence; otherwise `DEBUG_LOGGING=1`
//! raises the cadence crates to debug.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "warn,cadence_cli=info";
const DEBUG_FILTER: &str = "info,cadence_core=debug,cadence_cli=debug";

pub fn init() {
    let debug_logging = std::env::var("DEBUG_LOGGING").is_ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug_logging {
            DEBUG_FILTER
        } else {
            DEFAULT_FILTER
        })
    });

    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(filter)
        .init();

    tracing::debug!(debug_logging, "logging initialized");
}
