use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "immigration_etl=info,common=info";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json_logs: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json_layer = json_logs.then(|| fmt::layer().json().with_current_span(false));
    let text_layer = (!json_logs).then(|| fmt::layer().with_target(false));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
