use tracing_subscriber::EnvFilter;

/// Initialize tracing with env filter support.
///
/// Set `RUST_LOG=debug` for verbose output, defaults to `info`.
/// With `json` set, events are emitted as one JSON object per line.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn log_startup() {
    tracing::info!("Doppel starting up");
}

pub fn log_shutdown() {
    tracing::info!("Doppel shutting down");
}
