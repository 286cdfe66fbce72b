use tracing_subscriber::{fmt, EnvFilter};

/// Logging setup shared by the CLI and any host embedding the
/// toolchain. Always writes to stderr so stdout stays available for
/// piped build output and JSON-RPC traffic.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Used when `RUST_LOG` is unset.
    pub default_filter: String,
    pub json: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self { default_filter: "info".to_string(), json: false }
    }
}

/// Installs the global `tracing` subscriber. Safe to call more than
/// once (e.g. across tests); later calls are no-ops.
pub fn init(opts: &LoggingOptions) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(opts.default_filter.clone()));
    if opts.json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
