use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a console `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `fallback_level` (e.g. "info") is used.
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(fallback_level: &str) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .is_ok()
}
