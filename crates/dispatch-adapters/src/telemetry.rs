use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` overrides `default_filter`.
/// Log lines go to stderr so they never mix with shell output on stdout.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
