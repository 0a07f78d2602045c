use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber. Host applications call this once at startup.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "agrisync=debug,info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
