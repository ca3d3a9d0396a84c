use crate::config::LogLevel;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn default_filter(log_level: &LogLevel) -> String {
    format!("{},reqwest=info,hyper_util=info", log_level.as_str())
}

/// JSON logs on stderr, so stdout only carries the printed results.
pub fn init_tracing(log_level: &LogLevel) {
    let log_level = default_filter(log_level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .init();
}
