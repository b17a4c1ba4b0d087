use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEVELOPMENT_FILTER: &str = "relay_agent=debug,relay_engine=debug";
const PRODUCTION_FILTER: &str = "info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for a terminal.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// `Json` when `APP_ENV` is `production`, `Pretty` otherwise.
    pub fn from_app_env(app_env: Option<&str>) -> Self {
        match app_env {
            Some("production") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    fn default_filter(self) -> &'static str {
        match self {
            LogFormat::Pretty => DEVELOPMENT_FILTER,
            LogFormat::Json => PRODUCTION_FILTER,
        }
    }
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// format's default filter.
pub fn setup_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| format.default_filter().into());

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => subscriber.with(fmt::layer().json()).init(),
        LogFormat::Pretty => subscriber.with(fmt::layer()).init(),
    }
}
