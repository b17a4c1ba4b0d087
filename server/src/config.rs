use crate::logging::LogFormat;
use dotenvy::dotenv;
use relay_engine::EngineConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8889;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub log_format: LogFormat,
    /// Invalid settings that were replaced by defaults. Config is read before
    /// the subscriber exists, so the caller logs these once tracing is up.
    pub warnings: Vec<String>,
}

impl Config {
    /// Reads `.env` (if any) and the process environment. This is the only
    /// place `.env` is loaded; call it before `setup_tracing` so `APP_ENV`
    /// and `RUST_LOG` from the file take effect.
    pub fn new() -> Self {
        dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("AGENT_HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let mut warnings = Vec::new();
        let port = parse_or(&lookup, "AGENT_PORT", DEFAULT_PORT, &mut warnings);
        let timeout_secs = parse_or(
            &lookup,
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
            &mut warnings,
        );
        let log_format = LogFormat::from_app_env(lookup("APP_ENV").as_deref());

        Self {
            host,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
            log_format,
            warnings,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn public_url(&self) -> String {
        let host = match self.host.as_str() {
            "0.0.0.0" | "127.0.0.1" => "localhost",
            other => other,
        };
        format!("http://{}:{}", host, self.port)
    }

    pub fn engine(&self) -> EngineConfig {
        EngineConfig::with_timeout(self.request_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warnings.push(format!("Ignoring invalid {}={:?}, using {}", name, raw, default));
            default
        }),
        None => default,
    }
}
