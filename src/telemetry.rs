//! Tracing setup for the badge service.
//!
//! LOG_LEVEL takes EnvFilter directives; LOG_FORMAT picks `LogFormat`. Award and
//! evaluation events use the `badges` target, startup and request failures use
//! `eduguardian_backend`.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,badges=debug,eduguardian_backend=debug,tower_http=info,axum=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

impl LogFormat {
    /// Anything other than a case-insensitive "json" falls back to `Pretty`.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn filter_from_env() -> EnvFilter {
    EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let format = LogFormat::parse(std::env::var("LOG_FORMAT").ok().as_deref());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter_from_env())
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
    tracing::debug!(target: "eduguardian_backend", ?format, "Tracing initialized");
}
