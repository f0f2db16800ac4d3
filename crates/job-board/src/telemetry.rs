use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Noisy dependency targets held at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: [&str; 2] = ["hyper=warn", "tower_http=warn"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Build the filter for a configured level such as `info` or `job_board=debug`.
pub fn filter_for(log_level: &str) -> Result<EnvFilter, TelemetryError> {
    let directives = std::iter::once(log_level.trim())
        .chain(QUIET_TARGETS)
        .collect::<Vec<_>>()
        .join(",");
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: log_level.to_string(),
        source,
    })
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_for(&config.log_level)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_and_target_directives_are_accepted() {
        assert!(filter_for("info").is_ok());
        assert!(filter_for(" job_board=debug ").is_ok());
    }

    #[test]
    fn malformed_level_reports_the_configured_value() {
        match filter_for("job_board=loud") {
            Err(TelemetryError::EnvFilter { value, .. }) => assert_eq!(value, "job_board=loud"),
            other => panic!("expected filter error, got {other:?}"),
        }
    }
}
