//! # Logging
//!
//! tracing subscriber setup: `RUST_LOG` wins, then the configured filter,
//! then `exprctx=info` (`debug` with `--verbose`).

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive.
#[must_use]
pub fn default_directive(config: &LoggingConfig, verbose: bool) -> String {
    match (&config.filter, verbose) {
        (_, true) => "exprctx=debug,exprctx_core=debug".to_string(),
        (Some(filter), false) => filter.clone(),
        (None, false) => "exprctx=info,exprctx_core=info".to_string(),
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays parseable.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config, verbose).into());

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_overrides_configured_filter() {
        let config = LoggingConfig {
            format: LogFormat::Text,
            filter: Some("exprctx=warn".to_string()),
        };
        assert_eq!(default_directive(&config, false), "exprctx=warn");
        assert!(default_directive(&config, true).contains("exprctx=debug"));
        assert!(default_directive(&LoggingConfig::default(), false).contains("exprctx=info"));
    }
}
