//! # Configuration
//!
//! TOML configuration for the exprctx binary.
//!
//! ```toml
//! [expression]
//! use_dependant_release_branch_for_mrcm = true
//! maximum_postcoordination_level = 3
//! display_terms_required = "fsn_and_pt"
//!
//! [logging]
//! format = "json"
//! filter = "exprctx=debug"
//! ```
//!
//! Precedence: built-in defaults, then the file, then `EXPRCTX_LOG_FORMAT`
//! for the log format, then command line flags.

use crate::CliError;
use exprctx_core::ExpressionConfig;
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, read only when present.
pub const DEFAULT_CONFIG_FILE: &str = "exprctx.toml";

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Parse the `EXPRCTX_LOG_FORMAT` value; anything but `json` is text.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: Option<String>,
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub expression: ExpressionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse configuration text.
    pub fn from_toml(text: &str) -> Result<Self, CliError> {
        toml::from_str(text).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `exprctx.toml` in the current
    /// directory is read if present, otherwise defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let metadata = std::fs::metadata(path).map_err(|e| {
            CliError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(CliError::Config(format!(
                "Config file size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            CliError::Io(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Apply `EXPRCTX_LOG_FORMAT` if set.
    #[must_use]
    pub fn with_env_log_format(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value {
            self.logging.format = LogFormat::from_env_value(value);
        }
        self
    }
}
