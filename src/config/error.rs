//! Configuration errors
//!
//! Every variant is raised before a browser is launched, so a bad value
//! never costs a partial run.

use crate::catalog::CatalogError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}: '{value}' is not a boolean (use true/false/1/0/yes/no/on/off)")]
    InvalidBool { key: String, value: String },

    #[error("{key}: '{value}' is not a valid number")]
    InvalidNumber { key: String, value: String },

    #[error("{key}: {value} is out of range ({min}..={max})")]
    OutOfRange {
        key: String,
        value: String,
        min: String,
        max: String,
    },

    #[error(transparent)]
    Category(#[from] CatalogError),

    #[error("{key} is required when {because}")]
    MissingCompanion { key: String, because: String },

    #[error("LOG_LEVEL: unknown level '{0}' (use trace/debug/info/warn/error)")]
    UnknownLogLevel(String),

    #[error("IMAGE_FILTER_BACKEND: unknown backend '{0}' (use keyword-only/http/command)")]
    UnknownBackend(String),

    #[error("{key}: '{value}' is not a valid URL: {reason}")]
    InvalidUrl {
        key: String,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(
        key: &str,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        Self::OutOfRange {
            key: key.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    pub(crate) fn missing(key: &str, because: &str) -> Self {
        Self::MissingCompanion {
            key: key.to_string(),
            because: because.to_string(),
        }
    }
}
