//! Error types for archived-or-not
//!
//! Failure modes split into three tiers, matching the run lifecycle:
//! - validation/configuration errors, rejected before any work starts
//! - fatal run errors (enumeration faults, client construction)
//! - per-file errors, which never surface here at all; the dispatcher
//!   resolves them to a `CheckOutcome::Failed` value instead

use thiserror::Error;

/// Result type alias for archived-or-not operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for archived-or-not
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "root")
        key: Option<String>,
    },

    /// Start-parameter validation failed; the run was never started
    #[error("validation error: {0}")]
    Validation(String),

    /// Directory traversal failed (unreadable directory, broken metadata)
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Spreadsheet export failed
    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    /// Export destination error (bad directory, permission denied)
    #[error("export error: {0}")]
    Export(String),
}

impl Error {
    /// Machine-readable code for this error, used in structured log records.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::Walk(_) => "walk_error",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Spreadsheet(_) => "spreadsheet_error",
            Error::Export(_) => "export_error",
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_maps_to_expected_code() {
        let io = Error::Io(std::io::Error::other("disk fail"));
        let cases: Vec<(Error, &str)> = vec![
            (
                Error::Config {
                    message: "bad value".into(),
                    key: Some("root".into()),
                },
                "config_error",
            ),
            (
                Error::Validation("not a directory".into()),
                "validation_error",
            ),
            (io, "io_error"),
            (
                Error::Export("destination vanished".into()),
                "export_error",
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error.code(), expected);
        }
    }

    #[test]
    fn validation_display_carries_message() {
        let err = Error::Validation("'/nope' is not an existing directory".into());
        assert!(err.to_string().contains("/nope"));
    }
}
