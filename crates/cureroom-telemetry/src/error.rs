//! Error types for the telemetry layer.

/// Errors that can occur while exporting sensor history.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV export produced invalid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
