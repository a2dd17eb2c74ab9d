//! Error taxonomy for the scan pipeline.
//!
//! Only `PerFlow` is recoverable: the worker reports it and moves to the
//! next record. The other three abort the session before the flow loop
//! starts (the terminal status events are still emitted).

use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Debug, Error)]
pub enum ScanError {
    /// Missing/invalid interface, csv path, or unknown mode.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed or schema-incomplete replay source.
    #[error("data error: {0}")]
    Data(String),

    /// Scaler/classifier/label artifact failed to load.
    #[error("failed to load models: {0}")]
    ResourceLoad(String),

    /// Alignment, preprocessing, or inference failure on a single record.
    #[error("{0}")]
    PerFlow(String),
}

