//! Directory resolution for model artifacts and session logs.
//!
//! The Electron shell passes the log directory through `IDS_LOG_DIR`;
//! everything falls back to sensible local defaults so the binary also runs
//! standalone.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding scaler.json, label_map.json and the .onnx models.
    pub models_dir: PathBuf,
    /// Directory receiving one JSON file per scan session.
    pub log_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let models_dir = std::env::var("IDS_MODELS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("models"));

        let log_dir = std::env::var("IDS_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                dirs::data_local_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("ids-core")
                    .join("logs")
            });

        Self {
            models_dir,
            log_dir,
        }
    }
}
