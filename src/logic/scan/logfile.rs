//! Per-session log persistence.
//!
//! One JSON file per session, named by the session start timestamp:
//! `{ "scan_metadata": {...}, "flows": [...] }`.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::logic::flow::FlowDescriptor;

use super::session::ScanSummary;

/// Durable record of one processed flow.
#[derive(Debug, Clone, Serialize)]
pub struct FlowLog {
    pub timestamp: DateTime<Utc>,
    pub flow_number: u64,
    pub predicted_label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Seconds of wall clock around preprocessing + inference.
    pub inference_latency: f64,
    /// Packets per second since the previous flow completed.
    pub throughput: f64,
    pub cpu_usage_percent: f32,
    pub memory_usage_percent: f32,
    pub flow: FlowDescriptor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub true_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}

/// Write the session file, creating the log directory if needed.
pub fn write_session_log(
    log_dir: &Path,
    summary: &ScanSummary,
    flows: &[FlowLog],
) -> io::Result<PathBuf> {
    std::fs::create_dir_all(log_dir)?;

    let filename = format!("scan-{}.json", summary.started_at.format("%Y-%m-%d-%H%M%S"));
    let path = log_dir.join(filename);

    let envelope = json!({
        "scan_metadata": summary,
        "flows": flows,
    });
    let content = serde_json::to_string_pretty(&envelope)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    std::fs::write(&path, content)?;

    Ok(path)
}
