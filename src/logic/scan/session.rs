//! Per-session state and summary statistics.
//!
//! A `ScanSession` is owned exclusively by the worker task; nothing here
//! needs a lock. The only cross-task structures are the running flag, the
//! flow-number counter, and the hardware windows, each guarded separately.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::logic::features::{layout_hash, FEATURE_VERSION};

use super::hardware::HardwareTotals;
use super::logfile::FlowLog;

/// Thread-safe monotonically increasing flow numbering, starting at 1.
/// The sequence is identical across runs given the same flow order.
pub struct FlowCounter {
    next: Mutex<u64>,
}

impl FlowCounter {
    pub fn new() -> Self {
        Self {
            next: Mutex::new(1),
        }
    }

    pub fn next(&self) -> u64 {
        let mut guard = self.next.lock();
        let number = *guard;
        *guard += 1;
        number
    }
}

/// Mutable state of one active scan.
pub struct ScanSession {
    pub session_id: String,
    pub mode: String,
    pub model: String,
    pub started_at: DateTime<Utc>,
    pub last_flow_at: Option<DateTime<Utc>>,
    pub flow_count: u64,
    pub packet_count: u64,
    pub latency_sum_secs: f64,
    pub correct_predictions: u64,
    pub total_predictions: u64,
    pub logs: Vec<FlowLog>,
}

impl ScanSession {
    pub fn new(mode: &str, model: &str) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            mode: mode.to_string(),
            model: model.to_string(),
            started_at: Utc::now(),
            last_flow_at: None,
            flow_count: 0,
            packet_count: 0,
            latency_sum_secs: 0.0,
            correct_predictions: 0,
            total_predictions: 0,
            logs: Vec::new(),
        }
    }

    /// Fold one labeled prediction into the accuracy counters and return
    /// the running accuracy percentage. Unlabeled records never reach this.
    pub fn record_prediction(&mut self, true_label: &str, predicted: &str) -> f64 {
        self.total_predictions += 1;
        if true_label == predicted {
            self.correct_predictions += 1;
        }
        self.accuracy().unwrap_or(0.0)
    }

    pub fn accuracy(&self) -> Option<f64> {
        if self.total_predictions == 0 {
            return None;
        }
        Some(self.correct_predictions as f64 / self.total_predictions as f64 * 100.0)
    }

    pub fn summary(&self, hardware: HardwareTotals, ended_at: DateTime<Utc>) -> ScanSummary {
        let duration_secs =
            (ended_at - self.started_at).num_milliseconds().max(0) as f64 / 1000.0;
        let avg_throughput = if duration_secs > 0.0 {
            self.packet_count as f64 / duration_secs
        } else {
            0.0
        };
        let avg_inference_latency = if self.flow_count > 0 {
            self.latency_sum_secs / self.flow_count as f64
        } else {
            0.0
        };

        let replay = self.mode == "replay";
        ScanSummary {
            session_id: self.session_id.clone(),
            mode: self.mode.clone(),
            model: self.model.clone(),
            feature_version: FEATURE_VERSION,
            feature_layout_hash: layout_hash(),
            started_at: self.started_at,
            last_flow_at: self.last_flow_at,
            ended_at,
            duration_secs,
            total_flows: self.flow_count,
            total_packets: self.packet_count,
            avg_throughput,
            avg_inference_latency,
            cpu_avg_percent: hardware.cpu_avg,
            cpu_peak_percent: hardware.cpu_peak,
            memory_avg_percent: hardware.memory_avg,
            memory_peak_percent: hardware.memory_peak,
            correct_predictions: replay.then_some(self.correct_predictions),
            total_predictions: replay.then_some(self.total_predictions),
            accuracy: self.accuracy(),
        }
    }
}

/// Session totals, emitted as the `scan_summary` payload and persisted as
/// the session file's `scan_metadata`.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub session_id: String,
    pub mode: String,
    pub model: String,
    pub feature_version: u8,
    pub feature_layout_hash: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_flow_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub total_flows: u64,
    pub total_packets: u64,
    pub avg_throughput: f64,
    pub avg_inference_latency: f64,
    pub cpu_avg_percent: f32,
    pub cpu_peak_percent: f32,
    pub memory_avg_percent: f32,
    pub memory_peak_percent: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_predictions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_predictions: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
}
