//! CSV replay source.
//!
//! Replays flows from CICFlowMeter-style dataset files (CIC-IDS-2017 and
//! friends) so sessions can be driven from labeled data and measured for
//! accuracy. Rows are materialized up front, like the original pandas load;
//! a `start_row`/`end_row` window keeps memory bounded when one is given.

use std::collections::HashMap;
use std::time::Duration;

use crate::logic::error::{ScanError, ScanResult};

use super::{FlowDescriptor, FlowRecord};

/// Default pacing between replayed flows.
pub const DEFAULT_DELAY_MS: u64 = 100;

/// Columns a usable dataset must carry. Header whitespace is trimmed first
/// (CIC-IDS-2017 files ship with leading spaces in column names).
pub const REQUIRED_COLUMNS: &[&str] = &[
    "Flow Duration",
    "Flow Bytes/s",
    "Flow Packets/s",
    "Total Fwd Packets",
    "Total Backward Packets",
    "Total Length of Fwd Packets",
    "Total Length of Bwd Packets",
    "Flow IAT Mean",
    "Flow IAT Std",
    "SYN Flag Count",
    "ACK Flag Count",
    "RST Flag Count",
    "FIN Flag Count",
    "Packet Length Mean",
    "Packet Length Std",
    "Min Packet Length",
    "Max Packet Length",
    "Label",
];

/// One dataset row wearing the FlowRecord contract.
#[derive(Debug, Clone)]
pub struct ReplayFlow {
    values: HashMap<String, String>,
}

impl ReplayFlow {
    fn from_row(headers: &[String], record: &csv::StringRecord) -> Self {
        let values = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.clone(), v.trim().to_string()))
            .collect();
        Self { values }
    }

    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            values: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl FlowRecord for ReplayFlow {
    fn metric(&self, name: &str) -> f64 {
        self.values
            .get(name)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.0)
    }

    fn has(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn label(&self) -> Option<String> {
        self.values
            .get("Label")
            .filter(|l| !l.is_empty())
            .cloned()
    }

    fn packets(&self) -> u64 {
        (self.metric("Total Fwd Packets") + self.metric("Total Backward Packets")).max(0.0) as u64
    }

    fn descriptor(&self) -> FlowDescriptor {
        FlowDescriptor {
            src_ip: self.values.get("Source IP").cloned().unwrap_or_default(),
            dst_ip: self
                .values
                .get("Destination IP")
                .cloned()
                .unwrap_or_default(),
            src_port: self.metric("Source Port") as u16,
            dst_port: self.metric("Destination Port") as u16,
            protocol: self.values.get("Protocol").cloned().unwrap_or_default(),
            // CICFlowMeter durations are microseconds
            duration_ms: self.metric("Flow Duration") / 1000.0,
            packets: self.packets(),
            bytes: (self.metric("Total Length of Fwd Packets")
                + self.metric("Total Length of Bwd Packets"))
            .max(0.0) as u64,
        }
    }
}

/// Finite, paced sequence of replayed flows.
#[derive(Debug)]
pub struct ReplaySource {
    flows: std::vec::IntoIter<ReplayFlow>,
    delay: Duration,
    yielded_any: bool,
}

impl ReplaySource {
    /// Load a dataset and select the rows to replay.
    ///
    /// Row indices are 0-based with an exclusive end. When both `start_row`
    /// and `end_row` are given they take precedence over `max_flows` and
    /// only that window is kept in memory.
    pub fn open(
        csv_path: &str,
        delay_ms: u64,
        max_flows: Option<usize>,
        start_row: Option<usize>,
        end_row: Option<usize>,
    ) -> ScanResult<Self> {
        log::info!("Loading CSV from: {}", csv_path);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(csv_path)
            .map_err(|e| ScanError::Data(format!("error reading CSV file {}: {}", csv_path, e)))?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| ScanError::Data(format!("error reading CSV header: {}", e)))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == *col))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(ScanError::Data(format!(
                "CSV missing required columns: {:?}",
                missing
            )));
        }

        let rows = reader.records();
        let flows: Vec<ReplayFlow> = match (start_row, end_row) {
            (Some(start), Some(end)) => {
                let take = end.saturating_sub(start);
                log::info!("Replaying row window [{}, {}) ({} flows)", start, end, take);
                rows.skip(start)
                    .take(take)
                    .filter_map(|r| r.ok())
                    .map(|r| ReplayFlow::from_row(&headers, &r))
                    .collect()
            }
            _ => {
                let all: Vec<ReplayFlow> = rows
                    .filter_map(|r| r.ok())
                    .map(|r| ReplayFlow::from_row(&headers, &r))
                    .collect();
                log::info!("Loaded {} flows from CSV", all.len());
                match max_flows {
                    Some(limit) if limit < all.len() => {
                        log::info!("Limiting replay to {} flows", limit);
                        all.into_iter().take(limit).collect()
                    }
                    _ => all,
                }
            }
        };

        Ok(Self {
            flows: flows.into_iter(),
            delay: Duration::from_millis(delay_ms),
            yielded_any: false,
        })
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }
}

impl Iterator for ReplaySource {
    type Item = ReplayFlow;

    fn next(&mut self) -> Option<ReplayFlow> {
        // Pacing sits between yields, simulating real-time flow arrival.
        if self.yielded_any && !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let flow = self.flows.next()?;
        self.yielded_any = true;
        Some(flow)
    }
}
