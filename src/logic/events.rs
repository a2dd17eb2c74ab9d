//! Event Emitter - outbound event boundary.
//!
//! Everything the pipeline tells the outside world goes through one
//! `EventSink` handle passed to the orchestrator at construction. The real
//! transport (websocket/IPC) lives outside this crate; the binary wires a
//! sink that writes events to the process log.

use serde_json::Value;

/// Event names
pub mod names {
    pub const SCAN_STATUS: &str = "scan_status";
    pub const SCAN_ERROR: &str = "scan_error";
    pub const NETWORK_DATA: &str = "network_data";
    pub const SCAN_SUMMARY: &str = "scan_summary";
}

/// Push one event to whatever is listening. Implementations must not block
/// the scan loop for long; slow consumers should buffer on their side.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

/// Sink used by the standalone binary: events land in the process log.
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &str, payload: Value) {
        log::info!("[{}] {}", event, payload);
    }
}

/// Test sink that records every emission in order.
#[cfg(test)]
pub struct RecordingSink {
    events: parking_lot::Mutex<Vec<(String, Value)>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Vec<(String, Value)> {
        self.events.lock().clone()
    }

    pub fn of_type(&self, event: &str) -> Vec<Value> {
        self.events
            .lock()
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn emit(&self, event: &str, payload: Value) {
        self.events.lock().push((event.to_string(), payload));
    }
}
