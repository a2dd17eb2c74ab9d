//! Scan control commands.
//!
//! The two operations the transport layer is allowed to invoke. Parameters
//! arrive as raw JSON (the wire format of the excluded websocket layer) and
//! are validated here before they reach the orchestrator.

use crate::logic::scan::{ScanParams, ScanService};

/// Start a scan session. Invalid parameter shapes are rejected here;
/// semantic problems (bad path, unknown mode) are reported by the session
/// itself through `scan_error` events.
pub fn start_scan(service: &ScanService, payload: serde_json::Value) -> Result<(), String> {
    let params: ScanParams = serde_json::from_value(payload)
        .map_err(|e| format!("Invalid scan parameters: {}", e))?;
    service.start(params);
    Ok(())
}

/// Stop the active scan session. No-op when nothing is running.
pub fn stop_scan(service: &ScanService) {
    service.stop();
}
