#![allow(dead_code)]

//! Live capture boundary.
//!
//! Packet capture and flow assembly belong to an external engine; this
//! module owns only its configuration contract, the shape of the flows it
//! hands back, and network-interface resolution.

use std::collections::HashMap;

use crate::logic::error::{ScanError, ScanResult};

use super::{FlowDescriptor, FlowRecord};

/// Settings handed to the capture engine. Defaults reproduce the collection
/// methodology of the training datasets: extended statistics on, short
/// idle/active expiry, accounting mode 1 (CICFlowMeter-compatible byte
/// accounting).
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    pub statistical_analysis: bool,
    pub idle_timeout_secs: u64,
    pub active_timeout_secs: u64,
    pub accounting_mode: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            statistical_analysis: true,
            idle_timeout_secs: 5,
            active_timeout_secs: 15,
            accounting_mode: 1,
        }
    }
}

/// External flow-assembly engine. Implementations block inside the returned
/// iterator; the sequence is unbounded and ends only when the caller stops
/// consuming it.
pub trait CaptureEngine: Send + Sync {
    fn capture(
        &self,
        interface: &str,
        config: &CaptureConfig,
    ) -> ScanResult<Box<dyn Iterator<Item = LiveFlow> + Send>>;
}

/// Placeholder engine for builds without a capture backend linked in.
pub struct UnavailableCapture;

impl CaptureEngine for UnavailableCapture {
    fn capture(
        &self,
        _interface: &str,
        _config: &CaptureConfig,
    ) -> ScanResult<Box<dyn Iterator<Item = LiveFlow> + Send>> {
        Err(ScanError::Configuration(
            "no live capture engine is linked into this build".to_string(),
        ))
    }
}

/// One flow as assembled by the capture engine: NFStream-style named
/// statistics plus the identifying 5-tuple. No ground-truth label.
#[derive(Debug, Clone, Default)]
pub struct LiveFlow {
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: u8,
    pub attrs: HashMap<String, f64>,
}

impl FlowRecord for LiveFlow {
    fn metric(&self, name: &str) -> f64 {
        self.attrs.get(name).copied().unwrap_or(0.0)
    }

    fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    fn label(&self) -> Option<String> {
        None
    }

    fn packets(&self) -> u64 {
        self.metric("bidirectional_packets").max(0.0) as u64
    }

    fn descriptor(&self) -> FlowDescriptor {
        FlowDescriptor {
            src_ip: self.src_ip.clone(),
            dst_ip: self.dst_ip.clone(),
            src_port: self.src_port,
            dst_port: self.dst_port,
            protocol: self.protocol.to_string(),
            duration_ms: self.metric("bidirectional_duration_ms"),
            packets: self.packets(),
            bytes: self.metric("bidirectional_bytes").max(0.0) as u64,
        }
    }
}

/// Pick the capture interface: the requested one when non-empty, otherwise
/// the first interface that is up and not a loopback.
pub fn resolve_interface(requested: Option<&str>) -> ScanResult<String> {
    if let Some(name) = requested {
        if !name.is_empty() {
            return Ok(name.to_string());
        }
    }

    let detected = pnet::datalink::interfaces()
        .into_iter()
        .find(|iface| iface.is_up() && !iface.is_loopback());

    match detected {
        Some(iface) => {
            log::info!("No interface provided; auto-detected: {}", iface.name);
            Ok(iface.name)
        }
        None => Err(ScanError::Configuration(
            "no network interfaces detected and none provided".to_string(),
        )),
    }
}
