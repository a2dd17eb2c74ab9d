//! Flow Sources - one record contract, two origins.
//!
//! The scan loop never cares where a flow came from: both the live capture
//! engine and the CSV replay yield objects answering the same attribute
//! lookups, with `0` standing in for anything the origin does not provide.

pub mod capture;
pub mod replay;

#[cfg(test)]
mod tests;

use serde::Serialize;

/// One observed (or replayed) network flow.
///
/// Attribute lookup is total: `metric()` returns `0.0` for any name the
/// record does not carry. This uniformity is what lets a single processing
/// loop serve both origins.
pub trait FlowRecord: Send {
    /// Numeric attribute by name; `0.0` when absent or unparseable.
    fn metric(&self, name: &str) -> f64;

    /// Whether the record carries the named attribute at all.
    fn has(&self, name: &str) -> bool;

    /// Ground-truth label, present only on replayed flows.
    fn label(&self) -> Option<String>;

    /// Bidirectional packet count (used for throughput and session totals).
    fn packets(&self) -> u64;

    /// Identity subset kept in the per-flow log.
    fn descriptor(&self) -> FlowDescriptor;
}

/// 5-tuple plus volume summary, persisted with each FlowLog entry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowDescriptor {
    pub src_ip: String,
    pub dst_ip: String,
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: String,
    pub duration_ms: f64,
    pub packets: u64,
    pub bytes: u64,
}

/// Lazy sequence of flows; unbounded for live capture, finite for replay.
pub type FlowStream = Box<dyn Iterator<Item = Box<dyn FlowRecord + Send>> + Send>;
