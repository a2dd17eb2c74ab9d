//! Feature alignment.
//!
//! Maps a flow of either origin onto the training layout. Replayed rows
//! already carry the schema columns and only need selection; live flows go
//! through the NFStream name table plus the derived-feature formulas.
//! Anything neither path recognizes is 0.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::logic::flow::FlowRecord;

use super::{FeatureVector, FEATURE_LAYOUT};

/// Dataset feature name -> NFStream attribute name, for the names with a
/// 1-to-1 counterpart. The rest are derived below.
static NFSTREAM_MAPPED: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Destination Port", "dst_port"),
        ("Flow Duration", "bidirectional_duration_ms"),
        ("Total Fwd Packets", "src2dst_packets"),
        ("Total Backward Packets", "dst2src_packets"),
        ("Total Length of Fwd Packets", "src2dst_bytes"),
        ("Total Length of Bwd Packets", "dst2src_bytes"),
        ("Fwd Packet Length Max", "src2dst_max_ps"),
        ("Fwd Packet Length Min", "src2dst_min_ps"),
        ("Fwd Packet Length Mean", "src2dst_mean_ps"),
        ("Fwd Packet Length Std", "src2dst_stddev_ps"),
        ("Bwd Packet Length Max", "dst2src_max_ps"),
        ("Bwd Packet Length Min", "dst2src_min_ps"),
        ("Bwd Packet Length Mean", "dst2src_mean_ps"),
        ("Bwd Packet Length Std", "dst2src_stddev_ps"),
        ("Flow IAT Mean", "bidirectional_mean_piat_ms"),
        ("Flow IAT Std", "bidirectional_stddev_piat_ms"),
        ("Flow IAT Max", "bidirectional_max_piat_ms"),
        ("Flow IAT Min", "bidirectional_min_piat_ms"),
        ("Fwd IAT Mean", "src2dst_mean_piat_ms"),
        ("Fwd IAT Std", "src2dst_stddev_piat_ms"),
        ("Fwd IAT Max", "src2dst_max_piat_ms"),
        ("Fwd IAT Min", "src2dst_min_piat_ms"),
        ("Bwd IAT Mean", "dst2src_mean_piat_ms"),
        ("Bwd IAT Std", "dst2src_stddev_piat_ms"),
        ("Bwd IAT Max", "dst2src_max_piat_ms"),
        ("Bwd IAT Min", "dst2src_min_piat_ms"),
        ("Fwd PSH Flags", "src2dst_psh_packets"),
        ("Fwd URG Flags", "src2dst_urg_packets"),
        ("Fwd Header Length", "src2dst_header_bytes"),
        ("Bwd Header Length", "dst2src_header_bytes"),
        ("Min Packet Length", "bidirectional_min_ps"),
        ("Max Packet Length", "bidirectional_max_ps"),
        ("Packet Length Mean", "bidirectional_mean_ps"),
        ("Packet Length Std", "bidirectional_stddev_ps"),
        ("FIN Flag Count", "bidirectional_fin_packets"),
        ("SYN Flag Count", "bidirectional_syn_packets"),
        ("RST Flag Count", "bidirectional_rst_packets"),
        ("PSH Flag Count", "bidirectional_psh_packets"),
        ("ACK Flag Count", "bidirectional_ack_packets"),
        ("URG Flag Count", "bidirectional_urg_packets"),
        ("Fwd Header Length.1", "src2dst_header_bytes"),
        ("Subflow Fwd Packets", "src2dst_packets"),
        ("Subflow Fwd Bytes", "src2dst_bytes"),
        ("Subflow Bwd Packets", "dst2src_packets"),
        ("Subflow Bwd Bytes", "dst2src_bytes"),
    ])
});

/// Align a flow to the training layout. Total and side-effect-free: every
/// layout name receives a value, identical input yields identical output.
pub fn align(flow: &dyn FlowRecord) -> FeatureVector {
    // Replayed rows carry the schema columns directly.
    if flow.has("Flow Duration") {
        return align_dataset(flow);
    }
    align_live(flow)
}

/// Column selection for records already in the target schema.
fn align_dataset(flow: &dyn FlowRecord) -> FeatureVector {
    let mut vector = FeatureVector::zeroed();
    for (index, name) in FEATURE_LAYOUT.iter().enumerate() {
        vector.set_index(index, flow.metric(name));
    }
    vector
}

/// Name translation + derived statistics for live-capture records.
fn align_live(flow: &dyn FlowRecord) -> FeatureVector {
    let g = |attr: &str| flow.metric(attr);

    let mut vector = FeatureVector::zeroed();
    for (index, name) in FEATURE_LAYOUT.iter().enumerate() {
        let value = if let Some(source) = NFSTREAM_MAPPED.get(name) {
            g(source)
        } else {
            match *name {
                "Flow Bytes/s" => {
                    g("bidirectional_bytes") / or_one(g("bidirectional_duration_ms")) * 1000.0
                }
                "Flow Packets/s" => {
                    g("bidirectional_packets") / or_one(g("bidirectional_duration_ms")) * 1000.0
                }
                "Fwd IAT Total" => (g("src2dst_packets") - 1.0) * g("src2dst_mean_piat_ms"),
                "Bwd IAT Total" => (g("dst2src_packets") - 1.0) * g("dst2src_mean_piat_ms"),
                "Fwd Packets/s" => {
                    g("src2dst_packets") / or_one(g("bidirectional_duration_ms")) * 1000.0
                }
                "Bwd Packets/s" => {
                    g("dst2src_packets") / or_one(g("bidirectional_duration_ms")) * 1000.0
                }
                "Packet Length Variance" => {
                    g("bidirectional_stddev_ps") * g("bidirectional_stddev_ps")
                }
                "Down/Up Ratio" => g("dst2src_packets") / or_one(g("src2dst_packets")),
                "Average Packet Size" => {
                    g("bidirectional_bytes") / or_one(g("bidirectional_packets"))
                }
                "Avg Fwd Segment Size" => g("src2dst_bytes") / or_one(g("src2dst_packets")),
                "Avg Bwd Segment Size" => g("dst2src_bytes") / or_one(g("dst2src_packets")),
                // No source counterpart and no formula
                _ => 0.0,
            }
        };
        vector.set_index(index, value);
    }
    vector
}

/// Reproduced divide-by-zero guard from the training pipeline: a zero
/// denominator is treated as 1, producing a finite value instead of
/// signaling an undefined rate. The trained models saw data built this way.
fn or_one(value: f64) -> f64 {
    if value == 0.0 {
        1.0
    } else {
        value
    }
}
