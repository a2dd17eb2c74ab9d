//! Alignment engine tests.

use std::collections::HashMap;

use crate::logic::features::{align, layout_hash, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::flow::capture::LiveFlow;
use crate::logic::flow::replay::ReplayFlow;
use crate::logic::flow::FlowRecord;

fn live_flow(attrs: &[(&str, f64)]) -> LiveFlow {
    LiveFlow {
        src_ip: "10.0.0.2".to_string(),
        dst_ip: "10.0.0.9".to_string(),
        src_port: 44211,
        dst_port: 443,
        protocol: 6,
        attrs: attrs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<HashMap<_, _>>(),
    }
}

#[test]
fn test_layout_is_complete_and_stable() {
    assert_eq!(FEATURE_COUNT, 70);
    assert_eq!(FEATURE_LAYOUT.len(), FEATURE_COUNT);
    assert_eq!(layout_hash(), layout_hash());
    assert_ne!(layout_hash(), 0);
}

#[test]
fn test_dataset_rows_are_column_selected() {
    let flow = ReplayFlow::from_pairs(&[
        ("Flow Duration", "123456"),
        ("Destination Port", "80"),
        ("Total Fwd Packets", "10"),
        ("SYN Flag Count", "1"),
        ("Label", "BENIGN"),
    ]);

    let vector = align(&flow);
    assert_eq!(vector.get("Flow Duration"), Some(123456.0));
    assert_eq!(vector.get("Destination Port"), Some(80.0));
    assert_eq!(vector.get("Total Fwd Packets"), Some(10.0));
    assert_eq!(vector.get("SYN Flag Count"), Some(1.0));
    // Columns the row does not carry fall back to zero.
    assert_eq!(vector.get("Idle Max"), Some(0.0));
    assert_eq!(vector.get("Init_Win_bytes_forward"), Some(0.0));
}

#[test]
fn test_alignment_is_total_and_idempotent() {
    let flow = live_flow(&[
        ("dst_port", 443.0),
        ("bidirectional_duration_ms", 2000.0),
        ("bidirectional_bytes", 9000.0),
        ("bidirectional_packets", 30.0),
    ]);

    let first = align(&flow);
    let second = align(&flow);
    assert_eq!(first, second);

    // Every layout name is present with a finite value.
    for name in FEATURE_LAYOUT {
        let value = first.get(name).unwrap();
        assert!(value.is_finite(), "{} is not finite", name);
    }
}

#[test]
fn test_live_direct_mapping() {
    let flow = live_flow(&[
        ("dst_port", 8080.0),
        ("src2dst_packets", 12.0),
        ("dst2src_packets", 8.0),
        ("bidirectional_syn_packets", 2.0),
        ("src2dst_header_bytes", 320.0),
    ]);

    let vector = align(&flow);
    assert_eq!(vector.get("Destination Port"), Some(8080.0));
    assert_eq!(vector.get("Total Fwd Packets"), Some(12.0));
    assert_eq!(vector.get("Total Backward Packets"), Some(8.0));
    assert_eq!(vector.get("SYN Flag Count"), Some(2.0));
    // The duplicated header-length column maps to the same source.
    assert_eq!(vector.get("Fwd Header Length"), Some(320.0));
    assert_eq!(vector.get("Fwd Header Length.1"), Some(320.0));
    // Subflow aggregates reuse the per-direction totals.
    assert_eq!(vector.get("Subflow Fwd Packets"), Some(12.0));
}

#[test]
fn test_live_derived_rates() {
    let flow = live_flow(&[
        ("bidirectional_duration_ms", 2000.0),
        ("bidirectional_bytes", 9000.0),
        ("bidirectional_packets", 30.0),
        ("src2dst_packets", 20.0),
        ("dst2src_packets", 10.0),
    ]);

    let vector = align(&flow);
    // bytes / duration_ms * 1000 = bytes per second
    assert_eq!(vector.get("Flow Bytes/s"), Some(4500.0));
    assert_eq!(vector.get("Flow Packets/s"), Some(15.0));
    assert_eq!(vector.get("Fwd Packets/s"), Some(10.0));
    assert_eq!(vector.get("Bwd Packets/s"), Some(5.0));
    assert_eq!(vector.get("Down/Up Ratio"), Some(0.5));
    assert_eq!(vector.get("Average Packet Size"), Some(300.0));
}

#[test]
fn test_live_derived_iat_and_variance() {
    let flow = live_flow(&[
        ("src2dst_packets", 5.0),
        ("src2dst_mean_piat_ms", 10.0),
        ("dst2src_packets", 3.0),
        ("dst2src_mean_piat_ms", 20.0),
        ("bidirectional_stddev_ps", 4.0),
        ("src2dst_bytes", 500.0),
        ("dst2src_bytes", 90.0),
    ]);

    let vector = align(&flow);
    assert_eq!(vector.get("Fwd IAT Total"), Some(40.0));
    assert_eq!(vector.get("Bwd IAT Total"), Some(40.0));
    assert_eq!(vector.get("Packet Length Variance"), Some(16.0));
    assert_eq!(vector.get("Avg Fwd Segment Size"), Some(100.0));
    assert_eq!(vector.get("Avg Bwd Segment Size"), Some(30.0));
}

#[test]
fn test_zero_duration_yields_finite_rates() {
    // A zero-duration, zero-volume flow: every rate is 0, never inf/NaN.
    let empty = live_flow(&[("bidirectional_duration_ms", 0.0)]);
    let vector = align(&empty);
    assert_eq!(vector.get("Flow Bytes/s"), Some(0.0));
    assert_eq!(vector.get("Flow Packets/s"), Some(0.0));

    // With volume, the 0 denominator is treated as 1: finite, not inf.
    let burst = live_flow(&[
        ("bidirectional_duration_ms", 0.0),
        ("bidirectional_bytes", 500.0),
        ("bidirectional_packets", 4.0),
    ]);
    let vector = align(&burst);
    assert_eq!(vector.get("Flow Bytes/s"), Some(500_000.0));
    assert!(vector.get("Flow Packets/s").unwrap().is_finite());
}

#[test]
fn test_zero_forward_packets_down_up_ratio() {
    let flow = live_flow(&[("dst2src_packets", 7.0), ("src2dst_packets", 0.0)]);
    let vector = align(&flow);
    assert_eq!(vector.get("Down/Up Ratio"), Some(7.0));
}

#[test]
fn test_unknown_features_are_zero_for_live_flows() {
    let flow = live_flow(&[("bidirectional_packets", 10.0)]);
    let vector = align(&flow);
    // No NFStream counterpart and no formula exists for these.
    assert_eq!(vector.get("Init_Win_bytes_forward"), Some(0.0));
    assert_eq!(vector.get("Active Mean"), Some(0.0));
    assert_eq!(vector.get("CWE Flag Count"), Some(0.0));
}

#[test]
fn test_origin_detection_uses_schema_columns() {
    // A replay row is recognized by its schema columns, not by its type.
    let row = ReplayFlow::from_pairs(&[("Flow Duration", "10"), ("Flow Bytes/s", "77")]);
    assert!(row.has("Flow Duration"));
    let vector = align(&row);
    // Pass-through, not recomputation.
    assert_eq!(vector.get("Flow Bytes/s"), Some(77.0));
}
