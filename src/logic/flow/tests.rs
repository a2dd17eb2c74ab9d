//! Flow source tests.

use std::io::Write;
use std::path::PathBuf;

use tempfile::TempDir;

use crate::logic::error::ScanError;

use super::capture::{resolve_interface, LiveFlow};
use super::replay::{ReplaySource, REQUIRED_COLUMNS};
use super::FlowRecord;

const HEADER: &str = "Flow Duration, Flow Bytes/s, Flow Packets/s, Total Fwd Packets, \
Total Backward Packets, Total Length of Fwd Packets, Total Length of Bwd Packets, \
Flow IAT Mean, Flow IAT Std, SYN Flag Count, ACK Flag Count, RST Flag Count, \
FIN Flag Count, Packet Length Mean, Packet Length Std, Min Packet Length, \
Max Packet Length, Label";

/// Write a dataset whose rows are distinguishable by `Flow Duration`.
fn write_dataset(dir: &TempDir, rows: usize) -> PathBuf {
    let path = dir.path().join("flows.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for i in 0..rows {
        let label = if i % 2 == 0 { "BENIGN" } else { "DDoS" };
        writeln!(
            file,
            "{},100.0,10.0,5,3,500,300,12.5,2.0,1,6,0,1,100.0,15.0,40,1500,{}",
            i, label
        )
        .unwrap();
    }
    path
}

#[test]
fn test_replay_yields_all_rows_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 7);

    let source = ReplaySource::open(path.to_str().unwrap(), 0, None, None, None).unwrap();
    assert_eq!(source.len(), 7);

    let durations: Vec<f64> = source.map(|f| f.metric("Flow Duration")).collect();
    assert_eq!(durations, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_replay_missing_columns_is_a_data_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "Flow Duration,Label\n10,BENIGN\n").unwrap();

    let err = ReplaySource::open(path.to_str().unwrap(), 0, None, None, None).unwrap_err();
    assert!(matches!(err, ScanError::Data(_)));
}

#[test]
fn test_replay_missing_file_is_a_data_error() {
    let err = ReplaySource::open("/nonexistent/flows.csv", 0, None, None, None).unwrap_err();
    assert!(matches!(err, ScanError::Data(_)));
}

#[test]
fn test_replay_max_flows_limits_the_sequence() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 20);

    let source = ReplaySource::open(path.to_str().unwrap(), 0, Some(4), None, None).unwrap();
    assert_eq!(source.count(), 4);
}

#[test]
fn test_row_window_equals_slice_of_full_replay() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 50);

    let full: Vec<f64> = ReplaySource::open(path.to_str().unwrap(), 0, None, None, None)
        .unwrap()
        .map(|f| f.metric("Flow Duration"))
        .collect();

    let windowed: Vec<f64> =
        ReplaySource::open(path.to_str().unwrap(), 0, None, Some(10), Some(25))
            .unwrap()
            .map(|f| f.metric("Flow Duration"))
            .collect();

    assert_eq!(windowed.len(), 15);
    assert_eq!(windowed.as_slice(), &full[10..25]);
}

#[test]
fn test_row_window_takes_precedence_over_max_flows() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 30);

    let source =
        ReplaySource::open(path.to_str().unwrap(), 0, Some(2), Some(5), Some(15)).unwrap();
    assert_eq!(source.count(), 10);
}

#[test]
fn test_header_whitespace_is_trimmed() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 1);

    // The header above deliberately carries leading spaces, as CIC-IDS-2017
    // files do; validation must still see every required column.
    let source = ReplaySource::open(path.to_str().unwrap(), 0, None, None, None).unwrap();
    let flow = source.last().unwrap();
    for col in REQUIRED_COLUMNS {
        assert!(flow.has(col), "missing {}", col);
    }
}

#[test]
fn test_replay_flow_contract() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(&dir, 2);

    let mut source = ReplaySource::open(path.to_str().unwrap(), 0, None, None, None).unwrap();
    let flow = source.next().unwrap();

    assert_eq!(flow.label().as_deref(), Some("BENIGN"));
    assert_eq!(flow.packets(), 8);
    assert_eq!(flow.metric("Total Length of Fwd Packets"), 500.0);
    assert_eq!(flow.metric("no such column"), 0.0);
    assert!(!flow.has("no such column"));

    let descriptor = flow.descriptor();
    assert_eq!(descriptor.packets, 8);
    assert_eq!(descriptor.bytes, 800);
}

#[test]
fn test_live_flow_contract() {
    let mut flow = LiveFlow::default();
    flow.src_ip = "192.168.1.4".to_string();
    flow.dst_port = 53;
    flow.protocol = 17;
    flow.attrs.insert("bidirectional_packets".to_string(), 9.0);
    flow.attrs.insert("bidirectional_bytes".to_string(), 720.0);

    assert!(flow.label().is_none());
    assert_eq!(flow.packets(), 9);
    assert_eq!(flow.metric("bidirectional_bytes"), 720.0);
    assert_eq!(flow.metric("src2dst_packets"), 0.0);

    let descriptor = flow.descriptor();
    assert_eq!(descriptor.protocol, "17");
    assert_eq!(descriptor.bytes, 720);
}

#[test]
fn test_explicit_interface_is_used_verbatim() {
    assert_eq!(resolve_interface(Some("eth0")).unwrap(), "eth0");
    // Empty means "auto-detect", same as absent; either finds an interface
    // or reports a configuration error, depending on the host.
    match resolve_interface(Some("")) {
        Ok(name) => assert!(!name.is_empty()),
        Err(err) => assert!(matches!(err, ScanError::Configuration(_))),
    }
}
