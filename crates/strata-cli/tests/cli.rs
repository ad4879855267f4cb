use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("strata"))
}

/// Legacy pcap global header: microsecond magic, version 2.4, snaplen
/// 65535, linktype 1 (Ethernet).
fn pcap_header() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0xA1B2_C3D4u32.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&65535u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes
}

fn pcap_record(ts_sec: u32, frame: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&ts_sec.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(frame.len() as u32).to_le_bytes());
    bytes.extend_from_slice(frame);
    bytes
}

fn ethernet_frame(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0xFF; 6];
    frame.extend_from_slice(&[0x02; 6]);
    frame.extend_from_slice(&ethertype.to_be_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// IPv4 header plus a UDP header whose length field is below the
/// minimum, which dissects into an illegal-data node.
fn bad_udp_in_ipv4() -> Vec<u8> {
    let mut bytes = vec![
        0x45, 0x00, 0x00, 0x1C, 0x00, 0x00, 0x00, 0x00, 0x40, 0x11, 0x00, 0x00, 10, 0, 0, 1, 10,
        0, 0, 2,
    ];
    bytes.extend_from_slice(&[0x00, 0x35, 0x00, 0x35, 0x00, 0x04, 0x00, 0x00]);
    bytes
}

fn write_capture(dir: &TempDir, name: &str, frames: &[Vec<u8>]) -> PathBuf {
    let mut bytes = pcap_header();
    for (i, frame) in frames.iter().enumerate() {
        bytes.extend_from_slice(&pcap_record(i as u32 + 1, frame));
    }
    let path = dir.path().join(name);
    fs::write(&path, bytes).expect("write capture");
    path
}

#[test]
fn help_lists_dissect_subcommand() {
    cmd().arg("--help").assert().success();
    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Dissect a capture file"));
}

#[test]
fn missing_input_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");
    let missing = temp.path().join("missing.pcap");
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(missing)
        .arg("-o")
        .arg(report)
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn rejects_unknown_extension() {
    let temp = TempDir::new().expect("tempdir");
    let input = temp.path().join("capture.txt");
    fs::write(&input, b"not a capture").expect("write file");

    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(input)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(contains("unsupported input format"));
}

#[test]
fn stdout_outputs_layered_json() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(
        &temp,
        "sample.pcap",
        &[ethernet_frame(0x9000, b"opaque payload")],
    );

    let assert = cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(input)
        .arg("--stdout")
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");

    assert_eq!(value["report_version"], 1);
    assert_eq!(value["capture_summary"]["packets_total"], 1);
    assert_eq!(value["capture_summary"]["packets_with_illegal_data"], 0);
    assert_eq!(value["packets"][0]["layers"][0]["kind"], "ethernet");
    assert_eq!(value["packets"][0]["layers"][1]["kind"], "raw");
    assert_eq!(value["packets"][0]["has_illegal_data"], false);
}

#[test]
fn pretty_and_compact_conflict() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(&temp, "sample.pcap", &[ethernet_frame(0x9000, b"x")]);

    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(input)
        .arg("--stdout")
        .arg("--pretty")
        .arg("--compact")
        .assert()
        .failure()
        .stderr(contains("error:"));
}

#[test]
fn quiet_report_writes_file_without_chatter() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(&temp, "sample.pcap", &[ethernet_frame(0x9000, b"x")]);
    let report = temp.path().join("report.json");

    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(input)
        .arg("-o")
        .arg(&report)
        .arg("--quiet")
        .assert()
        .success()
        .stderr(predicates::str::is_empty());

    let written = fs::read_to_string(&report).expect("read report");
    let _: Value = serde_json::from_str(&written).expect("valid json");
}

#[test]
fn strict_fails_on_illegal_data() {
    let temp = TempDir::new().expect("tempdir");
    let input = write_capture(
        &temp,
        "broken.pcap",
        &[ethernet_frame(0x0800, &bad_udp_in_ipv4())],
    );

    let assert = cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(&input)
        .arg("--stdout")
        .arg("--strict")
        .assert()
        .failure()
        .stderr(contains("illegal data detected"));
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let value: Value = serde_json::from_str(&stdout).expect("valid json");
    assert_eq!(value["capture_summary"]["packets_with_illegal_data"], 1);
    assert_eq!(value["packets"][0]["layers"][2]["kind"], "illegal");

    // Without --strict the same capture succeeds.
    cmd()
        .arg("pcap")
        .arg("dissect")
        .arg(&input)
        .arg("--stdout")
        .assert()
        .success();
}
