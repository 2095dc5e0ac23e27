#![cfg(all(unix, feature = "cli"))]

use std::process::{Command, Output};

fn scbi(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scbi"))
        .args(["--log-level", "error", "--format", "json"])
        .args(args)
        .output()
        .expect("scbi should run")
}

fn json_stdout(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).expect("stdout should be one JSON document")
}

#[test]
fn decode_sensor_frame_outputs_record() {
    let output = scbi(&["decode", "90010184", "03d7000400000000"]);

    assert!(output.status.success());
    let report = json_stdout(&output);
    assert_eq!(report["identifier"], "0x90010184");
    assert_eq!(report["envelope"]["program"], 0x84);
    assert_eq!(report["envelope"]["message"], "response");
    assert_eq!(report["payload"]["layout"], "sensor");
    assert_eq!(report["records"][0]["kind"], "sensor");
    assert_eq!(report["records"][0]["name"], "temperature_3");
    assert_eq!(report["records"][0]["value"], 215);
    assert!(report["anomaly"].is_null());
}

#[test]
fn decode_accepts_candump_frame() {
    let output = scbi(&["decode", "90070184#6210000010000000"]);

    assert!(output.status.success());
    let report = json_stdout(&output);
    assert_eq!(report["records"][0]["kind"], "overview");
    assert_eq!(report["records"][0]["name"], "months_2");
    assert_eq!(report["records"][0]["value"], 4096);
    assert_eq!(report["payload"]["hours"], 16);
    assert_eq!(report["payload"]["heat_yield"], 4096);
}

#[test]
fn decode_relay_reports_ext_functions() {
    let output = scbi(&["decode", "0x9002_0184", "01 02 01 fe ff 00 00 00"]);

    assert!(output.status.success());
    let report = json_stdout(&output);
    assert_eq!(report["payload"]["ext_functions"][0], "disabled");
    assert_eq!(report["payload"]["ext_functions"][1], "unselected");
    assert_eq!(report["records"][0]["name"], "relay_1");
    assert_eq!(report["records"][0]["value"], 1);
}

#[test]
fn decode_short_payload_returns_60() {
    let output = scbi(&["decode", "90010184", "03d700"]);

    assert_eq!(output.status.code(), Some(60));
    let report = json_stdout(&output);
    assert_eq!(report["records"].as_array().map(Vec::len), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("short payload"), "stderr: {stderr}");
}

#[test]
fn decode_bulk_variant_returns_60() {
    let output = scbi(&["decode", "91010184", "03d7000400000000"]);

    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("unsupported protocol variant"),
        "stderr: {stderr}"
    );
}

#[test]
fn decode_unknown_function_is_not_an_anomaly() {
    let output = scbi(&["decode", "90420184", "0000000000000000"]);

    assert!(output.status.success());
    let report = json_stdout(&output);
    assert!(report["payload"].is_null());
    assert_eq!(report["records"].as_array().map(Vec::len), Some(0));
}

#[test]
fn decode_invalid_identifier_returns_64() {
    let output = scbi(&["decode", "not-hex"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_prints_name() {
    let output = scbi(&["version"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("scbi "));
}

#[cfg(target_os = "linux")]
#[test]
fn listen_on_missing_interface_returns_transport_error() {
    let output = scbi(&["listen", "scbi-missing0", "--count", "1"]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"), "stderr: {stderr}");
}
