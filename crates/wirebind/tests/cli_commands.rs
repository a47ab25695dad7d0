use std::path::PathBuf;
use std::process::Command;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "wirebind-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn split_prints_one_json_line_per_frame() {
    let dir = unique_temp_dir("split");
    let capture = dir.join("capture.bin");
    // garbage, then two frames: 68 <len> <body> 16
    std::fs::write(
        &capture,
        [0xFF, 0x68, 0x02, 0x0A, 0x0B, 0x16, 0x68, 0x01, 0x0C, 0x16],
    )
    .expect("capture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_wirebind"))
        .args(["--format", "json", "split"])
        .arg(&capture)
        .args(["--header", "68", "--length-offset", "1", "--length-width", "1", "--adjust", "1"])
        .output()
        .expect("split should run");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("each line should be JSON"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["hex"], "68020a0b16");
    assert_eq!(lines[1]["size"], 4);

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn split_flags_trailing_partial_frame() {
    let dir = unique_temp_dir("partial");
    let capture = dir.join("capture.hex");
    std::fs::write(&capture, "0003 616263\n0005 6162").expect("capture should be writable");

    let output = Command::new(env!("CARGO_BIN_EXE_wirebind"))
        .args(["--format", "pretty", "split", "--hex", "--strip", "2"])
        .arg(&capture)
        .output()
        .expect("split should run");

    assert_eq!(output.status.code(), Some(60));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("frame=0 size=3 bytes=61 62 63"), "stdout: {stdout}");

    let _ = std::fs::remove_dir_all(dir);
}

#[test]
fn split_missing_file_exits_66() {
    let output = Command::new(env!("CARGO_BIN_EXE_wirebind"))
        .args(["split", "/definitely/not/here.bin"])
        .output()
        .expect("split should run");
    assert_eq!(output.status.code(), Some(66));
}

#[test]
fn checksum_reports_requested_algorithms() {
    let output = Command::new(env!("CARGO_BIN_EXE_wirebind"))
        .args(["--format", "json", "checksum", "313233343536373839", "-a", "crc16,sum"])
        .output()
        .expect("checksum should run");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("checksum output should be JSON");
    assert_eq!(report["input_size"], 9);
    assert_eq!(report["checksums"][0]["algorithm"], "crc16");
    assert_eq!(report["checksums"][0]["hex"], "4b37");
    assert_eq!(report["checksums"][1]["algorithm"], "sum");
    assert_eq!(report["checksums"][1]["value"], 0xDD);
}

#[test]
fn version_reports_package_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_wirebind"))
        .arg("version")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("wirebind {}", env!("CARGO_PKG_VERSION")));
}
