#![cfg(feature = "cli")]

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "fbmirror-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

fn fbmirror() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_fbmirror"));
    cmd.env("RUST_LOG", "error").env_remove("FBMIRROR_PORT");
    cmd
}

fn capture() -> Vec<u8> {
    let mut bytes = b"boot: ok\r\n".to_vec();
    bytes.extend_from_slice(b"<FB>\x02\x00\xff\x00</FB>");
    bytes.extend_from_slice(b"<FB>\x05\x00\x01\x02</FB>");
    bytes.extend_from_slice(b"noise<FB>\x03\x00\x01\x02\x03</FB>tail");
    bytes
}

#[test]
fn version_prints_name_and_version() {
    let output = fbmirror().arg("version").output().expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("fbmirror {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn version_extended_includes_defaults() {
    let output = fbmirror()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: fbmirror"));
    assert!(stdout.contains("baud=115200"));
}

#[test]
fn replay_emits_one_json_line_per_valid_frame() {
    let dir = unique_temp_dir("replay-json");
    let path = dir.join("capture.bin");
    std::fs::write(&path, capture()).expect("capture should be writable");

    let output = fbmirror()
        .arg("replay")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .output()
        .expect("replay should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("\"payload\":\"ff00\""));
    assert!(lines[0].contains("\"index\":1"));
    assert!(lines[1].contains("\"payload_size\":3"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_reads_stdin_and_writes_raw_payloads() {
    let mut child = fbmirror()
        .arg("replay")
        .arg("-")
        .arg("--format")
        .arg("raw")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("replay should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(&capture())
        .expect("capture should be written");

    let output = child.wait_with_output().expect("replay should finish");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0xff, 0x00, 0x01, 0x02, 0x03]);
}

#[test]
fn replay_count_limits_output() {
    let dir = unique_temp_dir("replay-count");
    let path = dir.join("capture.bin");
    std::fs::write(&path, capture()).expect("capture should be writable");

    let output = fbmirror()
        .arg("replay")
        .arg(&path)
        .arg("--format")
        .arg("json")
        .arg("--count")
        .arg("1")
        .output()
        .expect("replay should run");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).lines().count(), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn replay_missing_file_fails() {
    let dir = unique_temp_dir("replay-missing");
    let output = fbmirror()
        .arg("replay")
        .arg(dir.join("does-not-exist.bin"))
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to open"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_geometry_is_a_usage_error() {
    let output = fbmirror()
        .arg("replay")
        .arg("-")
        .arg("--height")
        .arg("30")
        .stdin(Stdio::null())
        .output()
        .expect("replay should run");

    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn invalid_reconnect_delay_is_a_usage_error() {
    let output = fbmirror()
        .arg("/dev/fbmirror-test-nonexistent")
        .arg("--reconnect-delay")
        .arg("soon")
        .output()
        .expect("view should run");

    assert_eq!(output.status.code(), Some(64));
}
