//! CLI Integration Tests for isa-docs
//!
//! Runs the built binary against the bundled sample snapshot.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Path to the isa-docs binary built for this test run
fn isa_docs_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_isa-docs"))
}

fn sample_snapshot() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("sample_isa.json")
}

/// Get a per-process, per-test temp directory for test outputs
fn temp_dir(test: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("isa_docs_cli_tests_{}", std::process::id()));
    path.push(test);
    fs::create_dir_all(&path).ok();
    path
}

fn run(args: &[&str]) -> Output {
    let snapshot = sample_snapshot();
    Command::new(isa_docs_binary())
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .arg("--db-path")
        .arg(&snapshot)
        .args(args)
        .output()
        .expect("Failed to run isa-docs")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_check_summarizes_snapshot() {
    let output = run(&["check"]);
    assert!(
        output.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = stdout(&output);
    assert!(text.contains("Instructions: 37"));
    for arch in ["aarch64", "riscv64", "x86_32", "x86_64"] {
        assert!(text.contains(arch), "missing {}", arch);
    }
}

#[test]
fn test_read_resource() {
    let output = run(&["read", "isa://architecture/riscv64"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Architecture: riscv64"));
    assert!(text.contains("CSR Registers: mstatus, mtvec, mepc"));
}

#[test]
fn test_read_unknown_resource_fails() {
    let output = run(&["read", "isa://architecture/mips"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Architecture 'mips' not found"));
}

#[test]
fn test_search_with_filter() {
    let output = run(&["search", "mov", "--arch", "x86_64"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("x86_64: MOV [m64_r64]"));
    assert!(!text.contains("aarch64"));
}

#[test]
fn test_compare_marks_absence() {
    let output = run(&["compare", "mov", "--arch", "x86_64", "--arch", "riscv64"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("riscv64: ABSENT"));
    assert!(text.contains("x86_64: PRESENT (3 variant(s))"));
}

#[test]
fn test_compare_unknown_architecture_fails() {
    let output = run(&["compare", "ADD", "-a", "riscv32"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("Unknown architecture(s): riscv32"));
}

#[test]
fn test_missing_snapshot_fails() {
    let output = Command::new(isa_docs_binary())
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .args(["--db-path", "/nonexistent/isa.json", "check"])
        .output()
        .expect("Failed to run isa-docs");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_corrupt_snapshot_fails() {
    let path = temp_dir("corrupt_snapshot").join("dangling.json");
    fs::write(
        &path,
        r#"{"architectures": [], "instructions": [{"architecture": "ghost", "mnemonic": "NOP"}]}"#,
    )
    .unwrap();
    let output = Command::new(isa_docs_binary())
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .arg("--db-path")
        .arg(&path)
        .arg("check")
        .output()
        .expect("Failed to run isa-docs");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("ghost"));
}

#[test]
fn test_config_file_supplies_snapshot_path() {
    let dir = temp_dir("config_file");
    let config = dir.join("isa-docs.toml");
    fs::write(
        &config,
        format!(
            "[store]\npath = {:?}\n\n[search]\nmax_results = 1\n",
            sample_snapshot().display().to_string()
        ),
    )
    .unwrap();

    let output = Command::new(isa_docs_binary())
        .current_dir(&dir)
        .args(["search", "mov"])
        .output()
        .expect("Failed to run isa-docs");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("More results exist"));
}

#[test]
fn test_stdio_transport_answers_ping() {
    use std::io::Write;
    use std::process::Stdio;

    let mut child = Command::new(isa_docs_binary())
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .arg("--db-path")
        .arg(sample_snapshot())
        .arg("stdio")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn isa-docs");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let reply: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(reply["id"], 9);
}
