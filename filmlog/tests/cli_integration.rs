//! Integration tests for the filmlog CLI

use std::io::Write;
use std::process::Command;

use tempfile::NamedTempFile;

const SAMPLE_LOG: &str = "\
# Personal roll log

Company kdk
Kodak

Stock tx4
Tri-X 400
kdk
400
3 + 2

Stock hp5
HP5 Plus
kdk
200-800
3

Camera f5p
Nikon
F5

Lab cew
Carmencita

2024-03-01 tx4 f5p cew 2024-03-12 2024-03-19 12
Graduation day

2024-04-02 hp5 f5p -
";

fn run_filmlog(args: &[&str]) -> (String, String, bool) {
    let mut cmd_args = vec!["run", "-p", "filmlog", "--"];
    cmd_args.extend(args);

    let output = Command::new("cargo")
        .args(&cmd_args)
        .current_dir(env!("CARGO_MANIFEST_DIR").to_string() + "/..")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();

    (stdout, stderr, success)
}

fn with_sample_log(args: &[&str]) -> (String, String, bool) {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(SAMPLE_LOG.as_bytes())
        .expect("Failed to write sample log");

    let path = file.path().to_string_lossy().to_string();
    let mut full_args = vec![path.as_str()];
    full_args.extend(args);
    run_filmlog(&full_args)
}

#[test]
fn test_cli_help() {
    let (stdout, _, success) = run_filmlog(&["--help"]);

    assert!(success);
    assert!(stdout.contains("filmlog"));
    assert!(stdout.contains("--mode"));
    assert!(stdout.contains("--format"));
    assert!(stdout.contains("--output"));
    assert!(stdout.contains("--id"));
}

#[test]
fn test_cli_version() {
    let (stdout, _, success) = run_filmlog(&["--version"]);

    assert!(success);
    assert!(stdout.contains("filmlog"));
}

#[test]
fn test_log_output() {
    let (stdout, _, success) = with_sample_log(&[]);

    assert!(success);
    assert!(stdout.contains("Date"));
    assert!(stdout.contains("2024-03-01"));
    assert!(stdout.contains("Tri-X 400"));
    assert!(stdout.contains("Nikon"));
    assert!(stdout.contains("Carmencita"));
    assert!(stdout.contains("0012"));
    // The hp5 roll is still in the camera
    assert!(stdout.contains("loaded"));
}

#[test]
fn test_log_no_header() {
    let (stdout, _, success) = with_sample_log(&["--nh"]);

    assert!(success);
    assert!(!stdout.contains("Manufacturer"));
    assert!(stdout.contains("2024-03-01"));
}

#[test]
fn test_stock_output() {
    let (stdout, _, success) = with_sample_log(&["-m", "stock"]);

    assert!(success);
    assert!(stdout.contains("Avail"));
    assert!(stdout.contains("Shot"));
    assert!(stdout.contains("Total"));
    // tx4: "3 + 2" rolls bought, 1 shot
    assert!(stdout.contains("Tri-X 400"));
    assert!(stdout.contains("5"));
    // hp5 is currently loaded in the F5
    assert!(stdout.contains("Nikon F5"));
}

#[test]
fn test_tags_output() {
    let (stdout, _, success) = with_sample_log(&["-m", "tags"]);

    assert!(success);
    assert_eq!(stdout.lines().count(), 2);
    assert!(stdout.contains("camera:nikon-f5"));
    assert!(stdout.contains("film:kodak-tri-x_400"));
    assert!(stdout.contains("lab:carmencita"));
    assert!(stdout.contains("scan:0012"));
}

#[test]
fn test_markdown_output() {
    let (stdout, _, success) = with_sample_log(&["--md"]);

    assert!(success);
    let mut lines = stdout.lines();
    let header = lines.next().expect("markdown header row");
    assert!(header.trim_start().starts_with('|'));
    assert!(header.contains(" | "));
    let sep = lines.next().expect("markdown separator row");
    assert!(sep.contains(":---"));
}

#[test]
fn test_html_output() {
    let (stdout, _, success) = with_sample_log(&["--html"]);

    assert!(success);
    assert!(stdout.contains("<table>"));
    assert!(stdout.contains("</table>"));
    assert!(stdout.contains("<th>Date</th>"));
    assert!(stdout.contains("<td>Tri-X 400</td>"));
}

#[test]
fn test_json_output() {
    let (stdout, _, success) = with_sample_log(&["--output", "json"]);

    assert!(success);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");
    assert!(parsed.get("companies").is_some());
    assert!(parsed.get("stocks").is_some());
    assert!(parsed.get("entries").is_some());
    assert_eq!(parsed["entries"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(parsed["stocks"]["tx4"]["rolls"], 5);
}

#[test]
fn test_missing_file() {
    let (_, stderr, success) = run_filmlog(&["/nonexistent/rolls.log"]);

    assert!(!success);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("cannot open"));
}

#[test]
fn test_parse_error_reports_line() {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(b"Stock kdkk\nTri-X\n")
        .expect("Failed to write log");
    let path = file.path().to_string_lossy().to_string();

    let (_, stderr, success) = run_filmlog(&[path.as_str()]);

    assert!(!success);
    assert!(stderr.contains("line 1"));
    assert!(stderr.contains("kdkk"));
}
