use assert_cmd::Command;
use tempfile::tempdir;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("ambatudonlod").unwrap();
    // Nothing listens here; any accidental request fails fast.
    cmd.env("AMBATUDONLOD_API_URL", "http://127.0.0.1:9");
    cmd
}

#[test]
fn get_rejects_invalid_url_before_any_request() {
    let dir = tempdir().unwrap();
    let assert = cli()
        .args(["get", "https://example.com/video", "--title", "x", "--out"])
        .arg(dir.path())
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(
        stderr.contains("Invalid YouTube URL. Please enter a valid URL."),
        "stderr: {stderr}"
    );
    assert!(!stderr.contains("Cannot connect"), "stderr: {stderr}");
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn get_with_unreachable_backend_reports_connectivity() {
    let dir = tempdir().unwrap();
    let assert = cli()
        .args(["get", "https://youtu.be/dQw4w9WgXcQ", "--title", "x", "--out"])
        .arg(dir.path())
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    assert!(
        stderr.contains("Cannot connect to server. Make sure the API server is running."),
        "stderr: {stderr}"
    );
}

#[test]
fn banner_prints_the_revealed_text() {
    let assert = cli()
        .args(["banner", "hello", "--speed-ms", "1", "--max-iterations", "1", "--direction", "center"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    assert_eq!(stdout.trim(), "hello");
}

#[test]
fn banner_rejects_end_direction() {
    cli()
        .args(["banner", "hello", "--direction", "end"])
        .assert()
        .failure();
}

#[test]
fn unknown_quality_is_rejected() {
    cli()
        .args(["get", "https://youtu.be/dQw4w9WgXcQ", "--video-quality", "1080"])
        .assert()
        .failure();
}
