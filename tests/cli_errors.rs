use predicates::str::{contains, diff};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

fn write_temp_file(contents: &str, extension: &str) -> std::path::PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time should be available")
        .as_nanos();
    path.push(format!("cluster-dash-errors-{}.{}", nanos, extension));
    fs::write(&path, contents).expect("file write should succeed");
    path
}

#[test]
fn cloudlet_exceeding_deadline_is_rejected_locally() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.env_remove("RUST_LOG");
    cmd.args([
        "cloudlet",
        "submit",
        "--execution-time",
        "40",
        "--deadline",
        "30",
    ]);
    cmd.assert()
        .failure()
        .stdout(diff(""))
        .stderr(diff("Error: execution time 40s exceeds deadline 30s\n"));
}

#[test]
fn unknown_preset_is_reported() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["vm", "create", "--preset", "huge"]);
    cmd.assert()
        .failure()
        .stderr(diff("Error: unknown vm preset 'huge'\n"));
}

#[test]
fn commands_without_endpoint_fail_as_transport_errors() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["vm", "create", "--preset", "small"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: request failed: no cluster endpoint configured"));
}

#[test]
fn declined_delete_sends_nothing() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["vm", "delete", "vm-1"]);
    cmd.write_stdin("n\n");
    cmd.assert()
        .success()
        .stdout(diff("Cancelled\n"))
        .stderr(contains("Are you sure you want to delete this VM?"));
}

#[test]
fn watch_requires_endpoint() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["watch", "--max-updates", "1"]);
    cmd.assert().failure().stderr(diff(
        "Error: no endpoint configured; pass --url or set endpoint in the config file\n",
    ));
}

#[test]
fn missing_recording_is_reported() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["replay", "--file", "/nonexistent/cluster-dash.jsonl"]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: failed to read recording '/nonexistent/cluster-dash.jsonl'"));
}

#[test]
fn unsupported_config_format_is_rejected() {
    let path = write_temp_file("endpoint: x\n", "yaml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["show-config", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(diff("Error: unsupported config format 'yaml'\n"));
}

#[test]
fn malformed_toml_config_is_rejected() {
    let path = write_temp_file("poll_interval_ms = \"fast\"\n", "toml");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["show-config", "--config", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .stderr(contains("Error: failed to parse TOML"));
}

#[test]
fn empty_algorithm_name_is_rejected() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cluster-dash");
    cmd.args(["algorithm", "set", " "]);
    cmd.assert()
        .failure()
        .stderr(diff("Error: algorithm name must not be empty\n"));
}
