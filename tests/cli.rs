use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn write_config(dir: &Path, api_host: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    let contents = format!(
        "api_host: {api_host}\npreferences:\n  format: table\npolling:\n  interval_secs: 1\n  retry_attempts: 2\n  retry_delay_ms: 10\n"
    );
    fs::write(&path, contents).expect("failed to write config");
    path
}

fn asolens() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("asolens"));
    for var in [
        "ASOLENS_CONFIG",
        "ASOLENS_API_HOST",
        "ASOLENS_CACHE_DIR",
        "ASOLENS_FORMAT",
        "ASOLENS_NO_PERSIST",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn version_prints_package_version() {
    asolens()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn status_uses_custom_config_path() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), "http://aso.internal:9000");

    let assert = asolens()
        .arg("status")
        .arg("--config")
        .arg(&config_path)
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    assert!(stdout.contains(&config_path.to_string_lossy().to_string()));
    assert!(stdout.contains("Backend: http://aso.internal:9000"));
    assert!(stdout.contains("Polling every 1s"));

    Ok(())
}

#[test]
fn status_without_config_uses_defaults() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    asolens()
        .arg("status")
        .arg("--config")
        .arg(temp.path().join("missing.yaml"))
        .arg("--no-persist")
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration not found"))
        .stdout(predicate::str::contains("http://localhost:8000"))
        .stdout(predicate::str::contains("memory only"));

    Ok(())
}

#[test]
fn cache_path_honours_cache_dir() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let cache_dir = temp.path().join("cache");

    asolens()
        .args(["cache", "path", "--cache-dir"])
        .arg(&cache_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(cache_dir.to_string_lossy().to_string()));

    Ok(())
}

#[test]
fn cache_clear_and_keys_on_empty_cache() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = temp.path().join("missing.yaml");
    let cache_dir = temp.path().join("cache");

    asolens()
        .args(["cache", "clear", "--cache-dir"])
        .arg(&cache_dir)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cache was already empty"));

    let assert = asolens()
        .args(["cache", "keys", "--format", "json", "--cache-dir"])
        .arg(&cache_dir)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(json["data"], serde_json::json!([]));

    Ok(())
}

#[test]
fn cache_invalidate_reports_missing_key() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;

    asolens()
        .args(["cache", "invalidate", "app_analysis_com.example.app", "--cache-dir"])
        .arg(temp.path().join("cache"))
        .arg("--config")
        .arg(temp.path().join("missing.yaml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached entry named app_analysis_com.example.app"));

    Ok(())
}

#[test]
fn analyze_rejects_invalid_package_before_any_request() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    // Nothing listens here; validation has to fail first.
    let config_path = write_config(temp.path(), "http://127.0.0.1:9");

    asolens()
        .args(["analyze", "not a package", "--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid package name"));

    Ok(())
}

#[test]
fn invalid_config_shows_helpful_error() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = temp.path().join("config.yaml");
    fs::write(&config_path, "polling:\n  interval_secs: 0\n")?;

    asolens()
        .args(["report", "com.example.app", "--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("interval_secs"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn analyze_follows_job_to_completion() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();

    let submit = server
        .mock("POST", "/api/analyze")
        .match_body(mockito::Matcher::PartialJson(serde_json::json!({
            "package_name": "com.example.app",
            "competitor_package_names": ["com.rival.one"]
        })))
        .with_status(200)
        .with_body(r#"{"task_id": "task-42"}"#)
        .expect(1)
        .create();

    let status = server
        .mock("GET", "/api/analyze/task-42")
        .with_status(200)
        .with_body(
            r#"{
                "status": "completed",
                "app_data": {"title": "Example"},
                "analysis": {
                    "app_analysis": {"score": 7},
                    "keyword_suggestions": ["notes", "todo"]
                }
            }"#,
        )
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &server.url());

    let assert = asolens()
        .args(["analyze", "com.example.app", "-c", "com.rival.one"])
        .args(["--format", "json", "--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout)?;
    assert_eq!(json["data"]["app_metadata"]["title"], "Example");
    assert_eq!(json["data"]["keyword_suggestions"][1], "todo");

    submit.assert();
    status.assert();

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn analyze_surfaces_backend_job_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();

    let _submit = server
        .mock("POST", "/api/analyze")
        .with_status(200)
        .with_body(r#"{"task_id": "task-7"}"#)
        .create();
    let _status = server
        .mock("GET", "/api/analyze/task-7")
        .with_status(200)
        .with_body(r#"{"status": "error", "error": "Play Store unavailable"}"#)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &server.url());

    asolens()
        .args(["analyze", "com.example.app", "--format", "json", "--no-persist"])
        .arg("--config")
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Play Store unavailable"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn analyze_no_wait_prints_task_id() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();

    let _submit = server
        .mock("POST", "/api/analyze")
        .with_status(200)
        .with_body(r#"{"task_id": "task-9"}"#)
        .create();
    let _status = server
        .mock("GET", "/api/analyze/task-9")
        .with_status(200)
        .with_body(r#"{"status": "pending"}"#)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &server.url());

    asolens()
        .args(["analyze", "com.example.app", "--no-wait", "--format", "json"])
        .args(["--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("task-9"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn report_merges_stages_and_reuses_cache() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();

    let app = server
        .mock("GET", "/api/analyze/app/com.example.app")
        .with_status(200)
        .with_body(r#"{"rating": 4.5}"#)
        .expect(1)
        .create();
    let compare = server
        .mock("POST", "/api/analyze/competitors/compare")
        .with_status(200)
        .with_body(r#"{"gap": "screenshots"}"#)
        .expect(1)
        .create();
    let keywords = server
        .mock("POST", "/api/analyze/keywords/discover")
        .with_status(200)
        .with_body(r#"{"keywords": ["notes"]}"#)
        .expect(1)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &server.url());
    let cache_dir = temp.path().join("cache");

    for _ in 0..2 {
        let assert = asolens()
            .args(["report", "com.example.app", "-c", "com.rival.one"])
            .args(["--format", "json", "--cache-dir"])
            .arg(&cache_dir)
            .arg("--config")
            .arg(&config_path)
            .assert()
            .success();

        let stdout = String::from_utf8_lossy(&assert.get_output().stdout);
        let json: serde_json::Value = serde_json::from_str(&stdout)?;
        assert_eq!(json["data"]["appAnalysis"]["rating"], 4.5);
        assert_eq!(json["data"]["competitorAnalysis"]["gap"], "screenshots");
        assert_eq!(json["data"]["keywordAnalysis"]["keywords"][0], "notes");
    }

    // Second run is served from the on-disk cache
    app.assert();
    compare.assert();
    keywords.assert();

    asolens()
        .args(["cache", "keys", "--cache-dir"])
        .arg(&cache_dir)
        .arg("--config")
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("app_analysis_com.example.app"));

    Ok(())
}

#[cfg_attr(not(feature = "http-tests"), ignore)]
#[test]
fn report_server_error_shows_detail() -> Result<(), Box<dyn std::error::Error>> {
    let mut server = mockito::Server::new();

    let _app = server
        .mock("GET", "/api/analyze/app/com.example.app")
        .with_status(500)
        .with_body(r#"{"detail": "scraper crashed"}"#)
        .create();

    let temp = tempdir()?;
    let config_path = write_config(temp.path(), &server.url());

    asolens()
        .args(["report", "com.example.app", "--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("scraper crashed"));

    Ok(())
}

#[test]
fn connection_error_shows_network_message() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let config_path = write_config(temp.path(), "http://127.0.0.1:9");

    asolens()
        .args(["report", "com.example.app", "--no-persist", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    Ok(())
}
