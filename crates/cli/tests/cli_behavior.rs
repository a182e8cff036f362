use std::path::Path;
use std::process::Command;

use serde_json::json;
use tempfile::TempDir;

struct Run {
	code: Option<i32>,
	stdout: String,
	stderr: String,
}

fn run_olsend(home: &Path, args: &[&str]) -> Run {
	let output = Command::new(env!("CARGO_BIN_EXE_olsend"))
		.current_dir(home)
		.env("HOME", home)
		.env("XDG_CONFIG_HOME", home.join(".config"))
		.env_remove("RUST_LOG")
		.args(args)
		.output()
		.expect("failed to execute olsend");

	Run {
		code: output.status.code(),
		stdout: String::from_utf8_lossy(&output.stdout).to_string(),
		stderr: String::from_utf8_lossy(&output.stderr).to_string(),
	}
}

fn run_json(home: &Path, args: &[&str]) -> (Option<i32>, serde_json::Value) {
	let mut full = vec!["-f", "json"];
	full.extend_from_slice(args);
	let run = run_olsend(home, &full);
	let parsed = serde_json::from_str::<serde_json::Value>(&run.stdout).unwrap_or_else(|_| json!({ "raw": run.stdout, "stderr": run.stderr }));
	(run.code, parsed)
}

#[test]
fn dry_run_send_reports_success() {
	let temp = TempDir::new().unwrap();
	std::fs::write(temp.path().join("f1.txt"), "attached").unwrap();

	let run = run_olsend(
		temp.path(),
		&["send", "--dry-run", "--to", "a@x.com", "--subject", "S", "--body", "B", "--attach", "f1.txt"],
	);

	assert_eq!(run.code, Some(0), "stderr: {}", run.stderr);
	assert_eq!(run.stdout.trim(), "email sent successfully");
}

#[test]
fn dry_run_send_json_envelope() {
	let temp = TempDir::new().unwrap();

	let (code, value) = run_json(temp.path(), &["--dry-run", "send", "--to", "a@x.com", "--to", "b@x.com", "-s", "S", "-b", "B"]);

	assert_eq!(code, Some(0), "output: {value}");
	assert_eq!(value["ok"], true);
	assert_eq!(value["command"], "send");
	assert_eq!(value["data"]["outcome"], "sent");
	assert_eq!(value["data"]["recipients"], 2);
	assert!(value["durationMs"].is_u64());
}

#[test]
fn send_without_binding_is_unavailable() {
	let temp = TempDir::new().unwrap();

	let run = run_olsend(temp.path(), &["send", "--to", "a@x.com", "-s", "S", "-b", "B"]);

	assert_eq!(run.code, Some(2));
	assert!(run.stderr.contains("mail application not available"), "stderr: {}", run.stderr);
	assert!(run.stdout.is_empty());
}

#[test]
fn missing_attachment_fails_before_sending() {
	let temp = TempDir::new().unwrap();

	let (code, value) = run_json(temp.path(), &["--dry-run", "send", "--to", "a@x.com", "--attach", "missing.pdf"]);

	assert_eq!(code, Some(1));
	assert_eq!(value["error"]["code"], "INVALID_INPUT");
	assert!(value["message"].as_str().unwrap().contains("missing.pdf"));
}

#[test]
fn check_reports_availability() {
	let temp = TempDir::new().unwrap();

	let (code, value) = run_json(temp.path(), &["--dry-run", "check"]);
	assert_eq!(code, Some(0));
	assert_eq!(value["data"]["available"], true);
	assert_eq!(value["data"]["processName"], "outlook");

	let (code, value) = run_json(temp.path(), &["check"]);
	assert_eq!(code, Some(2));
	assert_eq!(value["error"]["code"], "UNAVAILABLE");
}

#[test]
fn explicit_config_file_is_applied() {
	let temp = TempDir::new().unwrap();
	let config = temp.path().join("olsend.json");
	std::fs::write(&config, r#"{ "send_timeout_ms": 1500, "process_name": "thunderbird" }"#).unwrap();

	let (code, value) = run_json(temp.path(), &["--config", config.to_str().unwrap(), "config"]);

	assert_eq!(code, Some(0));
	assert_eq!(value["data"]["send_timeout_ms"], 1500);
	assert_eq!(value["data"]["process_name"], "thunderbird");
	assert_eq!(value["data"]["quit_wait_ms"], 5000);
}

#[cfg(target_os = "linux")]
#[test]
fn default_config_location_is_read() {
	let temp = TempDir::new().unwrap();
	let dir = temp.path().join(".config").join("olsend");
	std::fs::create_dir_all(&dir).unwrap();
	std::fs::write(dir.join("config.json"), r#"{ "poll_interval_ms": 40 }"#).unwrap();

	let (code, value) = run_json(temp.path(), &["config"]);

	assert_eq!(code, Some(0));
	assert_eq!(value["data"]["poll_interval_ms"], 40);
}

#[test]
fn malformed_config_is_fatal() {
	let temp = TempDir::new().unwrap();
	let config = temp.path().join("broken.json");
	std::fs::write(&config, "{").unwrap();

	let run = run_olsend(temp.path(), &["--config", config.to_str().unwrap(), "--dry-run", "check"]);

	assert_eq!(run.code, Some(1));
	assert!(run.stderr.contains("invalid config"), "stderr: {}", run.stderr);
}
