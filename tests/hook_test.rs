//! End-to-end tests for the notify-hook binary
//!
//! Each test runs the real executable in a scratch working directory with a
//! config file pointing at fake TTS backends written as shell scripts.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("tts")).unwrap();
        fs::write(
            dir.path().join("notify.cfg"),
            format!("[notify]\ntts_dir = {}\n", dir.path().join("tts").display()),
        )
        .unwrap();
        Self { dir }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Install a local backend that records its arguments
    fn install_local_backend(&self) -> PathBuf {
        let record = self.root().join("spoken.txt");
        let script = self.root().join("tts").join("pyttsx3_tts.py");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\nprintf '%s' \"$1\" > '{}'\necho synthesized\n",
                record.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        record
    }

    fn run(&self, input: &str, args: &[&str]) -> Output {
        let mut child = Command::new(env!("CARGO_BIN_EXE_notify-hook"))
            .args(args)
            .current_dir(self.root())
            .env("AGENT_NOTIFY_CONFIG", self.root().join("notify.cfg"))
            .env("HOME", self.root())
            .env_remove("ELEVENLABS_API_KEY")
            .env_remove("OPENAI_API_KEY")
            .env_remove("ENGINEER_NAME")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to start notify-hook");
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.as_bytes())
            .unwrap();
        child.wait_with_output().unwrap()
    }

    fn event_log(&self) -> Option<Vec<Value>> {
        let text = fs::read_to_string(self.root().join("logs").join("notification.json")).ok()?;
        serde_json::from_str(&text).ok()
    }

    fn debug_trace(&self) -> String {
        fs::read_to_string(self.root().join("logs").join("notification_debug.log"))
            .unwrap_or_default()
    }
}

#[test]
fn test_task_complete_is_logged_and_spoken() {
    let sandbox = Sandbox::new();
    let record = sandbox.install_local_backend();

    let output = sandbox.run(r#"{"message": "Task complete"}"#, &["--notify"]);
    assert_eq!(output.status.code(), Some(0));

    let log = sandbox.event_log().expect("event log written");
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["message"], "Task complete");

    assert_eq!(
        fs::read_to_string(record).unwrap(),
        "Your agent needs your input"
    );

    let trace = sandbox.debug_trace();
    assert!(trace.contains("Selected pyttsx3 backend"), "{}", trace);
    assert!(trace.contains("Running pyttsx3 backend"), "{}", trace);
    assert!(trace.contains("synthesized"), "{}", trace);
}

#[test]
fn test_idle_sentinel_is_logged_but_not_spoken() {
    let sandbox = Sandbox::new();
    let record = sandbox.install_local_backend();

    let output = sandbox.run(
        r#"{"message": "Claude is waiting for your input"}"#,
        &["--notify"],
    );
    assert_eq!(output.status.code(), Some(0));

    let log = sandbox.event_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["message"], "Claude is waiting for your input");
    assert!(!record.exists());
}

#[test]
fn test_malformed_input_leaves_log_unchanged() {
    let sandbox = Sandbox::new();
    sandbox.install_local_backend();

    sandbox.run(r#"{"message": "first"}"#, &[]);
    let before = fs::read(sandbox.root().join("logs").join("notification.json")).unwrap();

    let output = sandbox.run("not json", &["--notify"]);
    assert_eq!(output.status.code(), Some(0));

    let after = fs::read(sandbox.root().join("logs").join("notification.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_without_flag_nothing_is_spoken() {
    let sandbox = Sandbox::new();
    let record = sandbox.install_local_backend();

    let output = sandbox.run(r#"{"message": "Task complete"}"#, &[]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(sandbox.event_log().unwrap().len(), 1);
    assert!(!record.exists());
}

#[test]
fn test_failing_backend_still_exits_zero() {
    let sandbox = Sandbox::new();
    let script = sandbox.root().join("tts").join("pyttsx3_tts.py");
    fs::write(&script, "#!/bin/sh\necho boom >&2\nexit 7\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let output = sandbox.run(r#"{"message": "Task complete"}"#, &["--notify"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(sandbox.debug_trace().contains("exited with code Some(7)"));
}

#[test]
fn test_appends_accumulate_across_invocations() {
    let sandbox = Sandbox::new();
    for msg in ["one", "two", "three"] {
        sandbox.run(&format!(r#"{{"message": "{}", "n": 1}}"#, msg), &[]);
    }
    let messages: Vec<String> = sandbox
        .event_log()
        .unwrap()
        .iter()
        .map(|e| e["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, ["one", "two", "three"]);
}

#[test]
fn test_unwritable_log_dir_stays_silent() {
    let sandbox = Sandbox::new();
    sandbox.install_local_backend();
    // A plain file where the log directory should be
    fs::write(sandbox.root().join("logs"), "").unwrap();

    let output = sandbox.run(r#"{"message": "Task complete"}"#, &["--notify"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty());
    assert!(
        output.stderr.is_empty(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}
