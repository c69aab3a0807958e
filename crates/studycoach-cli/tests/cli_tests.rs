//! CLI integration tests using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn studycoach() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("studycoach").unwrap();
    cmd.env_remove("GROQ_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

const RAW_RESPONSE: &str = r#"Sure! Here is your quiz:

```json
[
  {"question": "Which keyword moves ownership into a closure?", "options": ["ref", "move", "mut", "dyn"], "answer": "move"},
  {"question": "What does `?` do?", "options": ["Panics", "Propagates errors", "Clones", "Loops"], "answer": "propagates"},
  {"question": "Broken", "options": ["A", "B"], "answer": "A"}
]
```

Good luck!"#;

const HISTORY: &str = r#"[
  {"topic": "Rust", "score": 4, "total": 5, "date": "2026-03-01 09:15", "duration": "62s"},
  {"topic": "Calculus", "score": 1, "total": 5, "date": "2026-03-02 18:40", "duration": "70s"},
  {"topic": "Rust", "score": 5, "total": 5, "date": "2026-03-03 07:05", "duration": "48s"}
]"#;

#[test]
fn init_creates_files() {
    let dir = TempDir::new().unwrap();

    studycoach()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created studycoach.toml"))
        .stdout(predicate::str::contains("Created .env.example"));

    assert!(dir.path().join("studycoach.toml").exists());
    assert!(dir.path().join(".env.example").exists());
}

#[test]
fn init_skips_existing() {
    let dir = TempDir::new().unwrap();

    // First init
    studycoach()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success();

    // Second init should skip
    studycoach()
        .current_dir(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn check_salvages_fenced_response() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("response.txt");
    std::fs::write(&path, RAW_RESPONSE).unwrap();

    studycoach()
        .arg("check")
        .arg("--file")
        .arg(&path)
        .arg("--expected")
        .arg("3")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compiled 2 of 3 question(s)"))
        .stdout(predicate::str::contains("* 2) Propagates errors"))
        .stdout(predicate::str::contains("REPAIRED"))
        .stdout(predicate::str::contains("[2] DROPPED"));
}

#[test]
fn check_rejects_prose() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("response.txt");
    std::fs::write(&path, "I'm sorry, I can't write a quiz about that.").unwrap();

    studycoach()
        .arg("check")
        .arg("--file")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("malformed quiz payload"));
}

#[test]
fn check_nonexistent_file() {
    studycoach()
        .arg("check")
        .arg("--file")
        .arg("no_such_response.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn stats_prints_analytics() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, HISTORY).unwrap();

    studycoach()
        .arg("stats")
        .arg("--history")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("66.7%"))
        .stdout(predicate::str::contains("Calculus"))
        .stdout(predicate::str::contains("2026-03-02 18:40"))
        .stdout(predicate::str::contains("9/10"));
}

#[test]
fn stats_writes_html() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    let html = dir.path().join("progress.html");
    std::fs::write(&path, HISTORY).unwrap();

    studycoach()
        .arg("stats")
        .arg("--history")
        .arg(&path)
        .arg("--html")
        .arg(&html)
        .assert()
        .success();

    let content = std::fs::read_to_string(&html).unwrap();
    assert!(content.contains("<!DOCTYPE html>"));
    assert!(content.contains("Calculus"));
}

#[test]
fn stats_empty_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, "[]").unwrap();

    studycoach()
        .arg("stats")
        .arg("--history")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("No quiz history yet"));
}

#[test]
fn stats_rejects_bad_history() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.json");
    std::fs::write(&path, r#"[{"topic": "Rust"}]"#).unwrap();

    studycoach()
        .arg("stats")
        .arg("--history")
        .arg(&path)
        .assert()
        .failure();
}

#[test]
fn quiz_rejects_out_of_range_questions() {
    let dir = TempDir::new().unwrap();

    studycoach()
        .current_dir(dir.path())
        .args(["quiz", "--topic", "Rust", "--questions", "20"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("questions must be between 3 and 10"));
}

#[test]
fn quiz_rejects_out_of_range_time() {
    let dir = TempDir::new().unwrap();

    studycoach()
        .current_dir(dir.path())
        .args(["quiz", "--topic", "Rust", "--time-per-question", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "time-per-question must be between 10 and 30",
        ));
}

#[test]
fn plan_rejects_out_of_range_days() {
    let dir = TempDir::new().unwrap();

    studycoach()
        .current_dir(dir.path())
        .args(["plan", "--topic", "Rust", "--days", "90"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("days must be between 1 and 60"));
}

#[test]
fn plan_rejects_unknown_difficulty() {
    studycoach()
        .args(["plan", "--topic", "Rust", "--difficulty", "impossible"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown difficulty"));
}

#[test]
fn plan_without_provider_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("studycoach.toml");
    std::fs::write(&config, "default_provider = \"groq\"\n").unwrap();

    studycoach()
        .current_dir(dir.path())
        .args(["plan", "--topic", "Rust", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("provider 'groq' not found"));
}

#[test]
fn advice_rejects_score_above_total() {
    studycoach()
        .args(["advice", "--topic", "Rust", "--score", "6", "--total", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot exceed total"));
}

#[test]
fn list_models_with_key() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("studycoach.toml");
    std::fs::write(
        &config,
        "[providers.groq]\ntype = \"groq\"\napi_key = \"gsk-test\"\n",
    )
    .unwrap();

    studycoach()
        .current_dir(dir.path())
        .arg("list-models")
        .arg("--config")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Provider: groq (default)"))
        .stdout(predicate::str::contains("llama-3.1-8b-instant"));
}

#[test]
fn help_output() {
    studycoach()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("LLM study planner and timed quiz coach"));
}

#[test]
fn version_output() {
    studycoach()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("studycoach"));
}
