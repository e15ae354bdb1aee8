// myhttp/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread;
use tempfile::{NamedTempFile, TempDir};

/// Command isolated from the caller's environment and config files.
fn myhttp(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("myhttp").unwrap();
    cmd.current_dir(workdir.path())
        .env("HOME", workdir.path())
        .env("XDG_CONFIG_HOME", workdir.path())
        .env_remove("RUST_LOG");
    for var in [
        "MYHTTP_PARALLEL",
        "MYHTTP_TIMEOUT",
        "MYHTTP_ALGORITHM",
        "MYHTTP_FILE",
        "MYHTTP_CONFIG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

/// Answers every request with `body` until the test process exits.
fn serve_body(body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).map(|n| n > 0).unwrap_or(false) {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}", addr)
}

fn create_url_file(urls: &[&str]) -> NamedTempFile {
    let file = NamedTempFile::new().expect("Failed to create temp file");
    fs::write(file.path(), urls.join("\n")).expect("Failed to write to temp file");
    file
}

#[test]
fn test_help_lists_flags() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--algorithm"))
        .stdout(predicate::str::contains("--file"));
}

#[test]
fn test_no_urls_prints_nothing() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir).assert().success().stdout("");
}

#[test]
fn test_invalid_urls_are_skipped() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["ftp://example.com", "", "http://"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_verbose_reports_skipped_urls() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--verbose", "ftp://example.com"])
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("1 invalid URL"))
        .stderr(predicate::str::contains("0 written"));
}

#[test]
fn test_zero_parallel_is_rejected() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--parallel", "0", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parallel count must be between"));
}

#[test]
fn test_unknown_algorithm_is_rejected() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--algorithm", "crc32", "example.com"])
        .assert()
        .failure();
}

#[test]
fn test_bad_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--timeout", "forever", "example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timeout"));
}

#[test]
fn test_missing_url_file_fails() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--file", "/nonexistent/urls.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read URL list"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    myhttp(&dir)
        .args(["--config", "/nonexistent/myhttp.toml", "example.com"])
        .assert()
        .failure();
}

#[test]
fn test_fetches_local_server() {
    let dir = TempDir::new().unwrap();
    let base = serve_body("my request");

    myhttp(&dir)
        .args(["-p", "2", &base])
        .assert()
        .success()
        .stdout(format!("{} 0a44cf32bcd5f63fc5e047e25f991f97\n", base));
}

#[test]
fn test_url_file_and_args_are_combined() {
    let dir = TempDir::new().unwrap();
    let base = serve_body("my request");
    let first = format!("{}/one", base);
    let second = format!("{}/two", base);
    let file = create_url_file(&["# local urls", &second, ""]);

    let output = myhttp(&dir)
        .args(["--file", file.path().to_str().unwrap(), &first])
        .output()
        .unwrap();

    assert!(output.status.success());
    let mut lines: Vec<String> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect();
    lines.sort();
    assert_eq!(
        lines,
        vec![
            format!("{} 0a44cf32bcd5f63fc5e047e25f991f97", first),
            format!("{} 0a44cf32bcd5f63fc5e047e25f991f97", second),
        ]
    );
}

#[test]
fn test_algorithm_from_config_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("myhttp.toml"),
        "[defaults]\nalgorithm = \"sha256\"\n",
    )
    .unwrap();
    let base = serve_body("abc");

    myhttp(&dir)
        .arg(&base)
        .assert()
        .success()
        .stdout(format!(
            "{} ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad\n",
            base
        ));
}

#[test]
fn test_cli_algorithm_beats_env() {
    let dir = TempDir::new().unwrap();
    let base = serve_body("my request");

    myhttp(&dir)
        .env("MYHTTP_ALGORITHM", "sha512")
        .args(["--algorithm", "md5", &base])
        .assert()
        .success()
        .stdout(format!("{} 0a44cf32bcd5f63fc5e047e25f991f97\n", base));
}
