//! Exercises the built `devtrans` binary end to end.

use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn devtrans(args: &[&str], base_url: &str, token: &str, cwd: &std::path::Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_devtrans"))
        .args(args)
        .current_dir(cwd)
        .env("DEVTRANS_BASE_URL", base_url)
        .env("DEVTRANS_TOKEN", token)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run devtrans")
}

#[test]
fn no_arguments_prints_usage_and_fails() {
    let dir = TempDir::new().unwrap();
    let out = devtrans(&[], "http://127.0.0.1:9", "t", dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage: devtrans"));
}

#[test]
fn unknown_command_prints_usage_and_fails() {
    let dir = TempDir::new().unwrap();
    let out = devtrans(&["delete", "abc"], "http://127.0.0.1:9", "t", dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Usage: devtrans"));
}

#[tokio::test(flavor = "multi_thread")]
async fn put_prints_code_block() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"code":"abc123","url":"http://x/abc123","expiry":"2024-01-01T00:00:00"}"#,
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    let base = server.uri();
    let cwd = dir.path().to_path_buf();
    let out = tokio::task::spawn_blocking(move || {
        devtrans(&["put", "notes.txt"], &base, "secret", &cwd)
    })
    .await
    .unwrap();

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Code:   abc123"), "{stdout}");
    assert!(stdout.contains("2024-01-01 00:00 UTC"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn put_server_error_exits_nonzero() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    let base = server.uri();
    let cwd = dir.path().to_path_buf();
    let out = tokio::task::spawn_blocking(move || {
        devtrans(&["put", "notes.txt"], &base, "secret", &cwd)
    })
    .await
    .unwrap();

    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("500"), "{stderr}");
    assert!(stderr.contains("disk full"), "{stderr}");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_saves_into_working_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Filename", "report.pdf")
                .set_body_bytes(b"%PDF-1.7".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let base = server.uri();
    let cwd = dir.path().to_path_buf();
    let out = tokio::task::spawn_blocking(move || {
        devtrans(&["get", "abc123"], &base, "", &cwd)
    })
    .await
    .unwrap();

    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("Saved report.pdf"));
    assert_eq!(std::fs::read(dir.path().join("report.pdf")).unwrap(), b"%PDF-1.7");
}

#[tokio::test(flavor = "multi_thread")]
async fn put_prints_upgrade_hint_when_server_is_newer() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"code":"abc123","url":"http://x/abc123","expiry":"2024-01-01T00:00:00"}"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cli/version"))
        .respond_with(ResponseTemplate::new(200).set_body_string("9.9.9\n"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
    let base = server.uri();
    let cwd = dir.path().to_path_buf();
    let out = tokio::task::spawn_blocking(move || {
        devtrans(&["put", "notes.txt"], &base, "secret", &cwd)
    })
    .await
    .unwrap();

    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Code:   abc123"), "{stdout}");
    assert!(
        stdout.contains("New DevTrans version 9.9.9 available."),
        "{stdout}"
    );
    // stdout is a pipe here, so no colour escapes.
    assert!(!stdout.contains('\u{1b}'), "{stdout:?}");
}

#[tokio::test(flavor = "multi_thread")]
async fn get_without_header_stays_in_working_directory() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"payload".to_vec()))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let cwd = root.path().join("cwd");
    std::fs::create_dir(&cwd).unwrap();
    let outside = root.path().join("outside.txt");
    let code = outside.to_string_lossy().into_owned();
    let base = server.uri();
    let workdir = cwd.clone();
    let out = tokio::task::spawn_blocking(move || {
        devtrans(&["get", &code], &base, "", &workdir)
    })
    .await
    .unwrap();

    assert!(out.status.success());
    assert!(!outside.exists());
    assert_eq!(std::fs::read(cwd.join("outside.txt")).unwrap(), b"payload");
}
