//! Интеграционные тесты бинарника: мок-сервер на 127.0.0.1 + проверка
//! stdout/stderr и кодов возврата.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

const WAIT: Duration = Duration::from_secs(2);

fn read_query(stream: &mut TcpStream) -> Vec<u8> {
    let mut query = Vec::new();
    let mut byte = [0u8; 1];
    while stream.read(&mut byte).unwrap_or(0) == 1 {
        query.push(byte[0]);
        if query.ends_with(b"\r\n") {
            break;
        }
    }
    query
}

/// Сервер на один запрос; возвращает порт и канал с прочитанным запросом.
fn one_shot_server(body: &'static [u8]) -> (u16, crossbeam_channel::Receiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let query = read_query(&mut stream);
        stream.write_all(body).ok();
        tx.send(query).ok();
    });

    (port, rx)
}

fn finger_client() -> Command {
    Command::cargo_bin("finger-client").unwrap()
}

#[test]
fn version_flag_prints_version() {
    finger_client()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("finger-client"));
}

#[test]
fn help_flag_shows_usage() {
    finger_client()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn missing_host_fails_with_exit_code_1() {
    finger_client()
        .arg("alice")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no host specified"));
}

#[test]
fn prints_response_body_to_stdout() {
    let (port, seen) = one_shot_server(b"Login: alice\r\nName: Alice Smith\r\n");

    finger_client()
        .args(["--host", "127.0.0.1", "--port", &port.to_string(), "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Login: alice"));

    assert_eq!(seen.recv_timeout(WAIT).unwrap(), b"alice\r\n");
}

#[test]
fn whois_flag_prepends_verbose_marker_on_the_wire() {
    let (port, seen) = one_shot_server(b"Verbose output\r\n");

    finger_client()
        .args(["--host", "127.0.0.1", "-p", &port.to_string(), "-W", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Verbose output"));

    assert_eq!(seen.recv_timeout(WAIT).unwrap(), b"/W alice\r\n");
}

#[test]
fn empty_query_lists_users() {
    let (port, seen) = one_shot_server(b"alice\r\nbob\r\n");

    finger_client()
        .args(["--host", "127.0.0.1", "-p", &port.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("alice").and(predicate::str::contains("bob")));

    // пустой запрос — это просто CRLF
    assert_eq!(seen.recv_timeout(WAIT).unwrap(), b"\r\n");
}

#[test]
fn timeout_fails_with_exit_code_1() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_query(&mut stream);
        // молчим: клиент должен сам закрыть сокет по таймауту
        let mut buf = [0u8; 1];
        let _ = stream.read(&mut buf);
    });

    finger_client()
        .args(["--host", "127.0.0.1", "-p", &port.to_string(), "-t", "0.3", "alice"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no response within"));

    server.join().unwrap();
}

#[test]
fn connection_refused_fails_with_exit_code_1() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    finger_client()
        .args(["--host", "127.0.0.1", "-p", &port.to_string(), "alice"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("connection failed"));
}

#[test]
fn control_characters_are_rejected_before_connecting() {
    // хост валидный, но соединения быть не должно: запрос бракуется раньше
    finger_client()
        .args(["--host", "127.0.0.1", "ali\tce"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("control character"));
}

#[test]
fn invalid_timeout_is_rejected() {
    finger_client()
        .args(["--host", "127.0.0.1", "-t", "0", "alice"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--timeout"));
}
