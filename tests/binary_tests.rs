//! Server Binary Tests
//!
//! Runs the real `packetlog-server` process to check signal-driven
//! shutdown, exit status and log file removal.

use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use packetlog::network::send_packet;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn spawn_server(port: u16, data_file: &Path) -> Child {
    Command::new(env!("CARGO_BIN_EXE_packetlog-server"))
        .args(["--bind", "127.0.0.1", "--log-target", "stderr", "--no-sync"])
        .arg("--port")
        .arg(port.to_string())
        .arg("--data-file")
        .arg(data_file)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

/// Wait until the server accepts connections. Each probe is a session that
/// closes before sending anything, which leaves the log untouched.
fn wait_for_listen(port: u16) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(20));
    }
    panic!("server did not start listening on port {}", port);
}

fn wait_for_exit(child: &mut Child) -> ExitStatus {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        thread::sleep(Duration::from_millis(20));
    }
    let _ = child.kill();
    panic!("server did not exit");
}

fn send_signal(child: &Child, signo: i32) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, signo) };
    assert_eq!(rc, 0);
}

// =============================================================================
// Signal Tests
// =============================================================================

#[test]
fn test_sigterm_removes_log_and_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("aesdsocketdata");
    let port = free_port();

    let mut child = spawn_server(port, &data_file);
    wait_for_listen(port);

    assert_eq!(send_packet(("127.0.0.1", port), b"hello\n").unwrap(), b"hello\n");
    assert_eq!(
        send_packet(("127.0.0.1", port), b"world\n").unwrap(),
        b"hello\nworld\n"
    );
    assert!(data_file.exists());

    send_signal(&child, libc::SIGTERM);
    let status = wait_for_exit(&mut child);

    assert!(status.success(), "exit status: {:?}", status);
    assert!(!data_file.exists());
}

#[test]
fn test_sigint_while_idle_exits_zero() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("aesdsocketdata");
    let port = free_port();

    let mut child = spawn_server(port, &data_file);
    wait_for_listen(port);
    thread::sleep(Duration::from_millis(100));

    send_signal(&child, libc::SIGINT);
    let status = wait_for_exit(&mut child);

    assert!(status.success(), "exit status: {:?}", status);
    assert!(!data_file.exists());
}

#[test]
fn test_leftover_log_is_echoed_after_restart() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("aesdsocketdata");
    // what a killed process leaves behind
    std::fs::write(&data_file, b"survivor\n").unwrap();
    let port = free_port();

    let mut child = spawn_server(port, &data_file);
    wait_for_listen(port);

    let echo = send_packet(("127.0.0.1", port), b"fresh\n").unwrap();
    assert_eq!(echo, b"survivor\nfresh\n");

    send_signal(&child, libc::SIGTERM);
    assert!(wait_for_exit(&mut child).success());
}

// =============================================================================
// Fatal Error Tests
// =============================================================================

#[test]
fn test_bind_failure_exits_nonzero_and_cleans_up() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("aesdsocketdata");
    std::fs::write(&data_file, b"stale\n").unwrap();

    let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut child = spawn_server(port, &data_file);
    let status = wait_for_exit(&mut child);

    assert!(!status.success());
    assert!(!data_file.exists());
    drop(occupied);
}

#[test]
fn test_invalid_chunk_size_exits_nonzero() {
    let temp_dir = TempDir::new().unwrap();
    let data_file = temp_dir.path().join("aesdsocketdata");

    let status = Command::new(env!("CARGO_BIN_EXE_packetlog-server"))
        .args(["--bind", "127.0.0.1", "--log-target", "stderr", "--chunk-size", "0"])
        .arg("--port")
        .arg(free_port().to_string())
        .arg("--data-file")
        .arg(&data_file)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert!(!status.success());
}
