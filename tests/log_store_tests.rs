//! Tests for the Log Store
//!
//! These tests verify:
//! - Creating the log file on open
//! - Appending packets verbatim
//! - Chunked read-back from offset 0
//! - Persistence across reopen
//! - Removal

use std::path::PathBuf;

use packetlog::config::SyncStrategy;
use packetlog::store::LogStore;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("packets.log");
    (temp_dir, log_path)
}

fn collect_chunks(store: &mut LogStore, chunk_size: usize) -> Vec<Vec<u8>> {
    let mut chunks = store.chunks(chunk_size).unwrap();
    let mut out = Vec::new();
    while let Some(chunk) = chunks.next_chunk().unwrap() {
        out.push(chunk.to_vec());
    }
    out
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_file() {
    let (_temp, log_path) = setup_temp_log();
    assert!(!log_path.exists());

    let store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();

    assert!(log_path.exists());
    assert_eq!(store.path(), log_path.as_path());
    assert!(store.is_empty().unwrap());
}

#[test]
fn test_open_missing_directory_fails() {
    let (temp, _) = setup_temp_log();
    let bad_path = temp.path().join("no_such_dir").join("packets.log");

    let err = LogStore::open(&bad_path, SyncStrategy::Never).err().unwrap();

    assert!(err.to_string().starts_with("open data file : "));
}

// =============================================================================
// Append Tests
// =============================================================================

#[test]
fn test_append_returns_bytes_written() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::EveryAppend).unwrap();

    let written = store.append(b"hello\n").unwrap();

    assert_eq!(written, 6);
    assert_eq!(store.len().unwrap(), 6);
}

#[test]
fn test_append_concatenates() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();

    store.append(b"hello\n").unwrap();
    store.append(b"world\n").unwrap();

    assert_eq!(store.read_all().unwrap(), b"hello\nworld\n");
}

#[test]
fn test_append_after_read_goes_to_end() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();

    store.append(b"first\n").unwrap();
    // rewinds the file offset
    let _ = store.read_all().unwrap();
    store.append(b"second\n").unwrap();

    assert_eq!(store.read_all().unwrap(), b"first\nsecond\n");
}

#[test]
fn test_append_binary_payload() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();

    let payload: Vec<u8> = (0u8..=255).chain(std::iter::once(b'\n')).collect();
    store.append(&payload).unwrap();

    assert_eq!(store.read_all().unwrap(), payload);
}

// =============================================================================
// Chunked Read Tests
// =============================================================================

#[test]
fn test_chunks_empty_log() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();

    assert!(collect_chunks(&mut store, 512).is_empty());
}

#[test]
fn test_chunks_respect_chunk_size() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();
    store.append(b"0123456789\n").unwrap();

    let chunks = collect_chunks(&mut store, 4);

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0], b"0123");
    assert_eq!(chunks[1], b"4567");
    assert_eq!(chunks[2], b"89\n");
}

#[test]
fn test_chunks_always_start_at_zero() {
    let (_temp, log_path) = setup_temp_log();
    let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();
    store.append(b"abc\n").unwrap();

    let first: Vec<u8> = collect_chunks(&mut store, 2).concat();
    let second: Vec<u8> = collect_chunks(&mut store, 3).concat();

    assert_eq!(first, b"abc\n");
    assert_eq!(second, b"abc\n");
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_keeps_content() {
    let (_temp, log_path) = setup_temp_log();

    {
        let mut store = LogStore::open(&log_path, SyncStrategy::EveryAppend).unwrap();
        store.append(b"before crash\n").unwrap();
    }

    let mut store = LogStore::open(&log_path, SyncStrategy::EveryAppend).unwrap();
    store.append(b"after restart\n").unwrap();

    assert_eq!(store.read_all().unwrap(), b"before crash\nafter restart\n");
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_deletes_file() {
    let (_temp, log_path) = setup_temp_log();
    {
        let mut store = LogStore::open(&log_path, SyncStrategy::Never).unwrap();
        store.append(b"x\n").unwrap();
    }

    LogStore::remove(&log_path).unwrap();

    assert!(!log_path.exists());
}

#[test]
fn test_remove_missing_file_is_ok() {
    let (_temp, log_path) = setup_temp_log();

    LogStore::remove(&log_path).unwrap();
    LogStore::remove(&log_path).unwrap();
}
