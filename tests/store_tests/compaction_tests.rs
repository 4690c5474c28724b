//! Tests for space accounting and compaction
//!
//! These tests verify:
//! - Used / free word accounting, page tails included
//! - Checked writes fail with NoSpaceInFlash and leave the store unchanged
//! - Compaction drops tombstones and keeps live records intact
//! - The write-until-full / compact / retry cycle

use fdstore::config::UpdateMode;
use fdstore::{Config, FdsError, RecordStore, Status};

const PAGE_WORDS: usize = 64;
const PAGES: usize = 3;

// =============================================================================
// Helper Functions
// =============================================================================

fn store_with_mode(mode: UpdateMode) -> RecordStore {
    let config = Config::builder()
        .virtual_page_size(PAGE_WORDS)
        .virtual_pages(PAGES)
        .update_mode(mode)
        .build();
    RecordStore::format(&config).unwrap()
}

fn empty_store() -> RecordStore {
    store_with_mode(UpdateMode::InPlace)
}

/// Write 16-byte records (7-word slots) until a checked write fails
fn fill(store: &mut RecordStore) -> usize {
    let mut k = 0;
    loop {
        let data = format!("Hello World {}.", k);
        match store.write_record_checked(100, 6, data.as_bytes()) {
            Ok(_) => k += 1,
            Err(FdsError::NoSpaceInFlash(_)) => return k,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }
}

// =============================================================================
// Accounting Tests
// =============================================================================

#[test]
fn test_empty_store_accounting() {
    let store = empty_store();
    assert_eq!(store.capacity_words(), 124);
    assert_eq!(store.used_words(), 0);
    assert_eq!(store.free_words(), 124);
    assert!(store.fits());
}

#[test]
fn test_used_words_counts_headers_and_payload() {
    let mut store = empty_store();
    store.write_record(100, 6, b"Hello World.").unwrap();
    assert_eq!(store.used_words(), 6);
    store.write_record(100, 6, b"Hello World2.").unwrap();
    assert_eq!(store.used_words(), 13);
}

#[test]
fn test_used_words_counts_page_tail_waste() {
    let mut store = empty_store();
    // 8 slots of 7 words leave 6 unusable words on page 1
    for i in 0..9 {
        store.write_record(1, 1, &[i; 16]).unwrap();
    }
    assert_eq!(store.used_words(), 62 + 7);
}

#[test]
fn test_deleted_records_still_use_space() {
    let mut store = empty_store();
    let id = store.write_record(1, 1, &[0u8; 16]).unwrap();
    store.delete_record(id).unwrap();

    assert!(store.is_empty());
    assert_eq!(store.used_words(), 7);
    assert_eq!(store.tombstone_words(), 7);
}

// =============================================================================
// Checked Write Tests
// =============================================================================

#[test]
fn test_checked_write_fills_image_exactly() {
    let mut store = empty_store();
    let k = fill(&mut store);
    // 8 slots per data page, two data pages
    assert_eq!(k, 16);
    assert_eq!(store.len(), 16);
    assert!(store.serialize().is_ok());
}

#[test]
fn test_checked_write_failure_leaves_store_unchanged() {
    let mut store = empty_store();
    fill(&mut store);
    let dir_before = store.dir();
    let used_before = store.used_words();

    let err = store
        .write_record_checked(1, 1, b"This data won't fit.")
        .unwrap_err();
    assert_eq!(err.status(), Status::NoSpaceInFlash);
    assert_eq!(store.dir(), dir_before);
    assert_eq!(store.used_words(), used_before);

    // The failed write did not consume an id
    let freed = dir_before[0];
    store.delete_record(freed).unwrap();
    store.compact();
    let id = store.write_record_checked(1, 1, b"fits").unwrap();
    assert_eq!(id, dir_before.last().unwrap() + 1);
}

#[test]
fn test_checked_update_failure_in_append_mode() {
    let mut store = store_with_mode(UpdateMode::Append);
    fill(&mut store);
    let target = store.dir()[0];

    let err = store.update_record_checked(target, b"new data").unwrap_err();
    assert_eq!(err.status(), Status::NoSpaceInFlash);
    assert!(store.dir().contains(&target));
}

#[test]
fn test_checked_update_in_place_shrinking() {
    let mut store = empty_store();
    fill(&mut store);
    let target = store.dir()[3];

    let id = store.update_record_checked(target, b"tiny").unwrap();
    assert_eq!(id, target);
    assert_eq!(store.read_record(target).unwrap().2, b"tiny");
}

// =============================================================================
// Compaction Tests
// =============================================================================

#[test]
fn test_compact_without_tombstones_is_noop() {
    let mut store = empty_store();
    let k = fill(&mut store);
    let before = store.read_all();

    assert_eq!(store.compact(), 0);
    assert_eq!(store.len(), k);
    assert_eq!(store.read_all(), before);
}

#[test]
fn test_compact_reclaims_tombstones() {
    let mut store = empty_store();
    let a = store.write_record(1, 1, &[1u8; 16]).unwrap();
    let b = store.write_record(2, 1, &[2u8; 16]).unwrap();
    let c = store.write_record(3, 1, &[3u8; 16]).unwrap();
    store.delete_record(b).unwrap();

    assert_eq!(store.compact(), 7);
    assert_eq!(store.dir(), vec![a, c]);
    assert_eq!(store.used_words(), 14);
    assert_eq!(store.tombstone_words(), 0);
    assert_eq!(store.read_record(c).unwrap().2, vec![3u8; 16]);
}

#[test]
fn test_exhaustion_then_reclaim() {
    let mut store = empty_store();
    let first = store.write_record_checked(100, 6, b"Hello World.").unwrap();
    let k = fill(&mut store);
    assert_eq!(store.len(), 1 + k);

    store.compact();
    assert_eq!(store.len(), 1 + k);

    // Delete everything, then a large record only fits once space is reclaimed
    store.delete_file(6);
    assert!(store.is_empty());
    let big = [0x5A; 64];
    let err = store.write_record_checked(1234, 8, &big).unwrap_err();
    assert_eq!(err.status(), Status::NoSpaceInFlash);

    store.compact();
    let id = store.write_record_checked(1234, 8, &big).unwrap();
    assert!(id > first);
    assert_eq!(store.dir(), vec![id]);
}
