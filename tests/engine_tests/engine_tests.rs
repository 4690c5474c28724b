//! Tests for Engine
//!
//! These tests verify:
//! - Operations before mount report NotInitialized
//! - Mount / unmount lifecycle
//! - Command execution
//! - Status code reporting
//! - Capacity enforcement on write and update

use fdstore::config::UpdateMode;
use fdstore::{image, Command, Config, Engine, FdsError, Reply, Status};

const PAGE_WORDS: usize = 64;
const PAGES: usize = 3;

// =============================================================================
// Helper Functions
// =============================================================================

fn small_config() -> Config {
    Config::builder()
        .virtual_page_size(PAGE_WORDS)
        .virtual_pages(PAGES)
        .build()
}

fn mounted_engine() -> Engine {
    let mut engine = Engine::new(small_config());
    engine.mount(&image::blank(PAGE_WORDS * PAGES * 4)).unwrap();
    engine
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_operations_before_mount() {
    let mut engine = Engine::new(small_config());
    assert!(!engine.is_mounted());

    assert_eq!(Engine::status_of(&engine.dir()), Status::NotInitialized);
    assert_eq!(Engine::status_of(&engine.read(1)), Status::NotInitialized);
    assert_eq!(
        Engine::status_of(&engine.write(1, 1, b"data")),
        Status::NotInitialized
    );
    assert_eq!(
        Engine::status_of(&engine.update(1, b"data")),
        Status::NotInitialized
    );
    assert_eq!(Engine::status_of(&engine.delete_record(1)), Status::NotInitialized);
    assert_eq!(Engine::status_of(&engine.delete_file(1)), Status::NotInitialized);
    assert_eq!(Engine::status_of(&engine.gc()), Status::NotInitialized);
    assert_eq!(Engine::status_of(&engine.image()), Status::NotInitialized);
    assert_eq!(Status::NotInitialized.code(), 2);
}

#[test]
fn test_mount_blank_image() {
    let engine = mounted_engine();
    assert!(engine.is_mounted());
    assert!(engine.dir().unwrap().is_empty());
}

#[test]
fn test_mount_failure_keeps_engine_unmounted() {
    let mut engine = Engine::new(Config::default());
    let result = engine.mount(&image::blank(768));
    assert!(matches!(result, Err(FdsError::NoPages(_))));
    assert!(!engine.is_mounted());
}

#[test]
fn test_unmount() {
    let mut engine = mounted_engine();
    engine.write(1, 1, b"data").unwrap();

    let store = engine.unmount().unwrap();
    assert_eq!(store.len(), 1);
    assert!(!engine.is_mounted());
    assert!(matches!(engine.dir(), Err(FdsError::NotInitialized(_))));
}

#[test]
fn test_format_creates_mounted_empty_image() {
    let engine = Engine::format(small_config()).unwrap();
    let bytes = engine.image().unwrap();
    assert_eq!(bytes.len(), 768);

    let mut remounted = Engine::new(Config::default());
    remounted.mount(&bytes).unwrap();
    assert!(remounted.dir().unwrap().is_empty());
}

#[test]
fn test_format_requires_geometry() {
    let result = Engine::format(Config::default());
    assert_eq!(Engine::status_of(&result), Status::NoPages);
}

#[test]
fn test_format_device_geometry() {
    let engine = Engine::format(Config::nrf52()).unwrap();
    assert_eq!(engine.image().unwrap().len(), 3 * 1024 * 4);
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_execute_command_sequence() {
    let mut engine = Engine::new(small_config());

    let reply = engine
        .execute(Command::Mount {
            image: image::blank(768),
        })
        .unwrap();
    assert_eq!(reply, Reply::Done);

    let id = match engine
        .execute(Command::Write {
            key: 100,
            file_id: 6,
            data: b"Hello World.".to_vec(),
        })
        .unwrap()
    {
        Reply::RecordId(id) => id,
        other => panic!("unexpected reply {:?}", other),
    };

    assert_eq!(
        engine.execute(Command::Dir).unwrap(),
        Reply::RecordIds(vec![id])
    );
    assert_eq!(
        engine.execute(Command::Read { record_id: id }).unwrap(),
        Reply::Record {
            file_id: 6,
            key: 100,
            data: b"Hello World.".to_vec(),
        }
    );

    let updated = engine
        .execute(Command::Update {
            record_id: id,
            data: b"Goodbye".to_vec(),
        })
        .unwrap();
    assert_eq!(updated, Reply::RecordId(id));

    match engine.execute(Command::ReadAll).unwrap() {
        Reply::Records(entries) => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].data, b"Goodbye\0");
        }
        other => panic!("unexpected reply {:?}", other),
    }

    engine
        .execute(Command::DeleteRecord { record_id: id })
        .unwrap();
    assert_eq!(engine.execute(Command::Dir).unwrap(), Reply::RecordIds(vec![]));
    assert_eq!(engine.execute(Command::GarbageCollect).unwrap(), Reply::Done);
}

#[test]
fn test_execute_reports_errors() {
    let mut engine = mounted_engine();
    let result = engine.execute(Command::Read { record_id: 99 });
    assert_eq!(Engine::status_of(&result), Status::NotFound);

    let result = engine.execute(Command::DeleteFile { file_id: 3 });
    assert_eq!(Engine::status_of(&result), Status::Success);
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_write_fails_when_full() {
    let mut engine = mounted_engine();
    let mut written = 0;
    let status = loop {
        let result = engine.write(1, 1, &[0xEE; 16]);
        match Engine::status_of(&result) {
            Status::Success => written += 1,
            status => break status,
        }
    };
    assert_eq!(status, Status::NoSpaceInFlash);
    assert_eq!(written, 16);
    assert_eq!(engine.dir().unwrap().len(), 16);
    assert!(engine.image().is_ok());
}

#[test]
fn test_gc_then_retry_after_delete() {
    let mut engine = mounted_engine();
    while engine.write(1, 1, &[0xEE; 16]).is_ok() {}
    let ids = engine.dir().unwrap();

    engine.delete_record(ids[0]).unwrap();
    // The deleted record still occupies flash
    assert_eq!(
        Engine::status_of(&engine.write(2, 2, &[0xDD; 16])),
        Status::NoSpaceInFlash
    );

    engine.gc().unwrap();
    assert!(engine.write(2, 2, &[0xDD; 16]).is_ok());
}

#[test]
fn test_update_append_mode_through_engine() {
    let config = Config::builder()
        .virtual_page_size(PAGE_WORDS)
        .virtual_pages(PAGES)
        .update_mode(UpdateMode::Append)
        .build();
    let mut engine = Engine::format(config).unwrap();

    let id = engine.write(234, 66, b"This is the first data.").unwrap();
    let new_id = engine.update(id, b"This is the second data.").unwrap();
    assert_ne!(id, new_id);
    assert_eq!(engine.dir().unwrap(), vec![new_id]);

    let (file_id, key, data) = engine.read(new_id).unwrap();
    assert_eq!((file_id, key), (66, 234));
    assert_eq!(data, b"This is the second data.");
}
