//! Tests for page geometry
//!
//! These tests verify:
//! - Page-size inference on encoded images
//! - Inference failure on unaligned, truncated and irregular buffers
//! - Geometry resolution against explicit configuration

use fdstore::format::{encode_records, guess_page_size, Geometry};
use fdstore::{image, Config, FdsError, Record};

// =============================================================================
// Helper Functions
// =============================================================================

fn formatted(pages: usize, page_words: usize) -> Vec<u8> {
    let records = vec![
        Record::new(0, 6, 100, b"Hello World."),
        Record::new(0, 6, 101, b"Another one"),
    ];
    encode_records(&records, pages, page_words).unwrap()
}

// =============================================================================
// guess_page_size Tests
// =============================================================================

#[test]
fn test_guess_page_size_small_pages() {
    assert_eq!(guess_page_size(&formatted(3, 64)), Some(64));
}

#[test]
fn test_guess_page_size_device_pages() {
    assert_eq!(guess_page_size(&formatted(3, 1024)), Some(1024));
}

#[test]
fn test_guess_page_size_many_pages() {
    assert_eq!(guess_page_size(&formatted(8, 128)), Some(128));
}

#[test]
fn test_guess_page_size_truncated_image() {
    let mut image = formatted(3, 64);
    image.truncate(image.len() - 4);
    assert_eq!(guess_page_size(&image), None);
}

#[test]
fn test_guess_page_size_not_page_aligned() {
    let mut image = vec![0xFF; 256];
    image.extend_from_slice(&formatted(3, 64));
    assert_eq!(guess_page_size(&image), None);
}

#[test]
fn test_guess_page_size_irregular_page_length() {
    // 80-word pages are 320 bytes, not a multiple of 256
    assert_eq!(guess_page_size(&formatted(3, 80)), None);
}

#[test]
fn test_guess_page_size_blank_image() {
    assert_eq!(guess_page_size(&image::blank(768)), None);
}

#[test]
fn test_guess_page_size_empty_buffer() {
    assert_eq!(guess_page_size(&[]), None);
}

// =============================================================================
// Geometry Resolution Tests
// =============================================================================

#[test]
fn test_for_image_infers_everything() {
    let image = formatted(4, 64);
    let geometry = Geometry::for_image(&image, &Config::default()).unwrap();
    assert_eq!(geometry, Geometry::new(64, 4).unwrap());
}

#[test]
fn test_for_image_explicit_page_size_overrides_inference() {
    // A blank image cannot be inferred, but an explicit size works
    let config = Config::builder().virtual_page_size(64).build();
    let geometry = Geometry::for_image(&image::blank(768), &config).unwrap();
    assert_eq!(geometry.virtual_pages, 3);
}

#[test]
fn test_for_image_rejects_unaligned_length() {
    let config = Config::builder().virtual_page_size(64).build();
    let result = Geometry::for_image(&image::blank(700), &config);
    assert!(matches!(result, Err(FdsError::InvalidArgument(_))));
}

#[test]
fn test_for_image_rejects_partial_page() {
    let config = Config::builder().virtual_page_size(100).build();
    let result = Geometry::for_image(&image::blank(768), &config);
    assert!(matches!(result, Err(FdsError::InvalidArgument(_))));
}

#[test]
fn test_for_image_rejects_page_count_mismatch() {
    let config = Config::builder()
        .virtual_page_size(64)
        .virtual_pages(4)
        .build();
    let result = Geometry::for_image(&image::blank(768), &config);
    assert!(matches!(result, Err(FdsError::InvalidArgument(_))));
}

#[test]
fn test_for_image_uninferable() {
    let result = Geometry::for_image(&image::blank(768), &Config::default());
    assert!(matches!(result, Err(FdsError::NoPages(_))));
}

#[test]
fn test_for_image_empty() {
    let config = Config::builder().virtual_page_size(64).build();
    let result = Geometry::for_image(&[], &config);
    assert!(matches!(result, Err(FdsError::NoPages(_))));
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_geometry_capacity() {
    let geometry = Geometry::new(64, 3).unwrap();
    assert_eq!(geometry.page_bytes(), 256);
    assert_eq!(geometry.image_bytes(), 768);
    assert_eq!(geometry.page_capacity_words(), 62);
    assert_eq!(geometry.capacity_words(), 124);
    assert_eq!(geometry.max_record_words(), 59);
}

#[test]
fn test_geometry_rejects_tiny_pages() {
    assert!(matches!(Geometry::new(5, 3), Err(FdsError::InvalidArgument(_))));
    assert!(Geometry::new(6, 3).is_ok());
}

#[test]
fn test_geometry_rejects_zero_pages() {
    assert!(matches!(Geometry::new(64, 0), Err(FdsError::NoPages(_))));
}
