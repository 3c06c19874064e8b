//! End-to-end detection scenarios over synthetic inputs.

mod common;

use common::*;
use zmf::{detect, is_supported, DocumentKind, DocumentType};

fn minimal_draw_document() -> Vec<u8> {
    zmf4_document(&[
        object(DOCUMENT_SETTINGS, NO_ID, &document_settings_body(), &[]),
        object(PAGE_START, NO_ID, &[], &[]),
        object(PAGE_END, NO_ID, &[], &[]),
        object(PAGE_START, NO_ID, &[], &[]),
        object(PAGE_END, NO_ID, &[], &[]),
    ])
}

#[test]
fn detects_zebra() {
    assert_eq!(
        detect(&zbr_document(4)),
        Some((DocumentType::Zebra, DocumentKind::Draw))
    );
}

#[test]
fn rejects_unknown_zebra_versions() {
    assert_eq!(detect(&zbr_document(5)), None);
}

#[test]
fn detects_flat_draw() {
    assert_eq!(
        detect(&minimal_draw_document()),
        Some((DocumentType::Draw, DocumentKind::Draw))
    );
}

#[test]
fn detects_draw_in_a_deflated_container() {
    let container = zip_container("content.zmf", &minimal_draw_document(), false);
    assert_eq!(
        detect(&container),
        Some((DocumentType::Draw, DocumentKind::Draw))
    );
}

#[test]
fn detects_draw_in_a_stored_container() {
    let container = zip_container("content.zmf", &minimal_draw_document(), true);
    assert_eq!(
        detect(&container),
        Some((DocumentType::Draw, DocumentKind::Draw))
    );
}

#[test]
fn detects_bitmap() {
    let bmi = bmi_document(2, 2, &[[255, 0, 0]; 4], None);
    assert_eq!(
        detect(&bmi),
        Some((DocumentType::Bitmap, DocumentKind::Paint))
    );
}

#[test]
fn rejects_a_container_without_content() {
    let container = zip_container("mimetype", b"application/zip", true);
    assert_eq!(detect(&container), None);
    assert!(!is_supported(&container));
}

#[test]
fn rejects_arbitrary_input() {
    assert_eq!(detect(&[]), None);
    assert_eq!(detect(b"not a drawing at all, sorry"), None);
    assert_eq!(detect(&[0u8; 200]), None);
}

#[test]
fn detection_is_deterministic() {
    let inputs = [
        minimal_draw_document(),
        zbr_document(1),
        bmi_document(1, 1, &[[0, 0, 0]], None),
        b"garbage".to_vec(),
    ];

    for input in &inputs {
        assert_eq!(detect(input), detect(input));
    }
}

#[test]
fn bitmap_region_count_bounds_detection() {
    let mut bmi = bmi_document(2, 2, &[[255, 0, 0]; 4], None);
    // Force the region count to 0.
    bmi[19] = 0;
    bmi[20] = 0;
    assert_eq!(detect(&bmi), None);

    let mut bmi = bmi_document(2, 2, &[[255, 0, 0]; 4], None);
    bmi[19] = 7;
    assert_eq!(detect(&bmi), None);
}
