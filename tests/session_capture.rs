mod common;

use photostrip::{BoothError, CaptureSession, ExportFormat, Rgba8};

use common::{encoded, png};

#[test]
fn add_until_full_then_reject_without_mutation() {
    let mut s = CaptureSession::new(2).unwrap();
    assert!(s.is_empty());
    s.add_photo(png(4, 3, Rgba8::WHITE), None).unwrap();
    assert!(s.can_add_more());
    s.add_photo(png(4, 3, Rgba8::BLACK), Some("bw")).unwrap();
    assert!(s.is_complete());
    assert!(!s.can_add_more());
    assert_eq!(s.progress(), 100.0);

    let ids: Vec<String> = s.photos().iter().map(|p| p.id.clone()).collect();
    let err = s.add_photo(png(1, 1, Rgba8::WHITE), None).unwrap_err();
    assert!(matches!(err, BoothError::CaptureLimitExceeded { max: 2 }));
    let after: Vec<String> = s.photos().iter().map(|p| p.id.clone()).collect();
    assert_eq!(ids, after);
}

#[test]
fn invalid_data_is_rejected_without_mutation() {
    let mut s = CaptureSession::new(3).unwrap();
    s.add_photo(png(2, 2, Rgba8::WHITE), None).unwrap();

    for bad in [Vec::new(), b"GIF89a not really".to_vec(), b"hello".to_vec()] {
        let err = s.add_photo(bad, None).unwrap_err();
        assert!(matches!(err, BoothError::InvalidPhotoData(_)));
    }
    assert_eq!(s.len(), 1);
}

#[test]
fn jpeg_and_webp_metadata() {
    let mut s = CaptureSession::new(3).unwrap();
    let jpeg = encoded(12, 9, Rgba8::rgb(1, 2, 3), image::ImageFormat::Jpeg);
    let webp = encoded(5, 6, Rgba8::rgb(1, 2, 3), image::ImageFormat::WebP);

    let meta = s.add_photo(jpeg.clone(), None).unwrap().metadata;
    assert_eq!(meta.format, ExportFormat::Jpeg);
    assert_eq!((meta.width, meta.height, meta.byte_size), (12, 9, jpeg.len()));

    let meta = s.add_photo(webp, None).unwrap().metadata;
    assert_eq!(meta.format, ExportFormat::Webp);
    assert_eq!((meta.width, meta.height), (5, 6));
}

#[test]
fn remove_and_replace_check_bounds() {
    let mut s = CaptureSession::new(4).unwrap();
    s.add_photo(png(1, 1, Rgba8::WHITE), None).unwrap();
    s.add_photo(png(2, 2, Rgba8::WHITE), None).unwrap();

    let err = s.remove_photo(2).unwrap_err();
    assert!(matches!(err, BoothError::IndexOutOfRange { index: 2, len: 2 }));
    let err = s
        .replace_photo(5, png(1, 1, Rgba8::WHITE), None)
        .unwrap_err();
    assert!(matches!(err, BoothError::IndexOutOfRange { index: 5, len: 2 }));
    assert_eq!(s.len(), 2);

    let old_id = s.photos()[1].id.clone();
    let replaced = s
        .replace_photo(1, png(3, 3, Rgba8::BLACK), Some("retro"))
        .unwrap();
    assert_eq!(replaced.id, old_id);
    assert_ne!(s.photos()[1].id, old_id);
    assert_eq!(s.photos()[1].metadata.width, 3);
    assert_eq!(s.photos()[1].applied_filter_id.as_deref(), Some("retro"));

    let err = s.replace_photo(0, Vec::new(), None).unwrap_err();
    assert!(matches!(err, BoothError::InvalidPhotoData(_)));
    assert_eq!(s.photos()[0].metadata.width, 1);

    let removed = s.remove_photo(0).unwrap();
    assert_eq!(removed.metadata.width, 1);
    assert_eq!(s.len(), 1);

    s.clear();
    assert!(s.is_empty());
    assert_eq!(s.progress(), 0.0);
}
