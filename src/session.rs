use std::{io::Cursor, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    error::{BoothError, BoothResult},
    export::ExportFormat,
};

/// Largest `max_photos` a session accepts.
pub const MAX_SESSION_PHOTOS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PhotoMetadata {
    pub width: u32,
    pub height: u32,
    pub byte_size: usize,
    pub format: ExportFormat,
}

/// One captured still: the encoded bytes plus what was read from its header.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Photo {
    pub id: String,
    #[serde(skip)]
    pub raw_data: Arc<[u8]>,
    pub captured_at: DateTime<Utc>,
    pub applied_filter_id: Option<String>,
    pub metadata: PhotoMetadata,
}

impl Photo {
    /// Reads format and dimensions from the header without decoding pixels.
    pub fn from_encoded(
        raw: impl Into<Arc<[u8]>>,
        applied_filter_id: Option<String>,
    ) -> BoothResult<Self> {
        let raw_data: Arc<[u8]> = raw.into();
        let metadata = read_metadata(&raw_data)?;
        Ok(Self {
            id: format!("photo_{}", uuid::Uuid::new_v4().simple()),
            raw_data,
            captured_at: Utc::now(),
            applied_filter_id,
            metadata,
        })
    }
}

fn read_metadata(raw: &[u8]) -> BoothResult<PhotoMetadata> {
    if raw.is_empty() {
        return Err(BoothError::invalid_photo("photo data is empty"));
    }
    let reader = image::ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| BoothError::invalid_photo(e.to_string()))?;
    let format = match reader.format() {
        Some(image::ImageFormat::Png) => ExportFormat::Png,
        Some(image::ImageFormat::Jpeg) => ExportFormat::Jpeg,
        Some(image::ImageFormat::WebP) => ExportFormat::Webp,
        Some(other) => {
            return Err(BoothError::invalid_photo(format!(
                "unsupported photo format {other:?}"
            )));
        }
        None => return Err(BoothError::invalid_photo("unrecognized photo format")),
    };
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| BoothError::invalid_photo(e.to_string()))?;
    Ok(PhotoMetadata {
        width,
        height,
        byte_size: raw.len(),
        format,
    })
}

/// Ordered photo store with a fixed capacity. Failed operations leave the
/// session unchanged.
#[derive(Clone, Debug)]
pub struct CaptureSession {
    photos: Vec<Photo>,
    max_photos: usize,
}

impl CaptureSession {
    pub fn new(max_photos: usize) -> BoothResult<Self> {
        if !(1..=MAX_SESSION_PHOTOS).contains(&max_photos) {
            return Err(BoothError::validation(format!(
                "max_photos must be within 1..={MAX_SESSION_PHOTOS}, got {max_photos}"
            )));
        }
        Ok(Self {
            photos: Vec::with_capacity(max_photos),
            max_photos,
        })
    }

    pub fn add_photo(
        &mut self,
        raw: impl Into<Arc<[u8]>>,
        filter_id: Option<&str>,
    ) -> BoothResult<&Photo> {
        if self.photos.len() >= self.max_photos {
            return Err(BoothError::CaptureLimitExceeded {
                max: self.max_photos,
            });
        }
        let photo = Photo::from_encoded(raw, filter_id.map(str::to_owned))?;
        tracing::debug!(id = %photo.id, count = self.photos.len() + 1, "photo added");
        self.photos.push(photo);
        let idx = self.photos.len() - 1;
        Ok(&self.photos[idx])
    }

    pub fn remove_photo(&mut self, index: usize) -> BoothResult<Photo> {
        self.check_index(index)?;
        Ok(self.photos.remove(index))
    }

    /// Swaps in a new capture at `index`; the replacement gets a fresh id.
    pub fn replace_photo(
        &mut self,
        index: usize,
        raw: impl Into<Arc<[u8]>>,
        filter_id: Option<&str>,
    ) -> BoothResult<Photo> {
        self.check_index(index)?;
        let photo = Photo::from_encoded(raw, filter_id.map(str::to_owned))?;
        Ok(std::mem::replace(&mut self.photos[index], photo))
    }

    pub fn clear(&mut self) {
        self.photos.clear();
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn max_photos(&self) -> usize {
        self.max_photos
    }

    pub fn is_complete(&self) -> bool {
        self.photos.len() >= self.max_photos
    }

    pub fn can_add_more(&self) -> bool {
        !self.is_complete()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Fill level in percent.
    pub fn progress(&self) -> f32 {
        self.photos.len() as f32 / self.max_photos as f32 * 100.0
    }

    pub fn photo_by_id(&self, id: &str) -> Option<&Photo> {
        self.photos.iter().find(|p| p.id == id)
    }

    pub fn photos_with_filter<'a>(&'a self, filter_id: &'a str) -> impl Iterator<Item = &'a Photo> {
        self.photos
            .iter()
            .filter(move |p| p.applied_filter_id.as_deref() == Some(filter_id))
    }

    /// Encoded bytes of every photo, in capture order.
    pub fn raw_sources(&self) -> Vec<Arc<[u8]>> {
        self.photos.iter().map(|p| p.raw_data.clone()).collect()
    }

    fn check_index(&self, index: usize) -> BoothResult<()> {
        if index >= self.photos.len() {
            return Err(BoothError::IndexOutOfRange {
                index,
                len: self.photos.len(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([9, 9, 9, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn metadata_comes_from_the_header() {
        let bytes = png(7, 5);
        let photo = Photo::from_encoded(bytes.clone(), Some("bw".to_owned())).unwrap();
        assert_eq!(photo.metadata.width, 7);
        assert_eq!(photo.metadata.height, 5);
        assert_eq!(photo.metadata.byte_size, bytes.len());
        assert_eq!(photo.metadata.format, ExportFormat::Png);
        assert!(photo.id.starts_with("photo_"));
    }

    #[test]
    fn max_photos_must_be_in_range() {
        assert!(CaptureSession::new(0).is_err());
        assert!(CaptureSession::new(11).is_err());
        assert!(CaptureSession::new(10).is_ok());
    }

    #[test]
    fn ids_are_unique() {
        let mut s = CaptureSession::new(3).unwrap();
        let a = s.add_photo(png(1, 1), None).unwrap().id.clone();
        let b = s.add_photo(png(1, 1), None).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn progress_and_filter_queries() {
        let mut s = CaptureSession::new(4).unwrap();
        assert_eq!(s.progress(), 0.0);
        s.add_photo(png(1, 1), Some("bw")).unwrap();
        s.add_photo(png(1, 1), None).unwrap();
        s.add_photo(png(1, 1), Some("bw")).unwrap();
        assert_eq!(s.progress(), 75.0);
        assert_eq!(s.photos_with_filter("bw").count(), 2);

        let id = s.photos()[1].id.clone();
        assert_eq!(s.photo_by_id(&id).unwrap().applied_filter_id, None);
        assert!(s.photo_by_id("missing").is_none());
    }
}
