use std::sync::Arc;

use tracing::debug;

use crate::{
    error::{BoothError, BoothResult},
    surface::Surface,
};

/// Decodes PNG, JPEG or WEBP bytes into a premultiplied surface.
pub fn decode_image(bytes: &[u8]) -> BoothResult<Surface> {
    if bytes.is_empty() {
        return Err(BoothError::decode("image source is empty"));
    }
    let dyn_img = image::load_from_memory(bytes).map_err(|e| BoothError::decode(e.to_string()))?;
    let rgba = dyn_img.to_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(BoothError::decode("image has zero size"));
    }
    debug!(width = rgba.width(), height = rgba.height(), bytes = bytes.len(), "decoded image");
    Ok(Surface::from_rgba_image(rgba))
}

/// Decodes on the blocking pool so the caller's executor keeps running.
pub async fn load(bytes: impl Into<Arc<[u8]>>) -> BoothResult<Surface> {
    let bytes: Arc<[u8]> = bytes.into();
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| BoothError::decode(format!("decode task failed: {e}")))?
}

/// Decodes every source concurrently, preserving order. The first failure is
/// returned; results of decodes still running are discarded.
pub async fn load_all<I, B>(sources: I) -> BoothResult<Vec<Surface>>
where
    I: IntoIterator<Item = B>,
    B: Into<Arc<[u8]>>,
{
    let tasks: Vec<_> = sources.into_iter().map(|b| load(b)).collect();
    debug!(count = tasks.len(), "decoding photos");
    futures::future::try_join_all(tasks).await
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::color::Rgba8;

    fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba(px));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decode_png_premultiplies() {
        let s = decode_image(&png(2, 1, [100, 50, 200, 128])).unwrap();
        assert_eq!((s.width(), s.height()), (2, 1));
        assert_eq!(
            s.premul_pixel(0, 0).unwrap(),
            [
                ((100u16 * 128 + 127) / 255) as u8,
                ((50u16 * 128 + 127) / 255) as u8,
                ((200u16 * 128 + 127) / 255) as u8,
                128
            ]
        );
    }

    #[test]
    fn empty_and_corrupt_bytes_are_decode_errors() {
        assert!(matches!(decode_image(&[]), Err(BoothError::Decode(_))));
        assert!(matches!(
            decode_image(b"definitely not an image"),
            Err(BoothError::Decode(_))
        ));

        let mut truncated = png(8, 8, [1, 2, 3, 255]);
        truncated.truncate(truncated.len() / 2);
        assert!(matches!(decode_image(&truncated), Err(BoothError::Decode(_))));
    }

    #[tokio::test]
    async fn load_all_keeps_order_and_fails_fast() {
        let a = png(1, 1, [255, 0, 0, 255]);
        let b = png(3, 2, [0, 255, 0, 255]);
        let out = load_all(vec![a.clone(), b]).await.unwrap();
        assert_eq!(out[0].pixel(0, 0), Some(Rgba8::rgb(255, 0, 0)));
        assert_eq!((out[1].width(), out[1].height()), (3, 2));

        let err = load_all(vec![a, Vec::new()]).await.unwrap_err();
        assert!(matches!(err, BoothError::Decode(_)));
    }
}
