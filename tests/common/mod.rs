#![allow(dead_code)]

use std::io::Cursor;

use photostrip::{Compositor, Rgba8, Surface, TextRasterizer};

pub fn solid(w: u32, h: u32, c: Rgba8) -> Surface {
    Surface::filled(w, h, c).unwrap()
}

pub fn encoded(w: u32, h: u32, c: Rgba8, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([c.r, c.g, c.b, c.a]));
    let mut buf = Vec::new();
    let dyn_img = if format == image::ImageFormat::Jpeg {
        image::DynamicImage::ImageRgb8(image::DynamicImage::ImageRgba8(img).to_rgb8())
    } else {
        image::DynamicImage::ImageRgba8(img)
    };
    dyn_img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

pub fn png(w: u32, h: u32, c: Rgba8) -> Vec<u8> {
    encoded(w, h, c, image::ImageFormat::Png)
}

/// Compositor with an empty font database, so text draws nothing.
pub fn fontless() -> Compositor {
    Compositor::with_text_rasterizer(TextRasterizer::without_fonts())
}
