use crate::{
    color::Rgba8,
    error::{BoothError, BoothResult},
};

/// Canvas size limit per side, matching common browser canvas limits.
pub const MAX_SURFACE_DIM: u32 = 32_767;

/// An owned premultiplied RGBA8 pixel buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Surface {
    /// Transparent surface. Zero-sized surfaces are allowed; drawing into or
    /// exporting them fails later.
    pub fn new(width: u32, height: u32) -> BoothResult<Self> {
        let len = byte_len(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0; len],
        })
    }

    pub fn filled(width: u32, height: u32, color: Rgba8) -> BoothResult<Self> {
        let mut surface = Self::new(width, height)?;
        surface.fill(color);
        Ok(surface)
    }

    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> BoothResult<Self> {
        if data.len() != byte_len(width, height)? {
            return Err(BoothError::validation(format!(
                "surface data length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_in_place(&mut data);
        Self {
            width,
            height,
            data,
        }
    }

    /// Straight-alpha copy for encoders and external consumers.
    pub fn to_rgba_image(&self) -> BoothResult<image::RgbaImage> {
        let mut data = self.data.clone();
        unpremultiply_in_place(&mut data);
        image::RgbaImage::from_raw(self.width, self.height, data)
            .ok_or_else(|| BoothError::validation("surface buffer does not fit its dimensions"))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn fill(&mut self, color: Rgba8) {
        let px = color.to_premul();
        for dst in self.data.chunks_exact_mut(4) {
            dst.copy_from_slice(&px);
        }
    }

    pub fn premul_pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        let px = &self.data[idx..idx + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Straight-alpha color at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        self.premul_pixel(x, y).map(Rgba8::from_premul)
    }
}

fn byte_len(width: u32, height: u32) -> BoothResult<usize> {
    if width > MAX_SURFACE_DIM || height > MAX_SURFACE_DIM {
        return Err(BoothError::validation(format!(
            "surface {width}x{height} exceeds {MAX_SURFACE_DIM}px per side"
        )));
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| BoothError::validation("surface buffer size overflow"))
}

pub(crate) fn premultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

pub(crate) fn unpremultiply_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let straight = Rgba8::from_premul([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&[straight.r, straight.g, straight.b, straight.a]);
    }
}
