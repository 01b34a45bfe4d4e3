use crate::{
    error::{BoothError, BoothResult},
    surface::Surface,
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over on premultiplied pixels.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    match src[3] {
        0 => dst,
        255 => src,
        sa => {
            let inv = 255u16 - u16::from(sa);
            let mut out = [0u8; 4];
            for i in 0..4 {
                out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
            }
            out
        }
    }
}

/// Draws `src` over `dst` with its top-left corner at `(x, y)`; the part of
/// `src` outside `dst` is clipped.
pub fn draw_over(dst: &mut Surface, src: &Surface, x: u32, y: u32) -> BoothResult<()> {
    if src.is_empty() {
        return Err(BoothError::composition("cannot draw an empty surface"));
    }
    if x >= dst.width() || y >= dst.height() {
        return Ok(());
    }

    let copy_w = src.width().min(dst.width() - x) as usize;
    let copy_h = src.height().min(dst.height() - y) as usize;
    let dst_stride = dst.width() as usize * 4;
    let src_stride = src.width() as usize * 4;
    let (x, y) = (x as usize, y as usize);

    let src_data = src.data();
    let dst_data = dst.data_mut();
    for row in 0..copy_h {
        let s = &src_data[row * src_stride..row * src_stride + copy_w * 4];
        let d_start = (y + row) * dst_stride + x * 4;
        let d = &mut dst_data[d_start..d_start + copy_w * 4];
        for (dp, sp) in d.chunks_exact_mut(4).zip(s.chunks_exact(4)) {
            let out = over([dp[0], dp[1], dp[2], dp[3]], [sp[0], sp[1], sp[2], sp[3]]);
            dp.copy_from_slice(&out);
        }
    }
    Ok(())
}

/// Source-over of two equally sized premultiplied buffers.
pub fn over_in_place(dst: &mut [u8], src: &[u8]) -> BoothResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BoothError::composition(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
