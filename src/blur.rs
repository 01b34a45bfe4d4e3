use crate::{
    error::{BoothError, BoothResult},
    surface::Surface,
};

/// Largest blur radius (in pixels) a filter or shadow may request.
pub const MAX_BLUR_RADIUS: u32 = 256;

/// Separable gaussian blur of a premultiplied surface. The kernel radius is
/// `ceil(3 * sigma)`; edges clamp.
pub fn gaussian_blur(src: &Surface, sigma: f32) -> BoothResult<Surface> {
    if !sigma.is_finite() || sigma < 0.0 {
        return Err(BoothError::validation("blur sigma must be finite and >= 0"));
    }
    let radius = (sigma * 3.0).ceil() as u32;
    if radius == 0 || src.is_empty() {
        return Ok(src.clone());
    }
    if radius > MAX_BLUR_RADIUS {
        return Err(BoothError::validation(format!(
            "blur radius {radius}px exceeds {MAX_BLUR_RADIUS}px"
        )));
    }

    let kernel = gaussian_kernel_q16(radius, sigma);
    let (w, h) = (src.width() as usize, src.height() as usize);
    let mut tmp = vec![0u8; src.data().len()];
    let mut out = vec![0u8; src.data().len()];

    convolve(src.data(), &mut tmp, w, h, &kernel, Axis::Horizontal);
    convolve(&tmp, &mut out, w, h, &kernel, Axis::Vertical);
    Surface::from_premul(src.width(), src.height(), out)
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = f64::from(i);
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();

    // Push the rounding remainder into the center tap so the kernel sums to 1.0.
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let mid = weights.len() / 2;
    let fixed = (i64::from(weights[mid]) + 65536 - acc).clamp(0, 65536);
    weights[mid] = fixed as u32;
    weights
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

fn convolve(src: &[u8], dst: &mut [u8], w: usize, h: usize, k: &[u32], axis: Axis) {
    let radius = (k.len() / 2) as isize;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let d = ki as isize - radius;
                let (sx, sy) = match axis {
                    Axis::Horizontal => ((x as isize + d).clamp(0, w as isize - 1) as usize, y),
                    Axis::Vertical => (x, (y as isize + d).clamp(0, h as isize - 1) as usize),
                };
                let idx = (sy * w + sx) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = (y * w + x) * 4;
            for c in 0..4 {
                dst[out + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}
