use vello_cpu::kurbo::{self, Shape as _};

use crate::{
    composite::over_in_place,
    error::{BoothError, BoothResult},
    layout::Frame,
    surface::Surface,
};

/// Strokes `frame` along the canvas border. The stroke is centered on the
/// edge, so only the inner half of `stroke_width` is visible.
#[tracing::instrument(skip(canvas, frame), fields(style = ?frame.style, width = frame.stroke_width))]
pub fn stroke_border(canvas: &mut Surface, frame: &Frame) -> BoothResult<()> {
    if canvas.is_empty() || frame.color.a == 0 {
        return Ok(());
    }
    let width: u16 = canvas
        .width()
        .try_into()
        .map_err(|_| BoothError::composition("canvas width exceeds u16"))?;
    let height: u16 = canvas
        .height()
        .try_into()
        .map_err(|_| BoothError::composition("canvas height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(width, height);
    let c = frame.color;
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
    ctx.set_stroke(
        kurbo::Stroke::new(f64::from(frame.stroke_width))
            .with_caps(kurbo::Cap::Butt)
            .with_join(kurbo::Join::Miter)
            .with_dashes(0.0, frame.style.dash_pattern().iter().copied()),
    );

    let border = kurbo::Rect::new(0.0, 0.0, f64::from(width), f64::from(height));
    match frame.corner_radius {
        Some(r) if r > 0.0 => {
            let rounded = kurbo::RoundedRect::from_rect(border, f64::from(r));
            ctx.stroke_path(&rounded.to_path(0.1));
        }
        _ => ctx.stroke_rect(&border),
    }
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(width, height);
    ctx.render_to_pixmap(&mut pixmap);
    over_in_place(canvas.data_mut(), pixmap.data_as_u8_slice())
}
