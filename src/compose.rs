use std::path::PathBuf;

use crate::{
    composite::draw_over,
    error::{BoothError, BoothResult},
    filter::Filter,
    frame::stroke_border,
    layout::{Layout, Rect},
    surface::Surface,
    text::TextRasterizer,
};

/// Renders photos into a layout. Holds only the font database; every call
/// allocates its own canvas and scratch surfaces.
#[derive(Clone)]
pub struct Compositor {
    text: TextRasterizer,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    /// Uses system fonts.
    pub fn new() -> Self {
        Self::with_font_dirs(&[])
    }

    pub fn with_font_dirs(font_dirs: &[PathBuf]) -> Self {
        Self {
            text: TextRasterizer::new(font_dirs),
        }
    }

    pub fn with_text_rasterizer(text: TextRasterizer) -> Self {
        Self { text }
    }

    /// Background, then each photo stretched into its slot (filtered), then
    /// the frame, then the text overlay. Photos beyond the first
    /// `photos.len()` slots leave those slots showing the background.
    #[tracing::instrument(skip(self, photos, layout, filter), fields(layout = %layout.id, photos = photos.len(), filter = filter.map(|f| f.id.as_str())))]
    pub fn compose(
        &self,
        photos: &[Surface],
        layout: &Layout,
        filter: Option<&Filter>,
    ) -> BoothResult<Surface> {
        layout.validate().map_err(into_composition)?;
        if photos.len() > layout.slots.len() {
            return Err(BoothError::composition(format!(
                "layout '{}' has {} slots but {} photos were given",
                layout.id,
                layout.slots.len(),
                photos.len()
            )));
        }
        let filter = filter.filter(|f| !f.is_identity());

        let mut canvas = Surface::filled(
            layout.canvas_width,
            layout.canvas_height,
            layout.background_color,
        )
        .map_err(into_composition)?;

        for (i, (photo, slot)) in photos.iter().zip(&layout.slots).enumerate() {
            tracing::debug!(slot = i, x = slot.x, y = slot.y, w = slot.width, h = slot.height, "draw photo");
            let scratch = fit_to_slot(photo, slot)
                .map_err(|e| BoothError::composition(format!("photo {i}: {e}")))?;
            let scratch = match filter {
                Some(f) => f.apply(&scratch).map_err(into_composition)?,
                None => scratch,
            };
            draw_over(&mut canvas, &scratch, slot.x, slot.y).map_err(into_composition)?;
        }

        if let Some(frame) = &layout.frame {
            stroke_border(&mut canvas, frame).map_err(into_composition)?;
        }
        if let Some(text) = &layout.text {
            self.text.draw(&mut canvas, text).map_err(into_composition)?;
        }
        Ok(canvas)
    }
}

/// Non-uniform bilinear resize to exactly the slot size.
fn fit_to_slot(photo: &Surface, slot: &Rect) -> BoothResult<Surface> {
    if photo.is_empty() {
        return Err(BoothError::composition("photo has zero size"));
    }
    if photo.width() == slot.width && photo.height() == slot.height {
        return Ok(photo.clone());
    }
    // Premultiplied data resizes without dark fringes at alpha edges.
    let src = image::RgbaImage::from_raw(photo.width(), photo.height(), photo.data().to_vec())
        .ok_or_else(|| BoothError::composition("photo buffer does not match its size"))?;
    let resized = image::imageops::resize(
        &src,
        slot.width,
        slot.height,
        image::imageops::FilterType::Triangle,
    );
    Surface::from_premul(slot.width, slot.height, resized.into_raw())
}

fn into_composition(err: BoothError) -> BoothError {
    match err {
        BoothError::Composition(_) => err,
        other => BoothError::composition(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{color::Rgba8, layout::Rect};

    fn pair_layout() -> Layout {
        Layout {
            id: "pair".to_owned(),
            name: "Pair".to_owned(),
            description: None,
            canvas_width: 40,
            canvas_height: 20,
            photo_slot_count: 2,
            background_color: Rgba8::rgb(0, 0, 255),
            slots: vec![Rect::new(0, 0, 20, 20), Rect::new(20, 0, 20, 20)],
            frame: None,
            text: None,
        }
    }

    fn compositor() -> Compositor {
        Compositor::with_text_rasterizer(TextRasterizer::without_fonts())
    }

    #[test]
    fn photos_are_stretched_into_slots() {
        let photo = Surface::filled(7, 3, Rgba8::rgb(255, 0, 0)).unwrap();
        let out = compositor().compose(&[photo], &pair_layout(), None).unwrap();

        assert_eq!((out.width(), out.height()), (40, 20));
        assert_eq!(out.pixel(0, 0), Some(Rgba8::rgb(255, 0, 0)));
        assert_eq!(out.pixel(19, 19), Some(Rgba8::rgb(255, 0, 0)));
        assert_eq!(out.pixel(20, 0), Some(Rgba8::rgb(0, 0, 255)));
    }

    #[test]
    fn too_many_photos_is_a_composition_error() {
        let p = Surface::filled(2, 2, Rgba8::WHITE).unwrap();
        let err = compositor()
            .compose(&[p.clone(), p.clone(), p], &pair_layout(), None)
            .unwrap_err();
        assert!(matches!(err, BoothError::Composition(_)));
    }

    #[test]
    fn zero_sized_photo_is_a_composition_error() {
        let empty = Surface::new(0, 0).unwrap();
        let err = compositor()
            .compose(&[empty], &pair_layout(), None)
            .unwrap_err();
        assert!(matches!(err, BoothError::Composition(_)));
    }

    #[test]
    fn invalid_layout_is_a_composition_error() {
        let mut layout = pair_layout();
        layout.photo_slot_count = 5;
        let err = compositor().compose(&[], &layout, None).unwrap_err();
        assert!(matches!(err, BoothError::Composition(_)));
    }

    #[test]
    fn filter_applies_only_inside_slots() {
        let photo = Surface::filled(4, 4, Rgba8::rgb(200, 40, 40)).unwrap();
        let bw = Filter::from_css("bw", "BW", "grayscale(1)", 1.0).unwrap();
        let out = compositor()
            .compose(&[photo], &pair_layout(), Some(&bw))
            .unwrap();

        let px = out.pixel(5, 5).unwrap();
        assert_eq!(px.r, px.g);
        assert_eq!(px.g, px.b);
        assert_eq!(out.pixel(30, 5), Some(Rgba8::rgb(0, 0, 255)));
    }
}
