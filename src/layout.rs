use serde::{Deserialize, Serialize};

use crate::{
    blur::MAX_BLUR_RADIUS,
    color::Rgba8,
    error::{BoothError, BoothResult},
    surface::MAX_SURFACE_DIM,
    text::FontSpec,
};

/// Slot rectangle in output-canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    pub fn bottom(&self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && u64::from(x) < self.right() && y >= self.y && u64::from(y) < self.bottom()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl FrameStyle {
    /// On/off dash lengths in pixels; empty for a continuous line.
    pub fn dash_pattern(self) -> &'static [f64] {
        match self {
            Self::Solid => &[],
            Self::Dashed => &[5.0, 5.0],
            Self::Dotted => &[2.0, 2.0],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub color: Rgba8,
    pub stroke_width: f32,
    #[serde(default)]
    pub style: FrameStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corner_radius: Option<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextBaseline {
    Top,
    #[default]
    Middle,
    Bottom,
    Alphabetic,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextShadow {
    pub color: Rgba8,
    #[serde(default = "default_shadow_offset")]
    pub offset_x: f32,
    #[serde(default = "default_shadow_offset")]
    pub offset_y: f32,
    #[serde(default = "default_shadow_blur")]
    pub blur: f32,
}

fn default_shadow_offset() -> f32 {
    2.0
}

fn default_shadow_blur() -> f32 {
    4.0
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    /// CSS font shorthand, e.g. `"bold 24px Arial"`.
    pub font: String,
    pub color: Rgba8,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub align: TextAlign,
    #[serde(default)]
    pub baseline: TextBaseline,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<TextShadow>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub photo_slot_count: usize,
    pub background_color: Rgba8,
    pub slots: Vec<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<Frame>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextOverlay>,
}

impl Layout {
    /// Near-square grid with 10px gutters sized to fit `width x height`.
    pub fn auto_grid(photo_count: usize, width: u32, height: u32) -> BoothResult<Self> {
        const PADDING: u32 = 10;

        if photo_count == 0 {
            return Err(BoothError::validation("auto grid needs at least one photo"));
        }
        let cols = (photo_count as f64).sqrt().ceil() as u32;
        let rows = (photo_count as u32).div_ceil(cols);

        let cell = |extent: u32, n: u32| -> BoothResult<u32> {
            let gutters = PADDING * (n + 1);
            extent
                .checked_sub(gutters)
                .map(|free| free / n)
                .filter(|&v| v > 0)
                .ok_or_else(|| {
                    BoothError::validation(format!(
                        "{width}x{height} is too small for {photo_count} photos"
                    ))
                })
        };
        let photo_w = cell(width, cols)?;
        let photo_h = cell(height, rows)?;

        let slots = (0..photo_count as u32)
            .map(|i| {
                let (col, row) = (i % cols, i / cols);
                Rect::new(
                    PADDING + col * (photo_w + PADDING),
                    PADDING + row * (photo_h + PADDING),
                    photo_w,
                    photo_h,
                )
            })
            .collect();

        let layout = Self {
            id: "auto-generated".to_owned(),
            name: "Auto Layout".to_owned(),
            description: None,
            canvas_width: width,
            canvas_height: height,
            photo_slot_count: photo_count,
            background_color: Rgba8::WHITE,
            slots,
            frame: None,
            text: None,
        };
        layout.validate()?;
        Ok(layout)
    }

    pub fn validate(&self) -> BoothResult<()> {
        let fail = |msg: String| Err(BoothError::validation(format!("layout '{}': {msg}", self.id)));

        if self.id.trim().is_empty() {
            return Err(BoothError::validation("layout id must be non-empty"));
        }
        if self.name.trim().is_empty() {
            return fail("name must be non-empty".to_owned());
        }
        let dims = 1..=MAX_SURFACE_DIM;
        if !dims.contains(&self.canvas_width) || !dims.contains(&self.canvas_height) {
            return fail(format!(
                "canvas {}x{} must be within 1..={MAX_SURFACE_DIM} per side",
                self.canvas_width, self.canvas_height
            ));
        }
        if self.slots.len() != self.photo_slot_count {
            return fail(format!(
                "declares {} photo slots but lists {} rectangles",
                self.photo_slot_count,
                self.slots.len()
            ));
        }
        for (i, slot) in self.slots.iter().enumerate() {
            if slot.width == 0 || slot.height == 0 {
                return fail(format!("slot {i} has zero size"));
            }
            if slot.right() > u64::from(self.canvas_width)
                || slot.bottom() > u64::from(self.canvas_height)
            {
                return fail(format!(
                    "slot {i} ({},{} {}x{}) exceeds the {}x{} canvas",
                    slot.x, slot.y, slot.width, slot.height, self.canvas_width, self.canvas_height
                ));
            }
        }
        if let Some(frame) = &self.frame {
            if !frame.stroke_width.is_finite() || frame.stroke_width <= 0.0 {
                return fail("frame stroke width must be finite and > 0".to_owned());
            }
            if frame
                .corner_radius
                .is_some_and(|r| !r.is_finite() || r < 0.0)
            {
                return fail("frame corner radius must be finite and >= 0".to_owned());
            }
        }
        if let Some(text) = &self.text {
            if !text.x.is_finite() || !text.y.is_finite() {
                return fail("text position must be finite".to_owned());
            }
            FontSpec::parse(&text.font)
                .map_err(|e| BoothError::validation(format!("layout '{}': {e}", self.id)))?;
            if let Some(shadow) = &text.shadow {
                let finite = [shadow.offset_x, shadow.offset_y, shadow.blur]
                    .iter()
                    .all(|v| v.is_finite());
                if !finite || shadow.blur < 0.0 {
                    return fail("text shadow needs finite offsets and blur >= 0".to_owned());
                }
                // The shadow is blurred with sigma = blur / 2 and radius 3 * sigma.
                if (shadow.blur * 1.5).ceil() > MAX_BLUR_RADIUS as f32 {
                    return fail(format!("text shadow blur {} is too large", shadow.blur));
                }
            }
        }
        Ok(())
    }
}
