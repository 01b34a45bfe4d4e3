use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;

use crate::{
    blur::gaussian_blur,
    color::Rgba8,
    composite::over_in_place,
    error::{BoothError, BoothResult},
    layout::{TextAlign, TextBaseline, TextOverlay},
    surface::Surface,
};

/// The subset of the CSS `font` shorthand used by layouts:
/// `[style] [weight] <size>px <family>[, <family>]*`.
#[derive(Clone, Debug, PartialEq)]
pub struct FontSpec {
    pub italic: bool,
    pub weight: u16,
    pub size_px: f32,
    pub families: Vec<String>,
}

impl FontSpec {
    pub fn parse(font: &str) -> BoothResult<Self> {
        let mut italic = false;
        let mut weight = 400u16;
        let mut tokens = font.split_whitespace();
        let mut size_px = None;

        for tok in tokens.by_ref() {
            match tok.to_ascii_lowercase().as_str() {
                "normal" => {}
                "italic" | "oblique" => italic = true,
                "bold" | "bolder" => weight = 700,
                "lighter" => weight = 300,
                other => {
                    if let Ok(w) = other.parse::<u16>()
                        && (100..=900).contains(&w)
                    {
                        weight = w;
                        continue;
                    }
                    // "24px" or "24px/1.5"; line height is ignored.
                    let size = other.split('/').next().unwrap_or(other);
                    let parsed = size
                        .strip_suffix("px")
                        .and_then(|n| n.parse::<f32>().ok())
                        .filter(|v| v.is_finite() && *v > 0.0);
                    match parsed {
                        Some(v) => {
                            size_px = Some(v);
                            break;
                        }
                        None => {
                            return Err(BoothError::validation(format!(
                                "font \"{font}\": unexpected token \"{tok}\""
                            )));
                        }
                    }
                }
            }
        }

        let size_px = size_px.ok_or_else(|| {
            BoothError::validation(format!("font \"{font}\" must include a size like 16px"))
        })?;
        let rest: Vec<&str> = tokens.collect();
        let families: Vec<String> = rest
            .join(" ")
            .split(',')
            .map(|f| f.trim().trim_matches(['"', '\'']).to_owned())
            .filter(|f| !f.is_empty())
            .collect();
        if families.is_empty() {
            return Err(BoothError::validation(format!(
                "font \"{font}\" must name a family"
            )));
        }

        Ok(Self {
            italic,
            weight,
            size_px,
            families,
        })
    }

    fn svg_family_list(&self) -> String {
        let mut names: Vec<String> = self
            .families
            .iter()
            .map(|fam| {
                if is_generic_family(fam) {
                    fam.clone()
                } else {
                    format!("'{}'", escape_xml(fam))
                }
            })
            .collect();
        // Fall back to the default sans face when the named family is missing.
        if !self.families.iter().any(|f| is_generic_family(f)) {
            names.push("sans-serif".to_owned());
        }
        names.join(", ")
    }
}

fn is_generic_family(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "serif" | "sans-serif" | "cursive" | "fantasy" | "monospace"
    )
}

/// Rasterizes text overlays through usvg/resvg using a shared font database.
#[derive(Clone)]
pub struct TextRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl TextRasterizer {
    /// System fonts plus any `.ttf`/`.otf`/`.ttc` files found in `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        for dir in font_dirs {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "font database ready");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// No fonts at all: text renders no glyphs. Useful for pixel-exact tests.
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }

    /// Draws `overlay` (shadow first, then glyphs) onto `canvas`.
    pub fn draw(&self, canvas: &mut Surface, overlay: &TextOverlay) -> BoothResult<()> {
        if overlay.text.trim().is_empty() {
            return Ok(());
        }
        let font = FontSpec::parse(&overlay.font)?;

        if let Some(shadow) = &overlay.shadow
            && shadow.color.a > 0
        {
            let svg = text_svg(
                canvas.width(),
                canvas.height(),
                overlay,
                &font,
                shadow.color,
                (shadow.offset_x, shadow.offset_y),
            );
            let layer = self.rasterize(&svg, canvas.width(), canvas.height())?;
            let layer = gaussian_blur(&layer, shadow.blur / 2.0)?;
            over_in_place(canvas.data_mut(), layer.data())?;
        }

        let svg = text_svg(
            canvas.width(),
            canvas.height(),
            overlay,
            &font,
            overlay.color,
            (0.0, 0.0),
        );
        let layer = self.rasterize(&svg, canvas.width(), canvas.height())?;
        over_in_place(canvas.data_mut(), layer.data())?;
        Ok(())
    }

    fn rasterize(&self, svg: &str, width: u32, height: u32) -> BoothResult<Surface> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            font_resolver: font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).context("parse text overlay svg")?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| BoothError::composition("failed to allocate text pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Surface::from_premul(width, height, pixmap.take())
    }
}

/// Generic families resolve through fontdb's defaults (Arial, Comic Sans MS,
/// ...), which are often missing. Try the other generics next and finally any
/// loaded face, so a caption only disappears when there are no fonts at all.
fn font_resolver() -> usvg::FontResolver<'static> {
    usvg::FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families: Vec<usvg::fontdb::Family<'_>> = font
                .families()
                .iter()
                .map(|family| match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                })
                .collect();
            families.extend([
                usvg::fontdb::Family::SansSerif,
                usvg::fontdb::Family::Serif,
                usvg::fontdb::Family::Monospace,
            ]);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            fontdb
                .query(&query)
                .or_else(|| fontdb.faces().next().map(|f| f.id))
        }),
        select_fallback: usvg::FontResolver::default_fallback_selector(),
    }
}

fn text_svg(
    width: u32,
    height: u32,
    overlay: &TextOverlay,
    font: &FontSpec,
    fill: Rgba8,
    (dx, dy): (f32, f32),
) -> String {
    let anchor = match overlay.align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    };
    let baseline = match overlay.baseline {
        TextBaseline::Top => "text-before-edge",
        TextBaseline::Middle => "central",
        TextBaseline::Bottom => "text-after-edge",
        TextBaseline::Alphabetic => "alphabetic",
    };
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            r#"<text x="{x}" y="{y}" font-family="{family}" font-size="{size}" font-weight="{weight}" "#,
            r#"font-style="{style}" text-anchor="{anchor}" dominant-baseline="{baseline}" "#,
            r#"fill="{fill}" fill-opacity="{opacity}" xml:space="preserve">{text}</text></svg>"#
        ),
        w = width,
        h = height,
        x = overlay.x + dx,
        y = overlay.y + dy,
        family = font.svg_family_list(),
        size = font.size_px,
        weight = font.weight,
        style = if font.italic { "italic" } else { "normal" },
        anchor = anchor,
        baseline = baseline,
        fill = Rgba8 { a: 255, ..fill }.to_hex(),
        opacity = fill.opacity(),
        text = escape_xml(&overlay.text),
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        if !matches!(ext.to_ascii_lowercase().as_str(), "ttf" | "otf" | "ttc") {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable font");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlay(text: &str) -> TextOverlay {
        TextOverlay {
            text: text.to_owned(),
            font: "24px Arial".to_owned(),
            color: Rgba8::rgb(0x66, 0x66, 0x66),
            x: 50.0,
            y: 20.0,
            align: TextAlign::Center,
            baseline: TextBaseline::Middle,
            shadow: None,
        }
    }

    #[test]
    fn parses_font_shorthand() {
        let f = FontSpec::parse("24px Arial").unwrap();
        assert_eq!(f.size_px, 24.0);
        assert_eq!(f.weight, 400);
        assert_eq!(f.families, vec!["Arial".to_owned()]);

        let f = FontSpec::parse("italic bold 18px/1.2 \"Comic Sans MS\", cursive").unwrap();
        assert!(f.italic);
        assert_eq!(f.weight, 700);
        assert_eq!(f.size_px, 18.0);
        assert_eq!(
            f.families,
            vec!["Comic Sans MS".to_owned(), "cursive".to_owned()]
        );

        assert_eq!(FontSpec::parse("600 10px serif").unwrap().weight, 600);
    }

    #[test]
    fn rejects_fonts_without_size_or_family() {
        assert!(FontSpec::parse("Arial").is_err());
        assert!(FontSpec::parse("24px").is_err());
        assert!(FontSpec::parse("-3px Arial").is_err());
    }

    #[test]
    fn svg_escapes_text_and_maps_alignment() {
        let mut o = overlay("Tom & Jerry <3");
        o.align = TextAlign::Right;
        o.baseline = TextBaseline::Top;
        let font = FontSpec::parse(&o.font).unwrap();
        let svg = text_svg(100, 40, &o, &font, o.color, (2.0, 3.0));

        assert!(svg.contains("Tom &amp; Jerry &lt;3"));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains(r#"dominant-baseline="text-before-edge""#));
        assert!(svg.contains(r#"x="52""#));
        assert!(svg.contains(r#"y="23""#));
        assert!(svg.contains("'Arial', sans-serif"));
    }

    #[test]
    fn drawing_without_fonts_leaves_canvas_unchanged() {
        let raster = TextRasterizer::without_fonts();
        let mut canvas = Surface::filled(100, 40, Rgba8::WHITE).unwrap();
        let before = canvas.clone();
        raster.draw(&mut canvas, &overlay("Photo Booth")).unwrap();
        assert_eq!(canvas, before);

        let mut shadowed = overlay("Photo Booth");
        shadowed.shadow = Some(crate::layout::TextShadow {
            color: Rgba8::rgba(0, 0, 0, 128),
            offset_x: 2.0,
            offset_y: 2.0,
            blur: 4.0,
        });
        raster.draw(&mut canvas, &shadowed).unwrap();
        assert_eq!(canvas, before);
    }

    fn system_fonts() -> Option<TextRasterizer> {
        let raster = TextRasterizer::new(&[]);
        (raster.face_count() > 0).then_some(raster)
    }

    fn ink_bounds(canvas: &Surface, bg: Rgba8) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.pixel(x, y) == Some(bg) {
                    continue;
                }
                let b = bounds.get_or_insert((x, y, x, y));
                *b = (b.0.min(x), b.1.min(y), b.2.max(x), b.3.max(y));
            }
        }
        bounds
    }

    #[test]
    fn generic_and_missing_families_still_draw_glyphs() {
        let Some(raster) = system_fonts() else {
            return;
        };
        for font in ["40px sans-serif", "40px cursive", "40px 'No Such Family'"] {
            let mut canvas = Surface::filled(200, 80, Rgba8::WHITE).unwrap();
            let mut o = overlay("HHH");
            o.font = font.to_owned();
            o.color = Rgba8::BLACK;
            o.x = 100.0;
            o.y = 40.0;
            raster.draw(&mut canvas, &o).unwrap();
            assert!(ink_bounds(&canvas, Rgba8::WHITE).is_some(), "{font}");
        }
    }

    #[test]
    fn alignment_and_baseline_place_text() {
        let Some(raster) = system_fonts() else {
            return;
        };
        let draw = |align, baseline| {
            let mut canvas = Surface::filled(300, 120, Rgba8::WHITE).unwrap();
            let mut o = overlay("HHH");
            o.font = "30px sans-serif".to_owned();
            o.color = Rgba8::BLACK;
            o.x = 150.0;
            o.y = 60.0;
            o.align = align;
            o.baseline = baseline;
            raster.draw(&mut canvas, &o).unwrap();
            ink_bounds(&canvas, Rgba8::WHITE).unwrap()
        };

        let (x0, ..) = draw(TextAlign::Left, TextBaseline::Middle);
        assert!(x0 >= 148, "left-aligned ink starts at {x0}");
        let (_, _, x1, _) = draw(TextAlign::Right, TextBaseline::Middle);
        assert!(x1 <= 152, "right-aligned ink ends at {x1}");
        let (x0, _, x1, _) = draw(TextAlign::Center, TextBaseline::Middle);
        assert!(x0 < 150 && x1 > 150);

        let (_, y0, ..) = draw(TextAlign::Center, TextBaseline::Top);
        assert!(y0 >= 58, "top-baseline ink starts at {y0}");
        let (_, _, _, y1) = draw(TextAlign::Center, TextBaseline::Bottom);
        assert!(y1 <= 62, "bottom-baseline ink ends at {y1}");
    }

    #[test]
    fn shadow_is_drawn_under_glyphs_at_offset() {
        let Some(raster) = system_fonts() else {
            return;
        };
        let mut o = overlay("HHH");
        o.font = "40px sans-serif".to_owned();
        o.color = Rgba8::BLACK;
        o.x = 100.0;
        o.y = 40.0;

        let mut plain = Surface::filled(200, 80, Rgba8::WHITE).unwrap();
        raster.draw(&mut plain, &o).unwrap();

        o.shadow = Some(crate::layout::TextShadow {
            color: Rgba8::rgb(255, 0, 0),
            offset_x: 4.0,
            offset_y: 4.0,
            blur: 0.0,
        });
        let mut shadowed = Surface::filled(200, 80, Rgba8::WHITE).unwrap();
        raster.draw(&mut shadowed, &o).unwrap();

        let mut red = 0;
        for y in 0..80 {
            for x in 0..200 {
                let top = plain.pixel(x, y).unwrap();
                let px = shadowed.pixel(x, y).unwrap();
                if top == Rgba8::BLACK {
                    assert_eq!(px, Rgba8::BLACK, "glyph covered at ({x}, {y})");
                }
                if top == Rgba8::WHITE && px == Rgba8::rgb(255, 0, 0) {
                    red += 1;
                }
            }
        }
        assert!(red > 0, "no shadow pixels beside the glyphs");
    }
}
