use crate::{
    color::Rgba8,
    error::BoothResult,
    filter::Filter,
    layout::{Frame, FrameStyle, Layout, Rect, TextAlign, TextBaseline, TextOverlay},
};

const FILTERS: &[(&str, &str, &str, &str, f32)] = &[
    ("none", "Original", "none", "No filter applied", 0.0),
    (
        "vintage",
        "Vintage",
        "sepia(0.5) contrast(1.2) brightness(0.8)",
        "Warm vintage look",
        0.5,
    ),
    (
        "bw",
        "Black & White",
        "grayscale(100%) contrast(1.2)",
        "Classic black and white",
        1.0,
    ),
    (
        "warm",
        "Warm",
        "contrast(1.1) brightness(1.1) saturate(1.3)",
        "Warm and cozy tones",
        0.3,
    ),
    (
        "cool",
        "Cool",
        "contrast(1.1) brightness(0.9) hue-rotate(180deg)",
        "Cool blue tones",
        0.4,
    ),
    (
        "dramatic",
        "Dramatic",
        "contrast(1.5) brightness(0.7) saturate(1.5)",
        "High contrast dramatic look",
        0.7,
    ),
    (
        "soft",
        "Soft",
        "contrast(0.8) brightness(1.2) blur(0.5px)",
        "Soft dreamy effect",
        0.3,
    ),
    (
        "retro",
        "Retro",
        "sepia(0.8) hue-rotate(315deg) saturate(1.5)",
        "Retro film look",
        0.6,
    ),
];

pub(crate) fn builtin_filters() -> BoothResult<Vec<Filter>> {
    FILTERS
        .iter()
        .map(|&(id, name, css, description, intensity)| {
            Ok(Filter::from_css(id, name, css, intensity)?.with_description(description))
        })
        .collect()
}

fn frame(color: Rgba8, stroke_width: f32, style: FrameStyle, corner_radius: Option<f32>) -> Frame {
    Frame {
        color,
        stroke_width,
        style,
        corner_radius,
    }
}

fn caption(text: &str, font: &str, color: Rgba8, x: f32, y: f32) -> TextOverlay {
    TextOverlay {
        text: text.to_owned(),
        font: font.to_owned(),
        color,
        x,
        y,
        align: TextAlign::Center,
        baseline: TextBaseline::Middle,
        shadow: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn layout(
    id: &str,
    name: &str,
    description: &str,
    (canvas_width, canvas_height): (u32, u32),
    background_color: Rgba8,
    slots: Vec<Rect>,
    frame: Option<Frame>,
    text: Option<TextOverlay>,
) -> Layout {
    Layout {
        id: id.to_owned(),
        name: name.to_owned(),
        description: Some(description.to_owned()),
        canvas_width,
        canvas_height,
        photo_slot_count: slots.len(),
        background_color,
        slots,
        frame,
        text,
    }
}

pub(crate) fn builtin_layouts() -> Vec<Layout> {
    let white = Rgba8::WHITE;
    let black = Rgba8::BLACK;
    let light = Rgba8::rgb(0xf8, 0xf9, 0xfa);

    vec![
        layout(
            "strip-4",
            "Classic Strip",
            "4 photos in a vertical strip",
            (600, 1800),
            white,
            vec![
                Rect::new(50, 50, 500, 375),
                Rect::new(50, 475, 500, 375),
                Rect::new(50, 900, 500, 375),
                Rect::new(50, 1325, 500, 375),
            ],
            Some(frame(black, 2.0, FrameStyle::Solid, None)),
            Some(caption(
                "Photo Booth",
                "24px Arial",
                Rgba8::rgb(0x66, 0x66, 0x66),
                300.0,
                1750.0,
            )),
        ),
        layout(
            "postcard",
            "Postcard",
            "2 photos side by side",
            (1200, 800),
            light,
            vec![Rect::new(50, 100, 550, 600), Rect::new(650, 100, 550, 600)],
            Some(frame(
                Rgba8::rgb(0xe9, 0xec, 0xef),
                10.0,
                FrameStyle::Solid,
                Some(15.0),
            )),
            None,
        ),
        layout(
            "square-4",
            "Square Grid",
            "4 photos in a 2x2 grid",
            (800, 800),
            white,
            vec![
                Rect::new(50, 50, 325, 325),
                Rect::new(425, 50, 325, 325),
                Rect::new(50, 425, 325, 325),
                Rect::new(425, 425, 325, 325),
            ],
            Some(frame(black, 5.0, FrameStyle::Solid, None)),
            None,
        ),
        layout(
            "polaroid",
            "Polaroid Style",
            "Single photo with polaroid frame",
            (600, 750),
            white,
            vec![Rect::new(50, 50, 500, 500)],
            Some(frame(light, 20.0, FrameStyle::Solid, None)),
            Some(caption(
                "Made with Photo Booth",
                "18px cursive",
                Rgba8::rgb(0x6c, 0x75, 0x7d),
                300.0,
                650.0,
            )),
        ),
        layout(
            "collage-6",
            "Photo Collage",
            "6 photos in mixed layout",
            (1200, 900),
            Rgba8::rgb(0xf1, 0xf3, 0xf4),
            vec![
                Rect::new(50, 50, 300, 250),
                Rect::new(400, 50, 300, 250),
                Rect::new(750, 50, 300, 250),
                Rect::new(50, 350, 300, 250),
                Rect::new(400, 350, 300, 250),
                Rect::new(750, 350, 300, 250),
            ],
            Some(frame(white, 8.0, FrameStyle::Solid, Some(10.0))),
            None,
        ),
        layout(
            "mini-strip",
            "Mini Strip",
            "3 small photos vertically",
            (400, 1200),
            white,
            vec![
                Rect::new(50, 50, 300, 300),
                Rect::new(50, 400, 300, 300),
                Rect::new(50, 750, 300, 300),
            ],
            Some(frame(black, 3.0, FrameStyle::Dashed, None)),
            None,
        ),
    ]
}
