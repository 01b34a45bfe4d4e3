
use serde::{Deserialize, Serialize};

use crate::{
    blur::{MAX_BLUR_RADIUS, gaussian_blur},
    error::{BoothError, BoothResult},
    surface::Surface,
};

/// One primitive color adjustment, with CSS filter-function semantics.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "amount", rename_all = "kebab-case")]
pub enum Adjustment {
    Brightness(f32),
    Contrast(f32),
    Saturate(f32),
    /// Degrees.
    HueRotate(f32),
    /// Gaussian standard deviation in pixels.
    Blur(f32),
    Sepia(f32),
    Grayscale(f32),
}

/// Direct per-pixel transforms that do not map onto an adjustment chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PixelKernel {
    /// Rec. 601 luminance.
    Grayscale,
    Sepia,
    /// Warm channel scaling: red and green up, blue down.
    Vintage,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterTransform {
    Chain(Vec<Adjustment>),
    Kernel(PixelKernel),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FilterDef", into = "FilterDef")]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub transform: FilterTransform,
    /// Displayed strength in `[0, 1]`; informational only.
    pub intensity: f32,
}

/// Optional knobs for building a custom chain. Unset or zero fields are skipped.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CustomFilterOptions {
    pub brightness: Option<f32>,
    pub contrast: Option<f32>,
    pub saturation: Option<f32>,
    pub hue: Option<f32>,
    pub blur: Option<f32>,
    pub sepia: Option<f32>,
    pub grayscale: Option<f32>,
}

impl Adjustment {
    pub fn css_name(self) -> &'static str {
        match self {
            Self::Brightness(_) => "brightness",
            Self::Contrast(_) => "contrast",
            Self::Saturate(_) => "saturate",
            Self::HueRotate(_) => "hue-rotate",
            Self::Blur(_) => "blur",
            Self::Sepia(_) => "sepia",
            Self::Grayscale(_) => "grayscale",
        }
    }

    pub fn amount(self) -> f32 {
        match self {
            Self::Brightness(v)
            | Self::Contrast(v)
            | Self::Saturate(v)
            | Self::HueRotate(v)
            | Self::Blur(v)
            | Self::Sepia(v)
            | Self::Grayscale(v) => v,
        }
    }

    pub fn to_css(self) -> String {
        match self {
            Self::HueRotate(deg) => format!("hue-rotate({deg}deg)"),
            Self::Blur(px) => format!("blur({px}px)"),
            other => format!("{}({})", other.css_name(), other.amount()),
        }
    }

    /// Parses a CSS filter list such as `"sepia(0.5) contrast(1.2)"`. `none`
    /// and the empty string are the empty chain.
    pub fn parse_chain(css: &str) -> BoothResult<Vec<Self>> {
        let css = css.trim();
        if css.is_empty() || css.eq_ignore_ascii_case("none") {
            return Ok(Vec::new());
        }

        let mut out = Vec::new();
        let mut rest = css;
        while !rest.is_empty() {
            let open = rest
                .find('(')
                .ok_or_else(|| BoothError::validation(format!("expected '(' in \"{rest}\"")))?;
            let close = rest[open..]
                .find(')')
                .map(|i| open + i)
                .ok_or_else(|| BoothError::validation(format!("unclosed '(' in \"{rest}\"")))?;
            let name = rest[..open].trim().to_ascii_lowercase();
            let arg = rest[open + 1..close].trim();
            out.push(Self::parse_one(&name, arg)?);
            rest = rest[close + 1..].trim_start();
        }
        Ok(out)
    }

    fn parse_one(name: &str, arg: &str) -> BoothResult<Self> {
        let adj = match name {
            "brightness" => Self::Brightness(parse_amount(name, arg)?),
            "contrast" => Self::Contrast(parse_amount(name, arg)?),
            "saturate" => Self::Saturate(parse_amount(name, arg)?),
            "sepia" => Self::Sepia(parse_amount(name, arg)?),
            "grayscale" => Self::Grayscale(parse_amount(name, arg)?),
            "hue-rotate" => Self::HueRotate(parse_angle(arg)?),
            "blur" => Self::Blur(parse_length(arg)?),
            _ => {
                return Err(BoothError::validation(format!(
                    "unknown filter function '{name}'"
                )));
            }
        };
        adj.validate()?;
        Ok(adj)
    }

    pub fn validate(self) -> BoothResult<()> {
        let v = self.amount();
        if !v.is_finite() {
            return Err(BoothError::validation(format!(
                "{} amount must be finite",
                self.css_name()
            )));
        }
        match self {
            Self::HueRotate(_) => Ok(()),
            Self::Blur(px) if (px * 3.0).ceil() > MAX_BLUR_RADIUS as f32 => Err(
                BoothError::validation(format!("blur({px}px) is too large")),
            ),
            _ if v < 0.0 => Err(BoothError::validation(format!(
                "{} amount must be >= 0",
                self.css_name()
            ))),
            _ => Ok(()),
        }
    }

    fn apply_rgb(self, rgb: [f32; 3]) -> [f32; 3] {
        let out = match self {
            Self::Brightness(a) => rgb.map(|c| c * a),
            Self::Contrast(a) => rgb.map(|c| (c - 0.5) * a + 0.5),
            Self::Saturate(s) => mat3(saturate_matrix(s), rgb),
            Self::HueRotate(deg) => mat3(hue_rotate_matrix(deg), rgb),
            Self::Sepia(a) => mat3(sepia_matrix(a), rgb),
            Self::Grayscale(a) => mat3(grayscale_matrix(a), rgb),
            Self::Blur(_) => rgb,
        };
        out.map(|c| c.clamp(0.0, 1.0))
    }
}

fn parse_number(arg: &str) -> Option<f32> {
    arg.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn parse_amount(name: &str, arg: &str) -> BoothResult<f32> {
    let parsed = match arg.strip_suffix('%') {
        Some(pct) => parse_number(pct).map(|v| v / 100.0),
        None if arg.is_empty() => Some(1.0),
        None => parse_number(arg),
    };
    parsed.ok_or_else(|| BoothError::validation(format!("{name}() expects a number, got \"{arg}\"")))
}

fn parse_angle(arg: &str) -> BoothResult<f32> {
    let err = || BoothError::validation(format!("hue-rotate() expects an angle, got \"{arg}\""));
    if arg.is_empty() {
        return Ok(0.0);
    }
    if let Some(v) = arg.strip_suffix("deg") {
        return parse_number(v).ok_or_else(err);
    }
    if let Some(v) = arg.strip_suffix("turn") {
        return parse_number(v).map(|t| t * 360.0).ok_or_else(err);
    }
    if let Some(v) = arg.strip_suffix("rad") {
        return parse_number(v).map(f32::to_degrees).ok_or_else(err);
    }
    match parse_number(arg) {
        Some(v) if v == 0.0 => Ok(0.0),
        _ => Err(err()),
    }
}

fn parse_length(arg: &str) -> BoothResult<f32> {
    if arg.is_empty() {
        return Ok(0.0);
    }
    let v = arg.strip_suffix("px").unwrap_or(arg);
    parse_number(v)
        .ok_or_else(|| BoothError::validation(format!("blur() expects a length, got \"{arg}\"")))
}

type Mat3 = [[f32; 3]; 3];

fn mat3(m: Mat3, [r, g, b]: [f32; 3]) -> [f32; 3] {
    m.map(|row| row[0] * r + row[1] * g + row[2] * b)
}

fn saturate_matrix(s: f32) -> Mat3 {
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(deg: f32) -> Mat3 {
    let (sin, cos) = deg.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

fn sepia_matrix(amount: f32) -> Mat3 {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ]
}

fn grayscale_matrix(amount: f32) -> Mat3 {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * k, 0.7152 - 0.7152 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 + 0.2848 * k, 0.0722 - 0.0722 * k],
        [0.2126 - 0.2126 * k, 0.7152 - 0.7152 * k, 0.0722 + 0.9278 * k],
    ]
}

impl PixelKernel {
    fn apply(self, [r, g, b]: [f32; 3]) -> [f32; 3] {
        let out = match self {
            Self::Grayscale => {
                let y = r * 0.299 + g * 0.587 + b * 0.114;
                [y, y, y]
            }
            Self::Sepia => [
                r * 0.393 + g * 0.769 + b * 0.189,
                r * 0.349 + g * 0.686 + b * 0.168,
                r * 0.272 + g * 0.534 + b * 0.131,
            ],
            Self::Vintage => [r * 1.2, g * 1.1, b * 0.8],
        };
        out.map(|c| c.clamp(0.0, 255.0))
    }
}

impl Filter {
    pub fn none() -> Self {
        Self {
            id: "none".to_owned(),
            name: "Original".to_owned(),
            description: Some("No filter applied".to_owned()),
            transform: FilterTransform::Chain(Vec::new()),
            intensity: 0.0,
        }
    }

    pub fn from_css(
        id: impl Into<String>,
        name: impl Into<String>,
        css: &str,
        intensity: f32,
    ) -> BoothResult<Self> {
        let filter = Self {
            id: id.into(),
            name: name.into(),
            description: None,
            transform: FilterTransform::Chain(Adjustment::parse_chain(css)?),
            intensity,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn kernel(id: impl Into<String>, name: impl Into<String>, kernel: PixelKernel) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            transform: FilterTransform::Kernel(kernel),
            intensity: 1.0,
        }
    }

    pub fn custom(
        id: impl Into<String>,
        name: impl Into<String>,
        opts: CustomFilterOptions,
    ) -> BoothResult<Self> {
        let steps = [
            opts.brightness.map(Adjustment::Brightness),
            opts.contrast.map(Adjustment::Contrast),
            opts.saturation.map(Adjustment::Saturate),
            opts.hue.map(Adjustment::HueRotate),
            opts.blur.map(Adjustment::Blur),
            opts.sepia.map(Adjustment::Sepia),
            opts.grayscale.map(Adjustment::Grayscale),
        ];
        let chain = steps
            .into_iter()
            .flatten()
            .filter(|adj| adj.amount() != 0.0)
            .collect();
        let filter = Self {
            id: id.into(),
            name: name.into(),
            description: None,
            transform: FilterTransform::Chain(chain),
            intensity: 1.0,
        };
        filter.validate()?;
        Ok(filter)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_identity(&self) -> bool {
        matches!(&self.transform, FilterTransform::Chain(chain) if chain.is_empty())
    }

    /// CSS rendering of the chain; kernels have no CSS equivalent.
    pub fn css(&self) -> Option<String> {
        let FilterTransform::Chain(chain) = &self.transform else {
            return None;
        };
        if chain.is_empty() {
            return Some("none".to_owned());
        }
        let parts: Vec<String> = chain.iter().map(|adj| adj.to_css()).collect();
        Some(parts.join(" "))
    }

    pub fn validate(&self) -> BoothResult<()> {
        if self.id.trim().is_empty() {
            return Err(BoothError::validation("filter id must be non-empty"));
        }
        if self.name.trim().is_empty() {
            return Err(BoothError::validation(format!(
                "filter '{}' must have a name",
                self.id
            )));
        }
        if !(0.0..=1.0).contains(&self.intensity) {
            return Err(BoothError::validation(format!(
                "filter '{}' intensity must be within [0, 1]",
                self.id
            )));
        }
        if let FilterTransform::Chain(chain) = &self.transform {
            for adj in chain {
                adj.validate().map_err(|e| {
                    BoothError::validation(format!("filter '{}': {e}", self.id))
                })?;
            }
        }
        Ok(())
    }

    /// Returns a filtered copy of `src`. Pure: the same pixels and filter
    /// always produce the same bytes.
    pub fn apply(&self, src: &Surface) -> BoothResult<Surface> {
        let mut out = src.clone();
        match &self.transform {
            FilterTransform::Kernel(kernel) => {
                map_pixels(&mut out, |rgb| {
                    kernel.apply(rgb.map(|c| c * 255.0)).map(|c| c / 255.0)
                });
            }
            FilterTransform::Chain(chain) => {
                // Color steps between blurs run fused per pixel.
                let mut pending: Vec<Adjustment> = Vec::new();
                for adj in chain {
                    match *adj {
                        Adjustment::Blur(px) => {
                            flush_color_steps(&mut out, &mut pending);
                            out = gaussian_blur(&out, px)?;
                        }
                        other => pending.push(other),
                    }
                }
                flush_color_steps(&mut out, &mut pending);
            }
        }
        Ok(out)
    }
}

fn flush_color_steps(surface: &mut Surface, pending: &mut Vec<Adjustment>) {
    if pending.is_empty() {
        return;
    }
    map_pixels(surface, |rgb| {
        pending.iter().fold(rgb, |acc, adj| adj.apply_rgb(acc))
    });
    pending.clear();
}

/// Runs `f` on straight-alpha RGB in `[0, 1]`, leaving alpha untouched.
fn map_pixels(surface: &mut Surface, f: impl Fn([f32; 3]) -> [f32; 3]) {
    for px in surface.data_mut().chunks_exact_mut(4) {
        let a = px[3];
        if a == 0 {
            continue;
        }
        let af = f32::from(a);
        let straight = [0, 1, 2].map(|i| (f32::from(px[i]) / af).min(1.0));
        let mapped = f(straight);
        for i in 0..3 {
            px[i] = (mapped[i].clamp(0.0, 1.0) * af).round() as u8;
        }
    }
}

#[derive(Serialize, Deserialize)]
struct FilterDef {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    css: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kernel: Option<PixelKernel>,
    #[serde(default)]
    intensity: f32,
}

impl TryFrom<FilterDef> for Filter {
    type Error = BoothError;

    fn try_from(def: FilterDef) -> Result<Self, Self::Error> {
        let transform = match (def.css, def.kernel) {
            (Some(_), Some(_)) => {
                return Err(BoothError::validation(format!(
                    "filter '{}' sets both css and kernel",
                    def.id
                )));
            }
            (None, Some(kernel)) => FilterTransform::Kernel(kernel),
            (css, None) => {
                FilterTransform::Chain(Adjustment::parse_chain(css.as_deref().unwrap_or(""))?)
            }
        };
        let filter = Self {
            id: def.id,
            name: def.name,
            description: def.description,
            transform,
            intensity: def.intensity,
        };
        filter.validate()?;
        Ok(filter)
    }
}

impl From<Filter> for FilterDef {
    fn from(f: Filter) -> Self {
        let css = f.css();
        let kernel = match f.transform {
            FilterTransform::Kernel(k) => Some(k),
            FilterTransform::Chain(_) => None,
        };
        Self {
            id: f.id,
            name: f.name,
            description: f.description,
            css,
            kernel,
            intensity: f.intensity,
        }
    }
}
