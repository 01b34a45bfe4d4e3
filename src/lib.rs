#![forbid(unsafe_code)]

pub mod blur;
pub mod catalog;
pub mod color;
pub mod compose;
pub mod composite;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod frame;
pub mod layout;
pub mod loader;
mod presets;
pub mod render_target;
pub mod session;
pub mod surface;
pub mod text;

pub use catalog::{Catalog, CatalogEntry, FilterRegistry, LayoutRegistry};
pub use color::Rgba8;
pub use compose::Compositor;
pub use config::{BoothConfig, ExportConfig};
pub use error::{BoothError, BoothResult};
pub use export::{ExportFormat, encode, file_name, fit_within, sanitize_file_name, save};
pub use filter::{Adjustment, CustomFilterOptions, Filter, FilterTransform, PixelKernel};
pub use layout::{
    Frame, FrameStyle, Layout, Rect, TextAlign, TextBaseline, TextOverlay, TextShadow,
};
pub use loader::{decode_image, load, load_all};
pub use render_target::RenderTarget;
pub use session::{CaptureSession, Photo, PhotoMetadata};
pub use surface::Surface;
pub use text::{FontSpec, TextRasterizer};
