use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    catalog::{FilterRegistry, LayoutRegistry},
    compose::Compositor,
    error::{BoothError, BoothResult},
    export::ExportFormat,
    filter::Filter,
    layout::Layout,
    session::{CaptureSession, MAX_SESSION_PHOTOS},
    surface::MAX_SURFACE_DIM,
};

pub const ENV_MAX_PHOTOS: &str = "PHOTOSTRIP_MAX_PHOTOS";
pub const ENV_EXPORT_QUALITY: &str = "PHOTOSTRIP_EXPORT_QUALITY";

/// Booth configuration, usually read from a JSON file. Every field has a
/// default; unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoothConfig {
    pub max_photos: usize,
    pub default_layout: String,
    pub default_filter: String,
    pub export: ExportConfig,
    /// Extra directories scanned for `.ttf`/`.otf`/`.ttc` files.
    pub font_dirs: Vec<PathBuf>,
    /// Appended after the built-in layouts.
    pub layouts: Vec<Layout>,
    /// Appended after the built-in filters.
    pub filters: Vec<Filter>,
}

impl Default for BoothConfig {
    fn default() -> Self {
        Self {
            max_photos: MAX_SESSION_PHOTOS,
            default_layout: "strip-4".to_owned(),
            default_filter: "none".to_owned(),
            export: ExportConfig::default(),
            font_dirs: Vec::new(),
            layouts: Vec::new(),
            filters: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// `[0, 1]`; only JPEG uses it.
    pub quality: f32,
    pub file_prefix: String,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 0.9,
            file_prefix: "photo-booth".to_owned(),
            max_width: 2048,
            max_height: 2048,
        }
    }
}

impl BoothConfig {
    /// Reads, applies environment overrides and validates.
    pub fn from_path(path: &Path) -> BoothResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| BoothError::config(format!("read {}: {e}", path.display())))?;
        let mut config = Self::from_json(&text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> BoothResult<Self> {
        serde_json::from_str(text).map_err(|e| BoothError::config(e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overrides read through `lookup`; values that fail to parse are logged
    /// and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup(ENV_MAX_PHOTOS) {
            match raw.trim().parse::<usize>() {
                Ok(v) => self.max_photos = v,
                Err(err) => warn!(var = ENV_MAX_PHOTOS, value = %raw, %err, "ignoring override"),
            }
        }
        if let Some(raw) = lookup(ENV_EXPORT_QUALITY) {
            match raw.trim().parse::<f32>() {
                Ok(v) if v.is_finite() => self.export.quality = v,
                Ok(_) => warn!(var = ENV_EXPORT_QUALITY, value = %raw, "ignoring non-finite override"),
                Err(err) => warn!(var = ENV_EXPORT_QUALITY, value = %raw, %err, "ignoring override"),
            }
        }
    }

    pub fn validate(&self) -> BoothResult<()> {
        if !(1..=MAX_SESSION_PHOTOS).contains(&self.max_photos) {
            return Err(BoothError::config(format!(
                "max_photos must be 1-{MAX_SESSION_PHOTOS}"
            )));
        }
        if !(0.0..=1.0).contains(&self.export.quality) {
            return Err(BoothError::config("export.quality must be within [0, 1]"));
        }
        if self.export.file_prefix.trim().is_empty() {
            return Err(BoothError::config("export.file_prefix must not be empty"));
        }
        let dims = 1..=MAX_SURFACE_DIM;
        if !dims.contains(&self.export.max_width) || !dims.contains(&self.export.max_height) {
            return Err(BoothError::config(format!(
                "export.max_width/max_height must be 1-{MAX_SURFACE_DIM}"
            )));
        }

        let filters = self.filter_registry()?;
        let layouts = self.layout_registry()?;
        if !filters.contains(&self.default_filter) {
            return Err(BoothError::config(format!(
                "default_filter '{}' is not a known filter",
                self.default_filter
            )));
        }
        if !layouts.contains(&self.default_layout) {
            return Err(BoothError::config(format!(
                "default_layout '{}' is not a known layout",
                self.default_layout
            )));
        }
        Ok(())
    }

    /// Built-in filters followed by the configured ones.
    pub fn filter_registry(&self) -> BoothResult<FilterRegistry> {
        let mut reg = FilterRegistry::builtin()?;
        reg.extend(self.filters.iter().cloned())
            .map_err(|e| BoothError::config(e.to_string()))?;
        Ok(reg)
    }

    /// Built-in layouts followed by the configured ones.
    pub fn layout_registry(&self) -> BoothResult<LayoutRegistry> {
        let mut reg = LayoutRegistry::builtin()?;
        reg.extend(self.layouts.iter().cloned())
            .map_err(|e| BoothError::config(e.to_string()))?;
        Ok(reg)
    }

    pub fn compositor(&self) -> Compositor {
        Compositor::with_font_dirs(&self.font_dirs)
    }

    pub fn session(&self) -> BoothResult<CaptureSession> {
        CaptureSession::new(self.max_photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let c = BoothConfig::from_json("{}").unwrap();
        assert_eq!(c, BoothConfig::default());
        assert_eq!(c.max_photos, 10);
        assert_eq!(c.export.format, ExportFormat::Png);
        assert_eq!(c.export.quality, 0.9);
        c.validate().unwrap();
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = BoothConfig::from_json(r#"{ "max_photo": 3 }"#).unwrap_err();
        assert!(matches!(err, BoothError::Config(_)));
    }

    #[test]
    fn overrides_apply_and_bad_values_are_ignored() {
        let mut c = BoothConfig::default();
        c.apply_overrides(|key| match key {
            ENV_MAX_PHOTOS => Some("4".to_owned()),
            ENV_EXPORT_QUALITY => Some("loud".to_owned()),
            _ => None,
        });
        assert_eq!(c.max_photos, 4);
        assert_eq!(c.export.quality, 0.9);
    }

    #[test]
    fn validate_checks_ranges_and_defaults() {
        let mut c = BoothConfig {
            max_photos: 11,
            ..Default::default()
        };
        assert!(c.validate().is_err());

        c.max_photos = 4;
        c.default_layout = "nope".to_owned();
        assert!(c.validate().is_err());

        c.default_layout = "postcard".to_owned();
        c.export.quality = 1.5;
        assert!(c.validate().is_err());
    }

    #[test]
    fn configured_extras_extend_registries() {
        let c = BoothConfig::from_json(
            r##"{
                "default_filter": "punchy",
                "filters": [{ "id": "punchy", "name": "Punchy", "css": "contrast(1.4) saturate(1.2)", "intensity": 0.6 }],
                "layouts": [{
                    "id": "solo", "name": "Solo",
                    "canvas_width": 300, "canvas_height": 300, "photo_slot_count": 1,
                    "background_color": "#000",
                    "slots": [{ "x": 0, "y": 0, "width": 300, "height": 300 }]
                }]
            }"##,
        )
        .unwrap();
        c.validate().unwrap();

        let filters = c.filter_registry().unwrap();
        assert_eq!(filters.list().last().unwrap().id, "punchy");
        assert_eq!(c.layout_registry().unwrap().len(), 7);
    }

    #[test]
    fn duplicate_configured_layout_is_a_config_error() {
        let mut c = BoothConfig::default();
        c.layouts
            .push(LayoutRegistry::builtin().unwrap().get("polaroid").unwrap().clone());
        assert!(matches!(c.layout_registry(), Err(BoothError::Config(_))));
    }
}
