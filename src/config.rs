//! Settings persistence for snapmark
//!
//! Settings are a flat JSON object of optional keys. A key that is missing
//! (or unusable) leaves the in-memory default untouched.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Colors offered by the toolbar palette
pub const PALETTE: [&str; 8] = [
    "#FF0000", "#FFFF00", "#00FF00", "#00FFFF", "#0000FF", "#FF00FF", "#FFFFFF", "#000000",
];

/// Font sizes offered by the toolbar
pub const FONT_SIZES: [f32; 19] = [
    10.0, 12.0, 14.0, 16.0, 20.0, 24.0, 28.0, 32.0, 36.0, 40.0, 44.0, 48.0, 52.0, 56.0, 60.0,
    70.0, 80.0, 90.0, 100.0,
];

/// Stamps offered by the toolbar
pub const STAMPS: [&str; 6] = ["①", "②", "③", "④", "⑤", "⑧"];

pub const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Opaque annotation color, serialized as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShapeColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for ShapeColor {
    fn default() -> Self {
        Self { r: 255, g: 0, b: 0 }
    }
}

impl ShapeColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional)
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Convert to image crate RGBA format
    pub fn to_rgba_u8(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

impl TryFrom<String> for ShapeColor {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).with_context(|| format!("invalid color {value:?}"))
    }
}

impl From<ShapeColor> for String {
    fn from(c: ShapeColor) -> Self {
        c.to_hex()
    }
}

/// Magnifier lens settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MagnifierSettings {
    pub enabled: bool,
    /// Lens radius in logical pixels
    pub radius: f32,
    /// Zoom factor relative to logical pixels
    pub zoom: f32,
}

impl Default for MagnifierSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            radius: 60.0,
            zoom: 4.0,
        }
    }
}

/// Persisted settings, every key optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnifier_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnifier_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub magnifier_zoom: Option<f32>,
}

impl Settings {
    /// Directory name under the platform config dir
    pub const APP_DIR: &'static str = "snapmark";
    pub const FILE_NAME: &'static str = "settings.json";

    /// `<config_dir>/snapmark/settings.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_DIR).join(Self::FILE_NAME))
    }

    /// Load settings from the default location, or return empty settings if unavailable
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => {
                log::warn!("No config directory available, using defaults");
                Self::default()
            }
        }
    }

    /// Load settings from `path`; a missing or malformed file yields empty settings
    pub fn load_from(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings file at {}", path.display());
                return Self::default();
            }
            Err(err) => {
                log::warn!("Could not read settings {}: {err}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str(&text) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("Error loading settings, using defaults: {err}");
                Self::default()
            }
        }
    }

    /// Save settings to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::default_path().context("no config directory available")?;
        self.save_to(&path)
    }

    /// Save settings to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Startup color, if the stored value parses
    pub fn color(&self) -> Option<ShapeColor> {
        let raw = self.default_color.as_deref()?;
        let color = ShapeColor::from_hex(raw);
        if color.is_none() {
            log::warn!("Ignoring invalid defaultColor {raw:?}");
        }
        color
    }

    /// Startup font size; zero or negative values count as missing
    pub fn font_size(&self) -> Option<f32> {
        self.default_font_size.filter(|size| *size > 0.0)
    }

    /// Overlay the stored magnifier keys onto `magnifier`
    pub fn apply_magnifier(&self, magnifier: &mut MagnifierSettings) {
        if let Some(enabled) = self.magnifier_enabled {
            magnifier.enabled = enabled;
        }
        if let Some(size) = self.magnifier_size.filter(|s| *s > 0.0) {
            magnifier.radius = size;
        }
        if let Some(zoom) = self.magnifier_zoom.filter(|z| *z > 0.0) {
            magnifier.zoom = zoom;
        }
    }
}
