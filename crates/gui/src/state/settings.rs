//! Application settings

use serde::{Deserialize, Serialize};

use crate::viewport::frame::DEFAULT_DRIFT_THRESHOLD;
use crate::viewport::resources::DEFAULT_CHUNK_CEILING;

/// Viewport colours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    /// Background color RGB
    pub background_color: [u8; 3],
    /// Selection highlight color RGB
    pub selection_color: [u8; 3],
    /// Default hole track color RGB
    pub hole_color: [u8; 3],
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            background_color: [24, 26, 30],
            selection_color: [0, 220, 255],
            hole_color: [235, 170, 40],
        }
    }
}

/// Plan-view grid settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    pub visible: bool,
    /// Grid spacing in metres
    pub spacing: f64,
    /// Grid line opacity (0.0 - 1.0)
    pub opacity: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            visible: true,
            spacing: 10.0,
            opacity: 0.35,
        }
    }
}

/// Precision and resource limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionSettings {
    /// Centroid drift (metres) that re-anchors the local frame
    pub drift_threshold: f64,
    /// Vertex ceiling per GPU line chunk
    pub chunk_ceiling: usize,
}

impl Default for PrecisionSettings {
    fn default() -> Self {
        Self {
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            chunk_ceiling: DEFAULT_CHUNK_CEILING,
        }
    }
}

/// UI settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    pub font_size: f32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self { font_size: 14.0 }
    }
}

/// Combined application settings, persisted as JSON in the user config dir
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppSettings {
    #[serde(default)]
    pub viewport: ViewportSettings,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub precision: PrecisionSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

impl AppSettings {
    fn settings_path() -> Option<std::path::PathBuf> {
        directories::ProjectDirs::from("com", "blastpad", "blastpad")
            .map(|dirs| dirs.config_dir().join("settings.json"))
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse settings, using defaults: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist settings. Failures are logged, never fatal.
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else {
            return;
        };
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("Failed to save settings: {e}");
                }
            }
            Err(e) => tracing::warn!("Failed to serialize settings: {e}"),
        }
    }

    /// Selection color as RGBA floats for mesh building
    pub fn selection_rgba(&self) -> [f32; 4] {
        rgb_to_rgba(self.viewport.selection_color)
    }

    /// Hole track color as RGBA floats
    pub fn hole_rgba(&self) -> [f32; 4] {
        rgb_to_rgba(self.viewport.hole_color)
    }
}

fn rgb_to_rgba(rgb: [u8; 3]) -> [f32; 4] {
    [
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
        1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_serde_round_trip() {
        let mut settings = AppSettings::default();
        settings.grid.spacing = 25.0;
        settings.precision.chunk_ceiling = 8_000;
        let json = serde_json::to_string(&settings).unwrap();
        let back: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let settings: AppSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, AppSettings::default());
    }
}
