use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub color_tolerance: u8,
    pub supply_color: [u8; 3],
    pub extract_color: [u8; 3],
    pub max_label_distance: f64,
    pub crop_zoom: f64,
    pub crop_limit: usize,
    pub parallel_workers: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            color_tolerance: 80,
            supply_color: [255, 0, 0],
            extract_color: [0, 0, 255],
            max_label_distance: 60.0,
            crop_zoom: 2.0,
            crop_limit: 5,
            parallel_workers: 0,
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::DuctError::config(format!("Failed to parse settings YAML: {e}"))
        })
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}
