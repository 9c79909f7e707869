use super::job::Job;
use super::settings::Settings;
use crate::measure::{ColorRule, MeasureOptions};

#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub color_tolerance: u8,
    pub supply_color: [u8; 3],
    pub extract_color: [u8; 3],
    pub max_label_distance: f64,
    pub scale: Option<f64>,
    pub crop_zoom: f64,
    pub crop_limit: usize,
    pub parallel_workers: usize,
}

impl MergedConfig {
    /// JobのOption値がSomeならJobの値を、NoneならSettingsの値を使用する。
    pub fn new(settings: &Settings, job: &Job) -> Self {
        MergedConfig {
            color_tolerance: job.color_tolerance.unwrap_or(settings.color_tolerance),
            supply_color: settings.supply_color,
            extract_color: settings.extract_color,
            max_label_distance: job
                .max_label_distance
                .unwrap_or(settings.max_label_distance),
            scale: job.scale,
            crop_zoom: job.crop_zoom.unwrap_or(settings.crop_zoom),
            crop_limit: job.crop_limit.unwrap_or(settings.crop_limit),
            parallel_workers: settings.parallel_workers,
        }
    }

    /// 数値の範囲を検証する（縮尺・距離・倍率は正であること）。
    pub fn validate(&self) -> crate::error::Result<()> {
        if let Some(scale) = self.scale
            && !(scale > 0.0)
        {
            return Err(crate::error::DuctError::config(format!(
                "scale must be positive, got {scale}"
            )));
        }
        if !(self.max_label_distance > 0.0) {
            return Err(crate::error::DuctError::config(format!(
                "max_label_distance must be positive, got {}",
                self.max_label_distance
            )));
        }
        if !(self.crop_zoom > 0.0) {
            return Err(crate::error::DuctError::config(format!(
                "crop_zoom must be positive, got {}",
                self.crop_zoom
            )));
        }
        Ok(())
    }

    pub fn measure_options(&self) -> MeasureOptions {
        MeasureOptions {
            colors: ColorRule {
                supply: self.supply_color,
                extract: self.extract_color,
                tolerance: self.color_tolerance,
            },
            max_label_distance: self.max_label_distance,
            scale_override: self.scale,
        }
    }
}
