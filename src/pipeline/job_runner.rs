// Job unit: measure page 1 -> write result JSON -> optional illustration crops

use std::path::PathBuf;

use crate::measure::{MeasureOptions, MeasurementResult, measure};

/// Configuration for a single job.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub input_path: PathBuf,
    /// Destination of the measurement result JSON.
    pub output_path: PathBuf,
    /// When set, the first `crop_limit` boxes per role and size are cropped here.
    pub crops_dir: Option<PathBuf>,
    pub options: MeasureOptions,
    pub crop_zoom: f64,
    pub crop_limit: usize,
}

/// Result of processing a single job.
#[derive(Debug)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub measurement: MeasurementResult,
    pub crops_written: Vec<PathBuf>,
}

/// Run a single measurement job.
///
/// The result JSON is written before any crop is attempted, so a rendering
/// problem never loses the measurement itself.
pub fn run_job(config: &JobConfig) -> crate::error::Result<JobResult> {
    let measurement = measure(&config.input_path, &config.options)?;

    write_result_json(&measurement, &config.output_path)?;
    tracing::info!(
        input = %config.input_path.display(),
        output = %config.output_path.display(),
        primitives = measurement.primitive_count(),
        scale = measurement.scale_denominator,
        "measurement written"
    );

    let crops_written = match &config.crops_dir {
        Some(dir) => export_crops(config, &measurement, dir)?,
        None => Vec::new(),
    };

    Ok(JobResult {
        input_path: config.input_path.clone(),
        output_path: config.output_path.clone(),
        measurement,
        crops_written,
    })
}

/// Serializes the result as pretty JSON, creating parent directories as needed.
pub fn write_result_json(
    measurement: &MeasurementResult,
    output_path: &std::path::Path,
) -> crate::error::Result<()> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(measurement)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// File name of the `index`-th crop for a role and size, e.g. `supply_200mm_0.png`.
pub fn crop_file_name(role: &str, size: &str, index: usize) -> String {
    format!("{role}_{size}_{index}.png")
}

#[cfg(feature = "render")]
fn export_crops(
    config: &JobConfig,
    measurement: &MeasurementResult,
    dir: &std::path::Path,
) -> crate::error::Result<Vec<PathBuf>> {
    use crate::render::crop_rendered;
    use crate::render::pdfium::render_page;

    if measurement.primitive_count() == 0 || config.crop_limit == 0 {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(dir)?;
    // Page 1 is rendered once and shared by every crop.
    let page_image = render_page(&config.input_path, 0, config.crop_zoom)?;

    let mut written = Vec::new();
    for (role, totals) in measurement.roles() {
        for (size, boxes) in &totals.images {
            for (i, bbox) in boxes.iter().take(config.crop_limit).enumerate() {
                let path = dir.join(crop_file_name(role.as_str(), size, i));
                let saved = crop_rendered(&page_image, bbox, config.crop_zoom)
                    .and_then(|img| img.save(&path).map_err(Into::into));
                match saved {
                    Ok(()) => written.push(path),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "crop skipped");
                    }
                }
            }
        }
    }

    Ok(written)
}

#[cfg(not(feature = "render"))]
fn export_crops(
    _config: &JobConfig,
    _measurement: &MeasurementResult,
    dir: &std::path::Path,
) -> crate::error::Result<Vec<PathBuf>> {
    tracing::warn!(
        dir = %dir.display(),
        "crops requested but the render feature is disabled"
    );
    Ok(Vec::new())
}
