// pdfium-render wrapper: page -> DynamicImage at a zoom factor, and region crops

use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

use crate::geometry::BBox;

/// Resolves the path to the pdfium shared library.
///
/// Search order:
/// 1. `PDFIUM_DYNAMIC_LIB_PATH` environment variable
/// 2. `vendor/pdfium/lib/` relative to the project root (for development)
fn resolve_pdfium_lib_path() -> crate::error::Result<PathBuf> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Ok(p);
        }
        return Err(crate::error::DuctError::render(format!(
            "PDFIUM_DYNAMIC_LIB_PATH is set to '{}' but the path does not exist",
            path
        )));
    }

    // In development, CARGO_MANIFEST_DIR points to the project root.
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        let vendor_path = PathBuf::from(&manifest_dir).join("vendor/pdfium/lib");
        if vendor_path.exists() {
            return Ok(vendor_path);
        }
    }

    Err(crate::error::DuctError::render(
        "pdfium library not found: set PDFIUM_DYNAMIC_LIB_PATH or place libpdfium.so in vendor/pdfium/lib/",
    ))
}

/// Creates a new Pdfium instance by dynamically loading the shared library.
fn create_pdfium() -> crate::error::Result<Pdfium> {
    let lib_path = resolve_pdfium_lib_path()?;
    let lib_path_str = lib_path.to_str().ok_or_else(|| {
        crate::error::DuctError::render("pdfium library path contains non-UTF-8 characters")
    })?;
    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(lib_path_str))?;
    Ok(Pdfium::new(bindings))
}

/// Renders a PDF page at `zoom` pixels per point and returns a DynamicImage.
///
/// # Arguments
/// * `pdf_path` - Path to the PDF file
/// * `page_index` - 0-indexed page number
/// * `zoom` - Magnification (1.0 = 72 DPI, 2.0 = 144 DPI)
///
/// # Errors
/// Returns `DuctError::RenderError` if:
/// - The pdfium library cannot be initialized
/// - The PDF file cannot be opened
/// - The page index is out of range
/// - Rendering fails
pub fn render_page(pdf_path: &Path, page_index: u32, zoom: f64) -> crate::error::Result<DynamicImage> {
    if zoom <= 0.0 {
        return Err(crate::error::DuctError::render(format!(
            "zoom must be positive, got {zoom}"
        )));
    }

    let pdfium = create_pdfium()?;

    let document = pdfium.load_pdf_from_file(pdf_path, None)?;

    let page_index_u16 = u16::try_from(page_index)
        .map_err(|_| crate::error::DuctError::render("page index exceeds u16 range"))?;

    let page = document.pages().get(page_index_u16)?;

    let width_px = (page.width().value as f64 * zoom).round().max(1.0) as i32;
    let height_px = (page.height().value as f64 * zoom).round().max(1.0) as i32;

    let config = PdfRenderConfig::new()
        .set_target_width(width_px)
        .set_target_height(height_px);

    let bitmap = page.render_with_config(&config)?;

    tracing::debug!(
        path = %pdf_path.display(),
        page_index,
        width_px,
        height_px,
        "page rendered"
    );

    Ok(bitmap.as_image())
}

/// Renders page `page_index` at `zoom` and crops it to `bbox` (page points,
/// top-left origin).
pub fn crop_region(
    pdf_path: &Path,
    page_index: u32,
    bbox: &BBox,
    zoom: f64,
) -> crate::error::Result<DynamicImage> {
    let page_image = render_page(pdf_path, page_index, zoom)?;
    super::crop_rendered(&page_image, bbox, zoom)
}
