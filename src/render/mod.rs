// Region cropping: page-point bbox -> pixel rectangle on a rendered page

#[cfg(feature = "render")]
pub mod pdfium;

use image::DynamicImage;

use crate::geometry::BBox;

/// Pixel rectangle inside a rendered page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps a page-point bbox (top-left origin) to pixels on a page rendered at `zoom`
/// pixels per point, clamped to the `image_width` x `image_height` bitmap.
///
/// Degenerate boxes (a horizontal or vertical segment) still yield at least one
/// pixel. Returns `None` when the box lies entirely outside the image.
pub fn crop_pixel_rect(
    bbox: &BBox,
    zoom: f64,
    image_width: u32,
    image_height: u32,
) -> Option<PixelRect> {
    if image_width == 0 || image_height == 0 || zoom <= 0.0 {
        return None;
    }

    let x0 = (bbox.x_min.min(bbox.x_max) * zoom).floor();
    let y0 = (bbox.y_min.min(bbox.y_max) * zoom).floor();
    let x1 = (bbox.x_min.max(bbox.x_max) * zoom).ceil().max(x0 + 1.0);
    let y1 = (bbox.y_min.max(bbox.y_max) * zoom).ceil().max(y0 + 1.0);

    let max_x = image_width as f64;
    let max_y = image_height as f64;
    if x1 <= 0.0 || y1 <= 0.0 || x0 >= max_x || y0 >= max_y {
        return None;
    }

    let cx0 = x0.max(0.0);
    let cy0 = y0.max(0.0);
    let cx1 = x1.min(max_x);
    let cy1 = y1.min(max_y);

    Some(PixelRect {
        x: cx0 as u32,
        y: cy0 as u32,
        width: (cx1 - cx0) as u32,
        height: (cy1 - cy0) as u32,
    })
}

/// Crops an already rendered page image to `bbox`.
///
/// # Errors
/// Returns `DuctError::RenderError` when the box lies outside the page.
pub fn crop_rendered(
    page_image: &DynamicImage,
    bbox: &BBox,
    zoom: f64,
) -> crate::error::Result<DynamicImage> {
    let rect = crop_pixel_rect(bbox, zoom, page_image.width(), page_image.height())
        .ok_or_else(|| {
            crate::error::DuctError::render(format!(
                "bbox [{}, {}, {}, {}] lies outside the rendered page",
                bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max
            ))
        })?;
    Ok(page_image.crop_imm(rect.x, rect.y, rect.width, rect.height))
}
