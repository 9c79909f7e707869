use std::path::Path;

use crate::geometry::{BBox, points_to_mm, polyline_length};
use crate::measure::classify::{ColorRule, Role, classify};
use crate::measure::label::{DEFAULT_MAX_LABEL_DISTANCE, resolve_size};
use crate::measure::result::MeasurementResult;
use crate::measure::scale::{DEFAULT_SCALE_DENOMINATOR, resolve_scale};
use crate::pdf::page_scan::PageLayout;
use crate::pdf::reader::PdfReader;

/// 計測対象のページ（1-indexed）。図面は1ページ目のみを見る。
const DRAWING_PAGE: u32 = 1;

/// 計測パラメータ
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureOptions {
    pub colors: ColorRule,
    /// ラベル探索の最大距離（ポイント）
    pub max_label_distance: f64,
    /// Someならページ上の縮尺表記より優先する
    pub scale_override: Option<f64>,
}

impl Default for MeasureOptions {
    fn default() -> Self {
        MeasureOptions {
            colors: ColorRule::default(),
            max_label_distance: DEFAULT_MAX_LABEL_DISTANCE,
            scale_override: None,
        }
    }
}

/// PDFファイルの1ページ目を計測する。
///
/// ドキュメントはこの関数内で開き、戻る前に必ず解放される。
pub fn measure(
    pdf_path: impl AsRef<Path>,
    options: &MeasureOptions,
) -> crate::error::Result<MeasurementResult> {
    let pdf_path = pdf_path.as_ref();
    let layout = {
        let reader = PdfReader::open(pdf_path)?;
        reader.page_layout(DRAWING_PAGE)?
    };
    tracing::info!(
        path = %pdf_path.display(),
        drawings = layout.drawings.len(),
        "page 1 extracted"
    );
    Ok(measure_layout(&layout, options))
}

/// メモリ上のPDFバイト列を計測する。
pub fn measure_bytes(
    bytes: &[u8],
    options: &MeasureOptions,
) -> crate::error::Result<MeasurementResult> {
    let layout = {
        let reader = PdfReader::from_bytes(bytes)?;
        reader.page_layout(DRAWING_PAGE)?
    };
    Ok(measure_layout(&layout, options))
}

/// 走査済みページを計測する。
///
/// 描画は出現順に処理し、系統・寸法ごとに長さを合算、BBoxを検出順に追加する。
pub fn measure_layout(layout: &PageLayout, options: &MeasureOptions) -> MeasurementResult {
    let scale = options
        .scale_override
        .or_else(|| resolve_scale(&layout.text))
        .unwrap_or(DEFAULT_SCALE_DENOMINATOR);
    tracing::debug!(scale, "scale denominator resolved");

    let mut result = MeasurementResult::new(scale);

    for drawing in &layout.drawings {
        let role = classify(drawing.stroke_color, &options.colors);
        if role == Role::Discarded {
            continue;
        }

        for item in &drawing.items {
            let points = item.points();
            let Some(bbox) = BBox::from_points(&points) else {
                tracing::debug!(?item, "primitive without points skipped");
                continue;
            };

            let length_mm = points_to_mm(polyline_length(&points), scale);
            let size = resolve_size(&points, &layout.text, options.max_label_distance);

            if let Some(totals) = result.role_mut(role) {
                totals.add(&size.to_string(), length_mm, bbox);
            }
        }
    }

    tracing::debug!(
        supply_sizes = result.supply.lengths_mm.len(),
        extract_sizes = result.extract.lengths_mm.len(),
        "measurement finished"
    );

    result
}
