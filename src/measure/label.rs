use std::sync::LazyLock;

use regex::Regex;

use crate::geometry::{Point, centroid};
use crate::pdf::text_layout::TextPage;

/// ラベル探索の既定最大距離（ポイント）
pub const DEFAULT_MAX_LABEL_DISTANCE: f64 = 60.0;

// 先に当たったものを採用するため、mm・直径記号を寸法(AxB)より先に試す
static RE_SIZE_MM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{2,4})\s*[mM][mM]").expect("valid mm regex"));
static RE_SIZE_DIAMETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2,4})\s*[øØ⌀]|[øØ⌀]\s*(\d{2,4})").expect("valid diameter regex")
});
static RE_SIZE_RECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2,4})\s*[xX×]\s*(\d{2,4})").expect("valid rectangular size regex")
});

/// 正規化済みのダクト寸法
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SizeLabel {
    /// 丸ダクト "<N>mm"
    Round(String),
    /// 角ダクト "<W>x<H>"
    Rectangular(String, String),
    Unknown,
}

impl std::fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeLabel::Round(d) => write!(f, "{d}mm"),
            SizeLabel::Rectangular(w, h) => write!(f, "{w}x{h}"),
            SizeLabel::Unknown => f.write_str("unknown"),
        }
    }
}

/// ラベル文字列から寸法を読み取る。どのパターンにも当たらなければ `Unknown`。
pub fn parse_size(label: &str) -> SizeLabel {
    if let Some(caps) = RE_SIZE_MM.captures(label) {
        return SizeLabel::Round(caps[1].to_string());
    }
    if let Some(caps) = RE_SIZE_DIAMETER.captures(label)
        && let Some(digits) = caps.get(1).or_else(|| caps.get(2))
    {
        return SizeLabel::Round(digits.as_str().to_string());
    }
    if let Some(caps) = RE_SIZE_RECT.captures(label) {
        return SizeLabel::Rectangular(caps[1].to_string(), caps[2].to_string());
    }
    SizeLabel::Unknown
}

/// 点列の重心に最も近いテキストスパンを探し、その文字列(前後空白除去)を返す。
///
/// 距離はスパンBBox中心と重心のユークリッド距離。`max_distance` 以下のものだけが
/// 候補で、同距離なら走査順で先のスパンが勝つ。
pub fn find_label(points: &[Point], text: &TextPage, max_distance: f64) -> Option<String> {
    let center = centroid(points)?;

    let mut nearest: Option<(f64, &str)> = None;
    for span in text.spans() {
        let d = span.bbox.center().distance(&center);
        if d > max_distance {
            continue;
        }
        if nearest.is_none_or(|(best, _)| d < best) {
            nearest = Some((d, span.text.as_str()));
        }
    }

    nearest.map(|(_, t)| t.trim().to_string())
}

/// 最寄りラベルを探して寸法に変換する。ラベルが無ければ `Unknown`。
pub fn resolve_size(points: &[Point], text: &TextPage, max_distance: f64) -> SizeLabel {
    find_label(points, text, max_distance)
        .map(|label| parse_size(&label))
        .unwrap_or(SizeLabel::Unknown)
}
