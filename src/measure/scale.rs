use std::sync::LazyLock;

use regex::Regex;

use crate::pdf::text_layout::TextPage;

/// "1:100", "1 : 50", "1x200" 形式の縮尺表記
static RE_SCALE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"1\s*[:xX]\s*(\d{1,4})").expect("valid scale regex"));

/// 縮尺が見つからない場合の分母
pub const DEFAULT_SCALE_DENOMINATOR: f64 = 1.0;

/// 文字列から最初の縮尺表記を探し、分母を返す。分母0は無効として扱う。
pub fn parse_scale(text: &str) -> Option<f64> {
    let caps = RE_SCALE.captures(text)?;
    let denominator: f64 = caps.get(1)?.as_str().parse().ok()?;
    (denominator > 0.0).then_some(denominator)
}

/// ページの全テキストを連結して縮尺分母を探す。
pub fn resolve_scale(text: &TextPage) -> Option<f64> {
    parse_scale(&text.full_text())
}
