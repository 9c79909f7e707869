use serde::{Deserialize, Serialize};

/// ダクト系統の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Supply,
    Extract,
    Discarded,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Supply => "supply",
            Role::Extract => "extract",
            Role::Discarded => "discarded",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分類の基準色と許容差
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRule {
    pub supply: [u8; 3],
    pub extract: [u8; 3],
    /// チャネルごとの許容差（この値ちょうどは一致扱い）
    pub tolerance: u8,
}

impl Default for ColorRule {
    fn default() -> Self {
        ColorRule {
            supply: [255, 0, 0],
            extract: [0, 0, 255],
            tolerance: 80,
        }
    }
}

/// 正規化RGB(0.0〜1.0)を0〜255の整数RGBに変換する。範囲外はクランプ、端数は切り捨て。
/// 色が無い場合は黒。
pub fn to_rgb8(color: Option<[f64; 3]>) -> [u8; 3] {
    match color {
        Some(c) => c.map(|v| (v.clamp(0.0, 1.0) * 255.0) as u8),
        None => [0, 0, 0],
    }
}

/// 全チャネルで差が許容差以内か。
pub fn is_color_close(rgb: [u8; 3], target: [u8; 3], tolerance: u8) -> bool {
    rgb.iter()
        .zip(target.iter())
        .all(|(&a, &b)| a.abs_diff(b) <= tolerance)
}

/// ストローク色から系統を決める。
///
/// 判定順は extract → supply。両方に一致する色は extract になる。
pub fn classify(stroke_color: Option<[f64; 3]>, rule: &ColorRule) -> Role {
    let rgb = to_rgb8(stroke_color);
    if is_color_close(rgb, rule.extract, rule.tolerance) {
        Role::Extract
    } else if is_color_close(rgb, rule.supply, rule.tolerance) {
        Role::Supply
    } else {
        Role::Discarded
    }
}
