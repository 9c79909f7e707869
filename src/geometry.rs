use serde::{Deserialize, Serialize};

/// 1ポイント(1/72インチ)あたりのミリメートル
pub const POINTS_TO_MM: f64 = 25.4 / 72.0;

/// ページ座標系の点（単位: ポイント、原点はページ左上、y軸は下向き）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// 2点間のユークリッド距離
    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// 軸平行バウンディングボックス。
///
/// JSONでは `[x_min, y_min, x_max, y_max]` の配列として表現する。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", from = "[f64; 4]")]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBox {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// 点集合のmin/maxを取る。点が無ければNone。
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let x_min = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let y_min = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let x_max = points
            .iter()
            .map(|p| p.x)
            .fold(f64::NEG_INFINITY, f64::max);
        let y_max = points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);

        Some(BBox {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

/// 連続する点間の距離の総和（ポイント単位）。2点未満なら0。
pub fn polyline_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(&w[1])).sum()
}

/// 点集合の算術平均。点が無ければNone。
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sx: f64 = points.iter().map(|p| p.x).sum();
    let sy: f64 = points.iter().map(|p| p.y).sum();
    Some(Point::new(sx / n, sy / n))
}

/// 図面上の長さ(ポイント)を縮尺分母を掛けた実寸(mm)に換算する。
pub fn points_to_mm(length_pts: f64, scale_denominator: f64) -> f64 {
    length_pts * POINTS_TO_MM * scale_denominator
}
