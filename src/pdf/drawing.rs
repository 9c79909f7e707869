use crate::geometry::Point;

/// デバイス色空間の色（ストローク・塗りつぶし共通）
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceColor {
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}

impl DeviceColor {
    pub(crate) fn default_black() -> Self {
        DeviceColor::Gray(0.0)
    }

    /// 正規化RGB（各チャネル0.0〜1.0想定、範囲外もそのまま返す）に変換する。
    pub fn to_rgb(&self) -> [f64; 3] {
        match *self {
            DeviceColor::Gray(g) => [g, g, g],
            DeviceColor::Rgb(r, g, b) => [r, g, b],
            DeviceColor::Cmyk(c, m, y, k) => [
                (1.0 - c) * (1.0 - k),
                (1.0 - m) * (1.0 - k),
                (1.0 - y) * (1.0 - k),
            ],
        }
    }

    /// オペランド数から色を組み立てる（1=Gray, 3=RGB, 4=CMYK）。
    pub(crate) fn from_components(vals: &[f64]) -> Option<Self> {
        match *vals {
            [g] => Some(DeviceColor::Gray(g)),
            [r, g, b] => Some(DeviceColor::Rgb(r, g, b)),
            [c, m, y, k] => Some(DeviceColor::Cmyk(c, m, y, k)),
            _ => None,
        }
    }
}

/// パスを構成する描画要素。座標はすべてページ座標系に変換済み。
#[derive(Debug, Clone, PartialEq)]
pub enum PathItem {
    /// 線分 (始点, 終点)
    Line(Point, Point),
    /// 矩形の4隅 (x0,y0), (x1,y0), (x1,y1), (x0,y1) の順
    ///
    /// 長さは4隅を順にたどる開いた折れ線（2w + h）で、周長ではない。
    Rect([Point; 4]),
    /// 3次ベジェ曲線 (始点, 制御点1, 制御点2, 終点)
    Curve([Point; 4]),
}

impl PathItem {
    /// 長さ・BBox計算に使う点列を返す。
    ///
    /// 種類ごとの分岐はここだけで行い、以降は点列として一様に扱う。
    pub fn points(&self) -> Vec<Point> {
        match self {
            PathItem::Line(p0, p1) => vec![*p0, *p1],
            PathItem::Rect(corners) => corners.to_vec(),
            PathItem::Curve(pts) => pts.to_vec(),
        }
    }
}

/// 1回の描画オペレータ(S, f, B 等)で描かれたパス
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    pub items: Vec<PathItem>,
    /// ストロークされたパスのみSome（正規化RGB）
    pub stroke_color: Option<[f64; 3]>,
    /// 塗りつぶされたパスのみSome（正規化RGB）
    pub fill_color: Option<[f64; 3]>,
}
