use lopdf::content::{Content, Operation};

use crate::geometry::Point;

/// 6要素アフィン変換行列 [a, b, c, d, e, f]
/// PDF仕様: [ a b 0 ]
///          [ c d 0 ]
///          [ e f 1 ]
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    /// 単位行列を返す。
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// 平行移動行列
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self {
            e: tx,
            f: ty,
            ..Self::identity()
        }
    }

    /// self * other (行列の右乗算)
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    /// 点 (x, y) を変換する。
    pub fn apply(&self, x: f64, y: f64) -> Point {
        Point::new(
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// 6個の数値オペランドから行列を作る（cm, Tm, /Matrix 用）。
    pub fn from_operands(operands: &[lopdf::Object]) -> crate::error::Result<Matrix> {
        if operands.len() != 6 {
            return Err(crate::error::DuctError::content_stream(format!(
                "expected 6 matrix operands, got {}",
                operands.len()
            )));
        }
        let vals: Vec<f64> = operands
            .iter()
            .map(operand_to_f64)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Matrix {
            a: vals[0],
            b: vals[1],
            c: vals[2],
            d: vals[3],
            e: vals[4],
            f: vals[5],
        })
    }
}

/// PDFユーザー空間(左下原点, y上向き)からページ座標(表示領域の左上原点, y下向き)への変換。
///
/// `page_box` は `[x0, y0, x1, y1]`（CropBoxまたはMediaBox）。
pub fn page_space_matrix(page_box: [f64; 4]) -> Matrix {
    let x0 = page_box[0].min(page_box[2]);
    let top = page_box[1].max(page_box[3]);
    Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: -1.0,
        e: -x0,
        f: top,
    }
}

/// コンテンツストリームのバイト列をオペレータ列にデコードする。
/// 空バイト列は空のオペレータ列として扱う。
pub fn decode_operations(content_bytes: &[u8]) -> crate::error::Result<Vec<Operation>> {
    // 空バイト列の場合、lopdfのパーサがエラーを返す可能性があるため特別扱い
    if content_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let content = Content::decode(content_bytes)
        .map_err(|e| crate::error::DuctError::content_stream(e.to_string()))?;
    Ok(content.operations)
}

/// lopdfのObjectから数値をf64として取得する。
pub(crate) fn operand_to_f64(obj: &lopdf::Object) -> crate::error::Result<f64> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(r) => Ok(*r as f64),
        _ => Err(crate::error::DuctError::content_stream(format!(
            "expected numeric operand, got {:?}",
            obj
        ))),
    }
}

/// 全オペランドを数値として取得する。要素数が合わない場合や数値でない場合はNone。
pub(crate) fn numeric_operands<const N: usize>(operands: &[lopdf::Object]) -> Option<[f64; N]> {
    if operands.len() != N {
        return None;
    }
    let mut out = [0.0; N];
    for (slot, obj) in out.iter_mut().zip(operands) {
        *slot = operand_to_f64(obj).ok()?;
    }
    Some(out)
}
