// コンテンツストリーム基盤（行列・デコード）のテスト

use lopdf::Object;
use lopdf::content::{Content, Operation};

use duct_takeoff::error::DuctError;
use duct_takeoff::geometry::Point;
use duct_takeoff::pdf::content_stream::{Matrix, decode_operations, page_space_matrix};

fn assert_point(actual: Point, x: f64, y: f64) {
    assert!(
        (actual.x - x).abs() < 1e-9 && (actual.y - y).abs() < 1e-9,
        "expected ({x}, {y}), got ({}, {})",
        actual.x,
        actual.y
    );
}

// ============================================================
// 1. 行列演算
// ============================================================

#[test]
fn test_identity_apply() {
    assert_point(Matrix::identity().apply(3.0, 4.0), 3.0, 4.0);
}

#[test]
fn test_translate_apply() {
    assert_point(Matrix::translate(10.0, -5.0).apply(1.0, 1.0), 11.0, -4.0);
}

#[test]
fn test_multiply_applies_left_operand_first() {
    let scale = Matrix {
        a: 2.0,
        d: 2.0,
        ..Matrix::identity()
    };
    let shift = Matrix::translate(100.0, 0.0);

    // scale → shift
    assert_point(scale.multiply(&shift).apply(10.0, 0.0), 120.0, 0.0);
    // shift → scale
    assert_point(shift.multiply(&scale).apply(10.0, 0.0), 220.0, 0.0);
}

#[test]
fn test_from_operands() {
    let ops: Vec<Object> = vec![
        1.into(),
        0.into(),
        0.into(),
        Object::Real(-1.0),
        Object::Real(12.5),
        792.into(),
    ];
    let m = Matrix::from_operands(&ops).expect("six numeric operands");
    assert_eq!(m.d, -1.0);
    assert_eq!(m.e, 12.5);
    assert_eq!(m.f, 792.0);
}

#[test]
fn test_from_operands_wrong_count() {
    let ops: Vec<Object> = vec![1.into(), 0.into()];
    let err = Matrix::from_operands(&ops).expect_err("two operands is not a matrix");
    assert!(matches!(err, DuctError::ContentStreamError(_)));
}

// ============================================================
// 2. ページ座標系への変換
// ============================================================

#[test]
fn test_page_space_flips_y() {
    let m = page_space_matrix([0.0, 0.0, 612.0, 792.0]);
    assert_point(m.apply(0.0, 792.0), 0.0, 0.0);
    assert_point(m.apply(100.0, 700.0), 100.0, 92.0);
}

#[test]
fn test_page_space_offset_media_box() {
    let m = page_space_matrix([50.0, 100.0, 650.0, 900.0]);
    // MediaBox左上 (50, 900) が原点になる
    assert_point(m.apply(50.0, 900.0), 0.0, 0.0);
    assert_point(m.apply(150.0, 800.0), 100.0, 100.0);
}

// ============================================================
// 3. デコード
// ============================================================

#[test]
fn test_decode_operations_roundtrip_operators() {
    let content = Content {
        operations: vec![
            Operation::new("RG", vec![1.into(), 0.into(), 0.into()]),
            Operation::new("m", vec![100.into(), 100.into()]),
            Operation::new("l", vec![200.into(), 100.into()]),
            Operation::new("S", vec![]),
        ],
    };
    let bytes = content.encode().expect("encode content");

    let ops = decode_operations(&bytes).expect("decode content");
    let names: Vec<&str> = ops.iter().map(|op| op.operator.as_str()).collect();
    assert_eq!(names, vec!["RG", "m", "l", "S"]);
    assert_eq!(ops[1].operands.len(), 2);
}

#[test]
fn test_decode_operations_empty() {
    let ops = decode_operations(b"").expect("empty content is valid");
    assert!(ops.is_empty());
}
