use lopdf::{Dictionary, Document, Object, Stream, dictionary};

use duct_takeoff::error::DuctError;
use duct_takeoff::pdf::drawing::PathItem;
use duct_takeoff::pdf::reader::PdfReader;

/// ヘルパー: 指定されたMediaBoxを持つ最小限のPDFドキュメントを作成する
fn create_test_pdf_with_media_box(media_box: Vec<Object>) -> Document {
    create_test_pdf(media_box, vec![Vec::new()], dictionary! {})
}

/// ヘルパー: コンテンツストリーム列とリソース辞書を持つ1ページPDFを作成する
fn create_test_pdf(media_box: Vec<Object>, contents: Vec<Vec<u8>>, resources: Dictionary) -> Document {
    let mut doc = Document::with_version("1.7");
    add_single_page(&mut doc, media_box, contents, resources);
    doc
}

/// ヘルパー: 既存のドキュメントに1ページだけのページツリーとCatalogを組み立てる
fn add_single_page(
    doc: &mut Document,
    media_box: Vec<Object>,
    contents: Vec<Vec<u8>>,
    resources: Dictionary,
) {
    let pages_id = doc.new_object_id();
    let content_ids: Vec<Object> = contents
        .into_iter()
        .map(|bytes| doc.add_object(Stream::new(dictionary! {}, bytes)).into())
        .collect();
    let contents_obj = if content_ids.len() == 1 {
        content_ids[0].clone()
    } else {
        Object::Array(content_ids)
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => media_box,
        "Contents" => contents_obj,
        "Resources" => resources,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
}

/// ヘルパー: MediaBoxを持たないページと、MediaBoxを持つ親Pagesノードを持つPDFを作成
fn create_test_pdf_with_inherited_media_box(media_box: Vec<Object>) -> Document {
    let mut doc = Document::with_version("1.7");

    let pages_id = doc.new_object_id();
    let contents_id = doc.add_object(Stream::new(dictionary! {}, vec![]));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => contents_id,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "MediaBox" => media_box,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc
}

fn letter() -> Vec<Object> {
    vec![0.into(), 0.into(), 612.into(), 792.into()]
}

fn crop_36() -> Vec<Object> {
    vec![36.into(), 36.into(), 576.into(), 756.into()]
}

/// ヘルパー: 1ページ目のページ辞書にエントリを追加する
fn set_page_entry(doc: &mut Document, key: &str, value: Vec<Object>) {
    let page_id = *doc.get_pages().get(&1).expect("page 1");
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set(key, value);
    }
}

fn open_saved(doc: &mut Document) -> (tempfile::NamedTempFile, PdfReader) {
    let temp_file = tempfile::NamedTempFile::new().expect("create temp file");
    doc.save(temp_file.path()).expect("save test PDF");
    let reader = PdfReader::open(temp_file.path()).expect("open test PDF");
    (temp_file, reader)
}

// ============================================================
// 1. ドキュメントを開く
// ============================================================

#[test]
fn test_open_nonexistent_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let result = PdfReader::open(dir.path().join("missing.pdf"));
    assert!(matches!(result, Err(DuctError::DocumentOpenError(_))));
}

#[test]
fn test_open_non_pdf_bytes() {
    let result = PdfReader::from_bytes(b"this is not a pdf");
    assert!(matches!(result, Err(DuctError::DocumentOpenError(_))));
}

#[test]
fn test_missing_page_is_error() {
    let mut doc = create_test_pdf_with_media_box(letter());
    let (_file, reader) = open_saved(&mut doc);
    assert!(matches!(
        reader.page_layout(2),
        Err(DuctError::PdfReadError(_))
    ));
}

// ============================================================
// 2. MediaBox
// ============================================================

#[test]
fn test_media_box_basic_functionality() {
    // A4サイズ（595.276 × 841.89 pt）
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(595.276),
        Object::Real(841.89),
    ];
    let mut doc = create_test_pdf_with_media_box(media_box);
    let (_file, reader) = open_saved(&mut doc);
    let rect = reader.media_box(1).expect("page 1 media box");

    assert!((rect[2] - 595.276).abs() < 0.01, "width should be ~595.276");
    assert!((rect[3] - 841.89).abs() < 0.01, "height should be ~841.89");
}

#[test]
fn test_media_box_with_non_zero_origin() {
    let media_box = vec![
        Object::Integer(10),
        Object::Integer(20),
        Object::Integer(605),
        Object::Integer(812),
    ];
    let mut doc = create_test_pdf_with_media_box(media_box);
    let (_file, reader) = open_saved(&mut doc);

    assert_eq!(
        reader.media_box(1).expect("media box"),
        [10.0, 20.0, 605.0, 812.0]
    );
}

#[test]
fn test_media_box_inherited_from_parent() {
    let mut doc = create_test_pdf_with_inherited_media_box(letter());
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.media_box(1).expect("media box"),
        [0.0, 0.0, 612.0, 792.0]
    );
}

#[test]
fn test_media_box_error_on_zero_dimensions() {
    let media_box = vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(0), // width = 0
        Object::Integer(792),
    ];
    let mut doc = create_test_pdf_with_media_box(media_box);
    let (_file, reader) = open_saved(&mut doc);

    let err = reader.media_box(1).expect_err("zero width");
    assert!(
        err.to_string().contains("non-positive"),
        "error should mention non-positive dimensions"
    );
}

#[test]
fn test_media_box_reversed_corners_are_normalized() {
    let media_box = vec![
        Object::Integer(612),
        Object::Integer(792),
        Object::Integer(0),
        Object::Integer(0),
    ];
    let mut doc = create_test_pdf_with_media_box(media_box);
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.media_box(1).expect("media box"),
        [0.0, 0.0, 612.0, 792.0]
    );
}

#[test]
fn test_media_box_error_on_short_array() {
    let media_box = vec![Object::Integer(0), Object::Integer(0), Object::Integer(612)];
    let mut doc = create_test_pdf_with_media_box(media_box);
    let (_file, reader) = open_saved(&mut doc);
    assert!(reader.media_box(1).is_err());
}

// ============================================================
// 2b. CropBox（表示領域）
// ============================================================

#[test]
fn test_page_box_defaults_to_media_box() {
    let mut doc = create_test_pdf_with_media_box(letter());
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [0.0, 0.0, 612.0, 792.0]
    );
}

#[test]
fn test_page_box_uses_crop_box() {
    let mut doc = create_test_pdf_with_media_box(letter());
    set_page_entry(&mut doc, "CropBox", crop_36());
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [36.0, 36.0, 576.0, 756.0]
    );
}

#[test]
fn test_page_box_clips_crop_box_to_media_box() {
    let mut doc = create_test_pdf_with_media_box(letter());
    set_page_entry(
        &mut doc,
        "CropBox",
        vec![(-50).into(), 100.into(), 400.into(), 900.into()],
    );
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [0.0, 100.0, 400.0, 792.0]
    );
}

#[test]
fn test_page_box_ignores_disjoint_or_broken_crop_box() {
    let mut doc = create_test_pdf_with_media_box(letter());
    set_page_entry(
        &mut doc,
        "CropBox",
        vec![700.into(), 800.into(), 900.into(), 1000.into()],
    );
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [0.0, 0.0, 612.0, 792.0]
    );

    let mut doc = create_test_pdf_with_media_box(letter());
    set_page_entry(&mut doc, "CropBox", vec![0.into(), 0.into()]);
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [0.0, 0.0, 612.0, 792.0]
    );
}

#[test]
fn test_page_box_inherits_crop_box_from_parent() {
    let mut doc = create_test_pdf_with_inherited_media_box(letter());
    let pages_id = doc
        .catalog()
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .expect("pages reference");
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(pages_id) {
        dict.set("CropBox", crop_36());
    }
    let (_file, reader) = open_saved(&mut doc);
    assert_eq!(
        reader.page_box(1).expect("page box"),
        [36.0, 36.0, 576.0, 756.0]
    );
}

// ============================================================
// 3. ページ走査
// ============================================================

#[test]
fn test_page_layout_with_font_resource() {
    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
            },
        },
    };
    let content = b"1 0 0 RG 100 700 m 200 700 l S BT /F1 10 Tf 140 690 Td (200mm) Tj ET".to_vec();
    let mut doc = create_test_pdf(letter(), vec![content], resources);
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    assert_eq!(layout.drawings.len(), 1);
    assert_eq!(layout.drawings[0].stroke_color, Some([1.0, 0.0, 0.0]));

    let spans: Vec<_> = layout.text.spans().collect();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "200mm");
    assert_eq!(spans[0].font_name, "F1");
}

#[test]
fn test_page_layout_decodes_differences() {
    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => dictionary! {
                    "Differences" => vec![Object::Integer(65), Object::Name(b"Oslash".to_vec())],
                },
            },
        },
    };
    let content = b"BT /F1 10 Tf 100 100 Td (A250) Tj ET".to_vec();
    let mut doc = create_test_pdf(letter(), vec![content], resources);
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    assert_eq!(layout.text.full_text(), "Ø250");
}

#[test]
fn test_page_layout_concatenates_content_streams() {
    let contents = vec![
        b"0 0 1 RG 10 10 m 20 10 l S".to_vec(),
        b"BT /F1 10 Tf 10 20 Td (1:50) Tj ET".to_vec(),
    ];
    let mut doc = create_test_pdf(letter(), contents, dictionary! {});
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    assert_eq!(layout.drawings.len(), 1);
    assert_eq!(layout.text.full_text(), "1:50");
}

#[test]
fn test_page_layout_uses_media_box_origin() {
    let media_box = vec![100.into(), 100.into(), 712.into(), 892.into()];
    let content = b"1 0 0 RG 200 800 m 300 800 l S".to_vec();
    let mut doc = create_test_pdf(media_box, vec![content], dictionary! {});
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    let PathItem::Line(p0, p1) = layout.drawings[0].items[0] else {
        panic!("expected a line");
    };
    assert_eq!((p0.x, p0.y), (100.0, 92.0));
    assert_eq!((p1.x, p1.y), (200.0, 92.0));
}

#[test]
fn test_page_layout_uses_crop_box_origin() {
    // 描画される範囲(CropBox)の左上が原点になる
    let content = b"1 0 0 RG 100 700 m 200 700 l S".to_vec();
    let mut doc = create_test_pdf(letter(), vec![content], dictionary! {});
    set_page_entry(&mut doc, "CropBox", crop_36());
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    let PathItem::Line(p0, p1) = layout.drawings[0].items[0] else {
        panic!("expected a line");
    };
    assert_eq!((p0.x, p0.y), (64.0, 56.0));
    assert_eq!((p1.x, p1.y), (164.0, 56.0));
}

#[test]
fn test_page_layout_text_under_crop_box() {
    let content = b"BT /F1 10 Tf 100 700 Td (200mm) Tj ET".to_vec();
    let mut doc = create_test_pdf(letter(), vec![content], dictionary! {});
    set_page_entry(&mut doc, "CropBox", crop_36());
    let (_file, reader) = open_saved(&mut doc);

    let layout = reader.page_layout(1).expect("page layout");
    let span = layout.text.spans().next().expect("one span");
    // フォールバック幅 500/1000 em × 5文字 × 10pt = 25pt
    assert_eq!(
        [span.bbox.x_min, span.bbox.y_min, span.bbox.x_max, span.bbox.y_max],
        [64.0, 48.0, 89.0, 58.0]
    );
}

#[test]
fn test_page_layout_enters_form_xobject() {
    let mut doc = Document::with_version("1.7");
    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
            "Matrix" => vec![1.into(), 0.into(), 0.into(), 1.into(), 100.into(), 100.into()],
        },
        b"1 0 0 RG 0 0 m 10 0 l S".to_vec(),
    );
    let form_id = doc.add_object(form);
    let resources = dictionary! {
        "XObject" => dictionary! { "Fm1" => form_id },
    };
    add_single_page(&mut doc, letter(), vec![b"q /Fm1 Do Q".to_vec()], resources);

    let (_file, reader) = open_saved(&mut doc);
    let layout = reader.page_layout(1).expect("page layout");

    assert_eq!(layout.drawings.len(), 1);
    let PathItem::Line(p0, p1) = layout.drawings[0].items[0] else {
        panic!("expected a line");
    };
    assert_eq!((p0.x, p0.y), (100.0, 692.0));
    assert_eq!((p1.x, p1.y), (110.0, 692.0));
}

#[test]
fn test_page_layout_ignores_image_xobject() {
    let mut doc = Document::with_version("1.7");
    let image = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 1,
            "Height" => 1,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0],
    );
    let image_id = doc.add_object(image);
    let resources = dictionary! {
        "XObject" => dictionary! { "Im1" => image_id },
    };
    add_single_page(
        &mut doc,
        letter(),
        vec![b"q 10 0 0 10 0 0 cm /Im1 Do Q".to_vec()],
        resources,
    );

    let (_file, reader) = open_saved(&mut doc);
    let layout = reader.page_layout(1).expect("page layout");
    assert!(layout.drawings.is_empty());
    assert!(layout.text.blocks.is_empty());
}

/// 自分自身を /Resources に持つフォーム（Fm1 → Fm1 → ...）
fn self_referencing_form_pdf() -> Document {
    let mut doc = Document::with_version("1.7");
    let form_id = doc.new_object_id();
    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Fm1" => form_id },
            },
        },
        b"1 0 0 RG 0 0 m 10 0 l S /Fm1 Do /Fm1 Do".to_vec(),
    );
    doc.objects.insert(form_id, Object::Stream(form));
    let resources = dictionary! {
        "XObject" => dictionary! { "Fm1" => form_id },
    };
    add_single_page(&mut doc, letter(), vec![b"/Fm1 Do".to_vec()], resources);
    doc
}

#[test]
fn test_page_layout_skips_recursive_form_xobject() {
    let mut doc = self_referencing_form_pdf();
    let (_file, reader) = open_saved(&mut doc);

    // 1回だけ展開され、自己呼び出しは読み飛ばされる
    let layout = reader.page_layout(1).expect("page layout");
    assert_eq!(layout.drawings.len(), 1);
}

#[test]
fn test_page_layout_skips_undecodable_form_xobject() {
    let mut doc = Document::with_version("1.7");
    let broken = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        },
        // 必須キーの無いインライン画像はデコードできない
        b"BI /W 1 ID x EI".to_vec(),
    );
    let broken_id = doc.add_object(broken);
    let resources = dictionary! {
        "XObject" => dictionary! { "Fm1" => broken_id },
    };
    add_single_page(
        &mut doc,
        letter(),
        vec![b"/Fm1 Do 1 0 0 RG 100 700 m 200 700 l S".to_vec()],
        resources,
    );

    let (_file, reader) = open_saved(&mut doc);
    let layout = reader.page_layout(1).expect("a broken form does not fail the page");
    assert_eq!(layout.drawings.len(), 1);
    assert_eq!(layout.drawings[0].stroke_color, Some([1.0, 0.0, 0.0]));
}

#[test]
fn test_page_layout_undecodable_page_content_is_error() {
    let mut doc = create_test_pdf(letter(), vec![b"BI /W 1 ID x EI".to_vec()], dictionary! {});
    let (_file, reader) = open_saved(&mut doc);
    assert!(matches!(
        reader.page_layout(1),
        Err(DuctError::ContentStreamError(_))
    ));
}
