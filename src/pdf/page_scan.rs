use std::collections::HashMap;

use lopdf::content::Operation;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::geometry::{BBox, Point};
use crate::pdf::content_stream::{Matrix, decode_operations, numeric_operands};
use crate::pdf::drawing::{DeviceColor, Drawing, PathItem};
use crate::pdf::font::{FontEncoding, TextFont, parse_resource_fonts};
use crate::pdf::text_layout::{TextBlock, TextLine, TextPage, TextSpan};

/// Form XObjectの入れ子の上限
const MAX_FORM_DEPTH: usize = 8;

/// 1ページの走査で展開するForm XObjectの総数の上限
const MAX_FORM_RUNS: usize = 4096;

/// グリフのアセント・ディセント（em単位の近似値）
const GLYPH_ASCENT: f64 = 0.8;
const GLYPH_DESCENT: f64 = -0.2;

/// 1ページ分の走査結果: ベクタ描画とテキストレイアウト
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    /// 描画オペレータの出現順
    pub drawings: Vec<Drawing>,
    pub text: TextPage,
}

/// フォントとForm XObjectを名前で引くためのリソーススコープ
pub struct ResourceScope<'a> {
    doc: Option<&'a Document>,
    fonts: HashMap<String, TextFont>,
    forms: HashMap<Vec<u8>, (Option<ObjectId>, &'a Stream)>,
}

impl<'a> ResourceScope<'a> {
    /// リソース無し（フォールバックフォントのみ）
    pub fn empty() -> Self {
        ResourceScope {
            doc: None,
            fonts: HashMap::new(),
            forms: HashMap::new(),
        }
    }

    /// リソース辞書の列から構築する。先に現れた辞書のエントリを優先する。
    pub fn from_dicts(doc: &'a Document, dicts: &[&'a Dictionary]) -> Self {
        let mut fonts = HashMap::new();
        let mut forms = HashMap::new();

        for dict in dicts {
            for (name, font) in parse_resource_fonts(doc, dict) {
                fonts.entry(name).or_insert(font);
            }
            for (name, id, stream) in collect_form_xobjects(doc, dict) {
                forms.entry(name).or_insert((id, stream));
            }
        }

        ResourceScope {
            doc: Some(doc),
            fonts,
            forms,
        }
    }

    fn font(&self, name: &str) -> Option<&TextFont> {
        self.fonts.get(name)
    }
}

/// リソース辞書のXObjectエントリからSubtype=Formのストリームを列挙する。
///
/// 間接参照のフォームはObjectIdも返す（再帰呼び出しの検出用）。
fn collect_form_xobjects<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
) -> Vec<(Vec<u8>, Option<ObjectId>, &'a Stream)> {
    let xobject_dict = match dict
        .get(b"XObject")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_dict())
    {
        Ok(d) => d,
        Err(_) => return Vec::new(),
    };

    let mut forms = Vec::new();
    for (name, value) in xobject_dict.iter() {
        let (id, stream) = match doc
            .dereference(value)
            .and_then(|(id, obj)| obj.as_stream().map(|s| (id, s)))
        {
            Ok(found) => found,
            Err(_) => continue,
        };
        if let Ok(subtype) = stream.dict.get(b"Subtype").and_then(Object::as_name)
            && subtype == b"Form"
        {
            forms.push((name.clone(), id, stream));
        }
    }
    forms
}

/// コンテンツストリームを1回走査し、描画とテキストを同時に抽出する。
///
/// `page_box` は表示領域（通常はCropBox）で、ページ座標系（左上原点）への変換に使う。
/// ページ本体のコンテンツがデコードできなければ `ContentStreamError`。
pub fn scan_page(
    content_bytes: &[u8],
    page_box: [f64; 4],
    resources: &ResourceScope<'_>,
) -> crate::error::Result<PageLayout> {
    let operations = decode_operations(content_bytes)?;

    let mut scanner = Scanner::new(page_box);
    let initial = GraphicsState {
        ctm: Matrix::identity(),
        stroke: DeviceColor::default_black(),
        fill: DeviceColor::default_black(),
        text: TextParams::default(),
    };
    scanner.run(&operations, initial, resources, 0)?;
    scanner.flush_block();

    tracing::debug!(
        drawings = scanner.drawings.len(),
        text_blocks = scanner.blocks.len(),
        "page content scanned"
    );

    Ok(PageLayout {
        drawings: scanner.drawings,
        text: TextPage {
            blocks: scanner.blocks,
        },
    })
}

/// リソース無しでコンテンツストリームを走査する（全フォントはフォールバック扱い）。
pub fn scan_content_stream(
    content_bytes: &[u8],
    page_box: [f64; 4],
) -> crate::error::Result<PageLayout> {
    scan_page(content_bytes, page_box, &ResourceScope::empty())
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    stroke: DeviceColor,
    fill: DeviceColor,
    text: TextParams,
}

/// テキスト状態パラメータ（Tf, Tc, Tw, Tz, TL, Ts）。
///
/// グラフィックス状態の一部なので q/Q で保存・復元され、BT/ETをまたいで残る。
#[derive(Debug, Clone)]
struct TextParams {
    font_name: String,
    font_size: f64,
    char_spacing: f64,
    word_spacing: f64,
    horizontal_scaling: f64,
    text_rise: f64,
    text_leading: f64,
}

impl Default for TextParams {
    fn default() -> Self {
        TextParams {
            font_name: String::new(),
            font_size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 100.0,
            text_rise: 0.0,
            text_leading: 0.0,
        }
    }
}

/// テキスト行列とテキスト行列の行頭。BTのたびに単位行列へ戻る。
struct TextMatrices {
    text_matrix: Matrix,
    text_line_matrix: Matrix,
}

impl TextMatrices {
    fn new() -> Self {
        TextMatrices {
            text_matrix: Matrix::identity(),
            text_line_matrix: Matrix::identity(),
        }
    }

    /// tx ty Td: 行列を平行移動して新しい行を開始する
    fn move_line(&mut self, tx: f64, ty: f64) {
        self.text_line_matrix = Matrix::translate(tx, ty).multiply(&self.text_line_matrix);
        self.text_matrix = self.text_line_matrix.clone();
    }
}

/// TJ配列の要素（文字列または位置調整値）
enum ShowEntry<'o> {
    Text(&'o [u8]),
    Adjustment(f64),
}

/// 構築中のパス。座標はページ座標系に変換済み。
#[derive(Default)]
struct PathBuilder {
    items: Vec<PathItem>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: Point) {
        if let Some(from) = self.current {
            self.items.push(PathItem::Line(from, p));
        }
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Option<Point>, c2: Option<Point>, end: Point) {
        if let Some(from) = self.current {
            let c1 = c1.unwrap_or(from);
            let c2 = c2.unwrap_or(end);
            self.items.push(PathItem::Curve([from, c1, c2, end]));
        }
        self.current = Some(end);
    }

    fn close(&mut self) {
        self.current = self.subpath_start;
    }

    fn take(&mut self) -> Vec<PathItem> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.items)
    }
}

struct Scanner {
    page_matrix: Matrix,
    drawings: Vec<Drawing>,
    blocks: Vec<TextBlock>,
    current_block: TextBlock,
    current_line: TextLine,
    /// 現在展開中のForm XObject（呼び出し経路）
    form_path: Vec<ObjectId>,
    form_runs: usize,
}

impl Scanner {
    fn new(page_box: [f64; 4]) -> Self {
        Scanner {
            page_matrix: crate::pdf::content_stream::page_space_matrix(page_box),
            drawings: Vec::new(),
            blocks: Vec::new(),
            current_block: TextBlock::default(),
            current_line: TextLine::default(),
            form_path: Vec::new(),
            form_runs: 0,
        }
    }

    fn flush_line(&mut self) {
        if !self.current_line.spans.is_empty() {
            let line = std::mem::take(&mut self.current_line);
            self.current_block.lines.push(line);
        }
    }

    fn flush_block(&mut self) {
        self.flush_line();
        if !self.current_block.lines.is_empty() {
            let block = std::mem::take(&mut self.current_block);
            self.blocks.push(block);
        }
    }

    fn run(
        &mut self,
        operations: &[Operation],
        initial: GraphicsState,
        scope: &ResourceScope<'_>,
        depth: usize,
    ) -> crate::error::Result<()> {
        let mut gs_stack: Vec<GraphicsState> = vec![initial];
        let mut path = PathBuilder::default();
        let mut tm = TextMatrices::new();

        for op in operations {
            // 変換は常にスタック先頭のCTMを使う
            let gs = gs_stack
                .last()
                .cloned()
                .ok_or_else(|| crate::error::DuctError::content_stream("empty state stack"))?;
            let to_page = gs.ctm.multiply(&self.page_matrix);
            let ops = &op.operands;

            match op.operator.as_str() {
                // --- グラフィックス状態 ---
                "q" => gs_stack.push(gs),
                "Q" => {
                    if gs_stack.len() > 1 {
                        gs_stack.pop();
                    }
                }
                "cm" => match Matrix::from_operands(ops) {
                    Ok(cm) => {
                        if let Some(current) = gs_stack.last_mut() {
                            current.ctm = cm.multiply(&current.ctm);
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "malformed cm skipped"),
                },

                // --- 色 ---
                "RG" | "G" | "K" | "SC" | "SCN" => {
                    if let Some(color) = color_from_operands(ops)
                        && let Some(current) = gs_stack.last_mut()
                    {
                        current.stroke = color;
                    }
                }
                "rg" | "g" | "k" | "sc" | "scn" => {
                    if let Some(color) = color_from_operands(ops)
                        && let Some(current) = gs_stack.last_mut()
                    {
                        current.fill = color;
                    }
                }
                "CS" => {
                    if let Some(current) = gs_stack.last_mut() {
                        current.stroke = DeviceColor::default_black();
                    }
                }
                "cs" => {
                    if let Some(current) = gs_stack.last_mut() {
                        current.fill = DeviceColor::default_black();
                    }
                }

                // --- パス構築 ---
                "m" => {
                    if let Some([x, y]) = numeric_operands::<2>(ops) {
                        path.move_to(to_page.apply(x, y));
                    }
                }
                "l" => {
                    if let Some([x, y]) = numeric_operands::<2>(ops) {
                        path.line_to(to_page.apply(x, y));
                    }
                }
                "c" => {
                    if let Some([x1, y1, x2, y2, x3, y3]) = numeric_operands::<6>(ops) {
                        path.curve_to(
                            Some(to_page.apply(x1, y1)),
                            Some(to_page.apply(x2, y2)),
                            to_page.apply(x3, y3),
                        );
                    }
                }
                "v" => {
                    // 第1制御点 = 現在点
                    if let Some([x2, y2, x3, y3]) = numeric_operands::<4>(ops) {
                        path.curve_to(None, Some(to_page.apply(x2, y2)), to_page.apply(x3, y3));
                    }
                }
                "y" => {
                    // 第2制御点 = 終点
                    if let Some([x1, y1, x3, y3]) = numeric_operands::<4>(ops) {
                        path.curve_to(Some(to_page.apply(x1, y1)), None, to_page.apply(x3, y3));
                    }
                }
                "h" => path.close(),
                "re" => {
                    if let Some([x, y, w, h]) = numeric_operands::<4>(ops) {
                        let corners = [
                            to_page.apply(x, y),
                            to_page.apply(x + w, y),
                            to_page.apply(x + w, y + h),
                            to_page.apply(x, y + h),
                        ];
                        path.items.push(PathItem::Rect(corners));
                        path.move_to(corners[0]);
                    }
                }

                // --- パス描画 ---
                "S" | "s" => self.paint(&mut path, &gs, true, false),
                "f" | "F" | "f*" => self.paint(&mut path, &gs, false, true),
                "B" | "B*" | "b" | "b*" => self.paint(&mut path, &gs, true, true),
                "n" => {
                    path.take();
                }

                // --- テキストブロック ---
                "BT" => {
                    self.flush_block();
                    tm = TextMatrices::new();
                }
                "ET" => self.flush_block(),

                // --- テキスト状態 ---
                "Tf" => {
                    if ops.len() == 2
                        && let Some(current) = gs_stack.last_mut()
                    {
                        if let Ok(name_bytes) = ops[0].as_name() {
                            current.text.font_name = String::from_utf8_lossy(name_bytes).into_owned();
                        }
                        if let Some([size]) = numeric_operands::<1>(&ops[1..]) {
                            current.text.font_size = size;
                        }
                    }
                }
                "Tm" => {
                    if let Ok(m) = Matrix::from_operands(ops) {
                        self.flush_line();
                        tm.text_matrix = m.clone();
                        tm.text_line_matrix = m;
                    }
                }
                "Td" => {
                    if let Some([tx, ty]) = numeric_operands::<2>(ops) {
                        self.flush_line();
                        tm.move_line(tx, ty);
                    }
                }
                "TD" => {
                    // tx ty TD = -ty TL tx ty Td
                    if let Some([tx, ty]) = numeric_operands::<2>(ops) {
                        self.flush_line();
                        if let Some(current) = gs_stack.last_mut() {
                            current.text.text_leading = -ty;
                        }
                        tm.move_line(tx, ty);
                    }
                }
                "T*" => {
                    // 0 -TL Td と等価
                    self.flush_line();
                    tm.move_line(0.0, -gs.text.text_leading);
                }
                "TL" | "Tc" | "Tw" | "Tz" | "Ts" => {
                    if let Some([v]) = numeric_operands::<1>(ops)
                        && let Some(current) = gs_stack.last_mut()
                    {
                        let params = &mut current.text;
                        match op.operator.as_str() {
                            "TL" => params.text_leading = v,
                            "Tc" => params.char_spacing = v,
                            "Tw" => params.word_spacing = v,
                            "Tz" => params.horizontal_scaling = v,
                            _ => params.text_rise = v,
                        }
                    }
                }

                // --- テキスト描画 ---
                "Tj" | "TJ" => {
                    if let Some(operand) = ops.first() {
                        self.show_text(&mut tm, &gs, scope, &show_entries(operand));
                    }
                }
                "'" => {
                    // ' = T* string Tj
                    self.flush_line();
                    tm.move_line(0.0, -gs.text.text_leading);
                    if let Some(operand) = ops.first() {
                        self.show_text(&mut tm, &gs, scope, &show_entries(operand));
                    }
                }
                "\"" => {
                    // aw ac string " = aw Tw ac Tc T* string Tj
                    if ops.len() == 3 {
                        let mut shown = gs.clone();
                        if let Some([aw, ac]) = numeric_operands::<2>(&ops[..2]) {
                            shown.text.word_spacing = aw;
                            shown.text.char_spacing = ac;
                            if let Some(current) = gs_stack.last_mut() {
                                current.text.word_spacing = aw;
                                current.text.char_spacing = ac;
                            }
                        }
                        self.flush_line();
                        tm.move_line(0.0, -shown.text.text_leading);
                        self.show_text(&mut tm, &shown, scope, &show_entries(&ops[2]));
                    }
                }

                // --- XObject ---
                "Do" => {
                    if let Some(name) = ops.first().and_then(|o| o.as_name().ok())
                        && let Some(&(form_id, stream)) = scope.forms.get(name)
                    {
                        if depth >= MAX_FORM_DEPTH {
                            tracing::warn!(depth, "form XObject nesting too deep, skipped");
                        } else if form_id.is_some_and(|id| self.form_path.contains(&id)) {
                            tracing::warn!(?form_id, "recursive form XObject skipped");
                        } else if self.form_runs >= MAX_FORM_RUNS {
                            tracing::warn!(runs = self.form_runs, "form XObject limit reached, skipped");
                        } else {
                            self.form_runs += 1;
                            self.form_path.extend(form_id);
                            let result = self.run_form(stream, &gs, scope, depth);
                            if form_id.is_some() {
                                self.form_path.pop();
                            }
                            result?;
                        }
                    }
                }

                _ => {}
            }
        }

        Ok(())
    }

    /// Form XObjectの中身を /Matrix と /Resources を適用して走査する。
    fn run_form(
        &mut self,
        stream: &Stream,
        gs: &GraphicsState,
        scope: &ResourceScope<'_>,
        depth: usize,
    ) -> crate::error::Result<()> {
        let form_matrix = stream
            .dict
            .get(b"Matrix")
            .and_then(Object::as_array)
            .ok()
            .and_then(|arr| Matrix::from_operands(arr).ok())
            .unwrap_or_else(Matrix::identity);

        let content = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());
        // 壊れたフォームはそのフォームだけ読み飛ばす
        let operations = match decode_operations(&content) {
            Ok(ops) => ops,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable form XObject skipped");
                return Ok(());
            }
        };

        let own_scope;
        let form_scope = match (scope.doc, stream.dict.get(b"Resources")) {
            (Some(doc), Ok(res)) => match doc.dereference(res).and_then(|(_, o)| o.as_dict()) {
                Ok(dict) => {
                    own_scope = ResourceScope::from_dicts(doc, &[dict]);
                    &own_scope
                }
                Err(_) => scope,
            },
            _ => scope,
        };

        let initial = GraphicsState {
            ctm: form_matrix.multiply(&gs.ctm),
            ..gs.clone()
        };
        self.run(&operations, initial, form_scope, depth + 1)
    }

    fn paint(&mut self, path: &mut PathBuilder, gs: &GraphicsState, stroke: bool, fill: bool) {
        let items = path.take();
        if items.is_empty() {
            return;
        }
        self.drawings.push(Drawing {
            items,
            stroke_color: stroke.then(|| gs.stroke.to_rgb()),
            fill_color: fill.then(|| gs.fill.to_rgb()),
        });
    }

    /// 文字列を表示し、テキスト行列を送る。空でなければスパンを記録する。
    fn show_text(
        &mut self,
        tm: &mut TextMatrices,
        gs: &GraphicsState,
        scope: &ResourceScope<'_>,
        entries: &[ShowEntry<'_>],
    ) {
        let ts = &gs.text;
        let fallback;
        let font = match scope.font(&ts.font_name) {
            Some(f) => f,
            None => {
                fallback = TextFont::fallback();
                &fallback
            }
        };
        let single_byte = matches!(font.encoding(), FontEncoding::WinAnsi { .. });

        let fs = ts.font_size;
        let th = ts.horizontal_scaling / 100.0;
        let mut advance = 0.0;
        let mut codes_all: Vec<u16> = Vec::new();

        for entry in entries {
            match entry {
                ShowEntry::Text(bytes) => {
                    let codes = font.char_codes(bytes);
                    for &code in &codes {
                        let w0 = font.glyph_width(code) / 1000.0;
                        let word = if single_byte && code == 32 {
                            ts.word_spacing
                        } else {
                            0.0
                        };
                        advance += (w0 * fs + ts.char_spacing + word) * th;
                    }
                    codes_all.extend_from_slice(&codes);
                }
                ShowEntry::Adjustment(adj) => {
                    advance -= adj / 1000.0 * fs * th;
                }
            }
        }

        let text = font.decode_all(&codes_all);
        if !text.is_empty() {
            let to_page = tm.text_matrix.multiply(&gs.ctm).multiply(&self.page_matrix);
            let y_low = GLYPH_DESCENT * fs + ts.text_rise;
            let y_high = GLYPH_ASCENT * fs + ts.text_rise;
            let corners = [
                to_page.apply(0.0, y_low),
                to_page.apply(advance, y_low),
                to_page.apply(advance, y_high),
                to_page.apply(0.0, y_high),
            ];
            if let Some(bbox) = BBox::from_points(&corners) {
                self.current_line.spans.push(TextSpan {
                    text,
                    bbox,
                    font_name: ts.font_name.clone(),
                    font_size: fs,
                });
            }
        }

        tm.text_matrix = Matrix::translate(advance, 0.0).multiply(&tm.text_matrix);
    }
}

/// 描画色オペレータのオペランドから色を作る（パターン名等の非数値は無視）。
fn color_from_operands(operands: &[Object]) -> Option<DeviceColor> {
    let vals: Vec<f64> = match operands.len() {
        1 => numeric_operands::<1>(operands)?.to_vec(),
        3 => numeric_operands::<3>(operands)?.to_vec(),
        4 => numeric_operands::<4>(operands)?.to_vec(),
        _ => return None,
    };
    DeviceColor::from_components(&vals)
}

/// Tj の文字列または TJ の配列を表示要素の列に変換する。
fn show_entries(obj: &Object) -> Vec<ShowEntry<'_>> {
    match obj {
        Object::String(bytes, _) => vec![ShowEntry::Text(bytes)],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Object::String(bytes, _) => Some(ShowEntry::Text(bytes)),
                Object::Integer(n) => Some(ShowEntry::Adjustment(*n as f64)),
                Object::Real(r) => Some(ShowEntry::Adjustment(*r as f64)),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}
