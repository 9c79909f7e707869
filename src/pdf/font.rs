use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object};

use crate::error::DuctError;

/// グリフ幅が得られない場合の既定値（1/1000テキスト空間単位）
const FALLBACK_GLYPH_WIDTH: f64 = 500.0;

/// フォントエンコーディング
#[derive(Debug, Clone)]
pub enum FontEncoding {
    WinAnsi { differences: HashMap<u8, String> },
    IdentityH,
}

/// テキスト抽出用に解析したフォント。
///
/// 埋込フォントデータは読まない。文字コード→Unicodeの変換と
/// スパン幅の見積もりに必要な情報だけを持つ。
#[derive(Debug, Clone)]
pub struct TextFont {
    encoding: FontEncoding,
    to_unicode: HashMap<u16, String>,
    widths: HashMap<u16, f64>,
    default_width: f64,
}

impl TextFont {
    /// リソースに見つからないフォント用（WinAnsi・固定幅）。
    pub fn fallback() -> Self {
        TextFont {
            encoding: FontEncoding::WinAnsi {
                differences: HashMap::new(),
            },
            to_unicode: HashMap::new(),
            widths: HashMap::new(),
            default_width: FALLBACK_GLYPH_WIDTH,
        }
    }

    pub fn encoding(&self) -> &FontEncoding {
        &self.encoding
    }

    /// 文字コードの幅を返す（1/1000テキスト空間単位）
    pub fn glyph_width(&self, code: u16) -> f64 {
        self.widths
            .get(&code)
            .copied()
            .unwrap_or(self.default_width)
    }

    /// 文字列オペランドのバイト列を文字コード列に変換する。
    pub fn char_codes(&self, bytes: &[u8]) -> Vec<u16> {
        match self.encoding {
            FontEncoding::IdentityH => bytes
                .chunks_exact(2)
                .map(|pair| ((pair[0] as u16) << 8) | pair[1] as u16)
                .collect(),
            FontEncoding::WinAnsi { .. } => bytes.iter().map(|&b| b as u16).collect(),
        }
    }

    /// 文字コードをUnicode文字列に変換する。ToUnicodeがあれば最優先。
    pub fn decode(&self, code: u16) -> String {
        if let Some(s) = self.to_unicode.get(&code) {
            return s.clone();
        }
        match &self.encoding {
            FontEncoding::WinAnsi { differences } => {
                if let Ok(byte) = u8::try_from(code)
                    && let Some(name) = differences.get(&byte)
                    && let Some(c) = glyph_name_to_unicode(name)
                {
                    return c.to_string();
                }
                u8::try_from(code)
                    .ok()
                    .and_then(win_ansi_to_unicode)
                    .map(String::from)
                    .unwrap_or_default()
            }
            // ToUnicodeの無いCIDフォントはCIDをそのままコードポイントとみなす
            FontEncoding::IdentityH => char::from_u32(code as u32)
                .map(String::from)
                .unwrap_or_default(),
        }
    }

    /// 文字コード列全体を文字列に変換する。
    pub fn decode_all(&self, codes: &[u16]) -> String {
        codes.iter().map(|&c| self.decode(c)).collect()
    }
}

/// リソース辞書の /Font エントリを解析し、リソース名→TextFontのマップを返す。
///
/// 個々のフォントの解析に失敗した場合はフォールバックフォントで代替する。
pub fn parse_resource_fonts(doc: &Document, resources: &Dictionary) -> HashMap<String, TextFont> {
    let mut fonts = HashMap::new();

    let font_dict = match resources
        .get(b"Font")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_dict())
    {
        Ok(d) => d,
        Err(_) => return fonts,
    };

    for (name_bytes, font_ref) in font_dict.iter() {
        let name = String::from_utf8_lossy(name_bytes).into_owned();
        let font = match parse_single_font(doc, font_ref) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(font = %name, error = %e, "font parse failed, using fallback");
                TextFont::fallback()
            }
        };
        fonts.insert(name, font);
    }

    fonts
}

/// 単一フォント辞書からTextFontを構築
fn parse_single_font(doc: &Document, font_ref: &Object) -> crate::error::Result<TextFont> {
    let font_dict = doc
        .dereference(font_ref)
        .and_then(|(_, obj)| obj.as_dict())
        .map_err(|e| DuctError::pdf_read(e.to_string()))?;

    let subtype = font_dict
        .get(b"Subtype")
        .ok()
        .and_then(|o| o.as_name().ok())
        .map(|n| String::from_utf8_lossy(n).into_owned())
        .unwrap_or_default();

    let to_unicode = parse_to_unicode(doc, font_dict);

    if subtype == "Type0" {
        let (widths, default_width) = parse_type0_widths(doc, font_dict)?;
        return Ok(TextFont {
            encoding: FontEncoding::IdentityH,
            to_unicode,
            widths,
            default_width,
        });
    }

    let widths = parse_simple_widths(doc, font_dict)?;
    Ok(TextFont {
        encoding: parse_encoding(doc, font_dict),
        to_unicode,
        widths,
        default_width: FALLBACK_GLYPH_WIDTH,
    })
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// 単純フォント(Type1/TrueType)の /FirstChar + /Widths を解析
fn parse_simple_widths(
    doc: &Document,
    font_dict: &Dictionary,
) -> crate::error::Result<HashMap<u16, f64>> {
    let mut result = HashMap::new();

    let first_char = match font_dict.get(b"FirstChar").ok() {
        None => 0u16,
        Some(Object::Integer(i)) => {
            let v = *i;
            if v < 0 || v > u16::MAX as i64 {
                return Err(DuctError::pdf_read(format!("FirstChar out of range: {}", v)));
            }
            v as u16
        }
        Some(_) => 0u16,
    };

    let widths_obj = match font_dict.get(b"Widths") {
        Ok(obj) => doc.dereference(obj)?.1,
        Err(_) => return Ok(result),
    };

    if let Ok(arr) = widths_obj.as_array() {
        for (i, obj) in arr.iter().enumerate() {
            let obj = doc.dereference(obj)?.1;
            if let Some(w) = number(obj) {
                result.insert(first_char.saturating_add(i as u16), w);
            }
        }
    }

    Ok(result)
}

/// Type0フォントの子孫CIDFontから /W と /DW を解析
fn parse_type0_widths(
    doc: &Document,
    font_dict: &Dictionary,
) -> crate::error::Result<(HashMap<u16, f64>, f64)> {
    let descendants = font_dict
        .get(b"DescendantFonts")
        .map_err(|_| DuctError::pdf_read("Type0 font missing DescendantFonts"))?;
    let desc_array = doc.dereference(descendants)?.1.as_array()?;
    let first = desc_array
        .first()
        .ok_or_else(|| DuctError::pdf_read("DescendantFonts array is empty"))?;
    let cid_font_dict = doc.dereference(first)?.1.as_dict()?;

    let default_width = cid_font_dict
        .get(b"DW")
        .ok()
        .and_then(number)
        .unwrap_or(1000.0);

    let mut result = HashMap::new();
    let w_obj = match cid_font_dict.get(b"W") {
        Ok(obj) => doc.dereference(obj)?.1,
        Err(_) => return Ok((result, default_width)),
    };
    let arr = match w_obj.as_array() {
        Ok(a) => a,
        Err(_) => return Ok((result, default_width)),
    };

    // /W 配列: [ cid [w1 w2 ...] ] or [ cid_first cid_last w ]
    let mut i = 0;
    while i + 1 < arr.len() {
        let cid_start = match &arr[i] {
            Object::Integer(n) => *n as u16,
            _ => {
                i += 1;
                continue;
            }
        };

        match &arr[i + 1] {
            Object::Array(widths) => {
                for (j, w_obj) in widths.iter().enumerate() {
                    if let Some(w) = number(w_obj) {
                        result.insert(cid_start.saturating_add(j as u16), w);
                    }
                }
                i += 2;
            }
            Object::Integer(cid_end) => {
                let cid_end = *cid_end as u16;
                if let Some(w) = arr.get(i + 2).and_then(number) {
                    for cid in cid_start..=cid_end {
                        result.insert(cid, w);
                    }
                }
                i += 3;
            }
            _ => {
                i += 1;
            }
        }
    }

    Ok((result, default_width))
}

/// 単純フォントのエンコーディングを解析（Differences配列を含む）
fn parse_encoding(doc: &Document, font_dict: &Dictionary) -> FontEncoding {
    let empty = || FontEncoding::WinAnsi {
        differences: HashMap::new(),
    };

    let enc_obj = match font_dict
        .get(b"Encoding")
        .and_then(|obj| doc.dereference(obj))
    {
        Ok((_, obj)) => obj,
        Err(_) => return empty(),
    };

    match enc_obj {
        // WinAnsi以外(MacRoman, Standard)もWinAnsiとして近似
        Object::Name(_) => empty(),
        Object::Dictionary(dict) => FontEncoding::WinAnsi {
            differences: parse_differences(doc, dict),
        },
        _ => empty(),
    }
}

/// /Differences 配列: [ code /name /name ... code /name ... ]
fn parse_differences(doc: &Document, dict: &Dictionary) -> HashMap<u8, String> {
    let mut differences = HashMap::new();

    let arr = match dict
        .get(b"Differences")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_array())
    {
        Ok(a) => a,
        Err(_) => return differences,
    };

    let mut code: Option<u32> = None;
    for item in arr {
        match item {
            Object::Integer(n) => code = u32::try_from(*n).ok(),
            Object::Name(name) => {
                if let Some(c) = code {
                    if let Ok(byte) = u8::try_from(c) {
                        differences.insert(byte, String::from_utf8_lossy(name).into_owned());
                    }
                    code = Some(c + 1);
                }
            }
            _ => {}
        }
    }

    differences
}

/// /ToUnicode CMapストリームを解析する。無い・壊れている場合は空のマップ。
fn parse_to_unicode(doc: &Document, font_dict: &Dictionary) -> HashMap<u16, String> {
    let stream = match font_dict
        .get(b"ToUnicode")
        .and_then(|obj| doc.dereference(obj))
        .and_then(|(_, obj)| obj.as_stream())
    {
        Ok(s) => s,
        Err(_) => return HashMap::new(),
    };

    let content = match stream.decompressed_content() {
        Ok(c) => c,
        Err(_) => stream.content.clone(),
    };

    parse_cmap(&String::from_utf8_lossy(&content))
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    ArrayStart,
    ArrayEnd,
    Word(String),
}

fn tokenize_cmap(src: &str) -> Vec<CMapToken> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '%' => {
                for c in chars.by_ref() {
                    if c == '\n' || c == '\r' {
                        break;
                    }
                }
            }
            '<' => {
                chars.next();
                // "<<" は辞書の開始なので単語として読み飛ばす
                if chars.peek() == Some(&'<') {
                    chars.next();
                    tokens.push(CMapToken::Word("<<".into()));
                    continue;
                }
                let mut hex = String::new();
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                    if c.is_ascii_hexdigit() {
                        hex.push(c);
                    }
                }
                if hex.len() % 2 == 1 {
                    hex.push('0');
                }
                let bytes = (0..hex.len())
                    .step_by(2)
                    .filter_map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
                    .collect();
                tokens.push(CMapToken::Hex(bytes));
            }
            '[' => {
                chars.next();
                tokens.push(CMapToken::ArrayStart);
            }
            ']' => {
                chars.next();
                tokens.push(CMapToken::ArrayEnd);
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '<' | '[' | ']' | '%') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(CMapToken::Word(word));
            }
        }
    }

    tokens
}

fn hex_to_code(bytes: &[u8]) -> u16 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32) as u16
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match *pair {
            [hi, lo] => ((hi as u16) << 8) | lo as u16,
            [lo] => lo as u16,
            _ => 0,
        })
        .collect()
}

/// ToUnicode CMapの bfchar / bfrange セクションを解析する。
pub fn parse_cmap(src: &str) -> HashMap<u16, String> {
    let tokens = tokenize_cmap(src);
    let mut map = HashMap::new();
    let mut i = 0;

    #[derive(Clone, Copy, PartialEq)]
    enum Section {
        None,
        BfChar,
        BfRange,
    }
    let mut section = Section::None;

    while i < tokens.len() {
        let token = &tokens[i];
        if let CMapToken::Word(w) = token {
            match w.as_str() {
                "beginbfchar" => section = Section::BfChar,
                "beginbfrange" => section = Section::BfRange,
                "endbfchar" | "endbfrange" => section = Section::None,
                _ => {}
            }
            i += 1;
            continue;
        }

        let CMapToken::Hex(src) = token else {
            i += 1;
            continue;
        };

        match section {
            Section::BfChar => {
                if let Some(CMapToken::Hex(dst)) = tokens.get(i + 1) {
                    map.insert(
                        hex_to_code(src),
                        String::from_utf16_lossy(&utf16_units(dst)),
                    );
                    i += 2;
                } else {
                    i += 1;
                }
            }
            Section::BfRange => {
                let (lo, hi) = match tokens.get(i + 1) {
                    Some(CMapToken::Hex(hi)) => (hex_to_code(src), hex_to_code(hi)),
                    _ => {
                        i += 1;
                        continue;
                    }
                };
                match tokens.get(i + 2) {
                    Some(CMapToken::Hex(dst)) => {
                        let base = utf16_units(dst);
                        for (offset, code) in (lo..=hi).enumerate() {
                            let mut units = base.clone();
                            if let Some(last) = units.last_mut() {
                                *last = last.wrapping_add(offset as u16);
                            }
                            map.insert(code, String::from_utf16_lossy(&units));
                        }
                        i += 3;
                    }
                    Some(CMapToken::ArrayStart) => {
                        let mut j = i + 3;
                        let mut code = lo;
                        while let Some(CMapToken::Hex(dst)) = tokens.get(j) {
                            if code <= hi {
                                map.insert(code, String::from_utf16_lossy(&utf16_units(dst)));
                            }
                            code = code.wrapping_add(1);
                            j += 1;
                        }
                        // ArrayEnd を読み飛ばす
                        i = j + 1;
                    }
                    _ => {
                        i += 2;
                    }
                }
            }
            Section::None => {
                i += 1;
            }
        }
    }

    map
}

/// グリフ名→Unicode変換（Adobe Glyph Listの主要エントリ）
fn glyph_name_to_unicode(name: &str) -> Option<char> {
    match name {
        "space" => Some(' '),
        "exclam" => Some('!'),
        "quotedbl" => Some('"'),
        "numbersign" => Some('#'),
        "dollar" => Some('$'),
        "percent" => Some('%'),
        "ampersand" => Some('&'),
        "quotesingle" => Some('\''),
        "parenleft" => Some('('),
        "parenright" => Some(')'),
        "asterisk" => Some('*'),
        "plus" => Some('+'),
        "comma" => Some(','),
        "hyphen" | "minus" => Some('-'),
        "period" => Some('.'),
        "slash" => Some('/'),
        "zero" => Some('0'),
        "one" => Some('1'),
        "two" => Some('2'),
        "three" => Some('3'),
        "four" => Some('4'),
        "five" => Some('5'),
        "six" => Some('6'),
        "seven" => Some('7'),
        "eight" => Some('8'),
        "nine" => Some('9'),
        "colon" => Some(':'),
        "semicolon" => Some(';'),
        "less" => Some('<'),
        "equal" => Some('='),
        "greater" => Some('>'),
        "question" => Some('?'),
        "at" => Some('@'),
        "multiply" => Some('\u{00D7}'),
        "oslash" => Some('\u{00F8}'),
        "Oslash" => Some('\u{00D8}'),
        "diameter" => Some('\u{2300}'),
        _ if name.len() == 1 => name.chars().next(),
        _ if name.starts_with("uni") && name.len() == 7 => u32::from_str_radix(&name[3..], 16)
            .ok()
            .and_then(char::from_u32),
        _ => None,
    }
}

/// WinAnsi文字コード→Unicode変換（基本ラテン文字のみ）
fn win_ansi_to_unicode(code: u8) -> Option<char> {
    // 0x20-0x7E: ASCII直接対応
    if (0x20..=0x7E).contains(&code) {
        return Some(code as char);
    }

    // Windows-1252 の上位バイトマッピング
    match code {
        0x80 => Some('\u{20AC}'),
        0x82 => Some('\u{201A}'),
        0x83 => Some('\u{0192}'),
        0x84 => Some('\u{201E}'),
        0x85 => Some('\u{2026}'),
        0x86 => Some('\u{2020}'),
        0x87 => Some('\u{2021}'),
        0x88 => Some('\u{02C6}'),
        0x89 => Some('\u{2030}'),
        0x8A => Some('\u{0160}'),
        0x8B => Some('\u{2039}'),
        0x8C => Some('\u{0152}'),
        0x8E => Some('\u{017D}'),
        0x91 => Some('\u{2018}'),
        0x92 => Some('\u{2019}'),
        0x93 => Some('\u{201C}'),
        0x94 => Some('\u{201D}'),
        0x95 => Some('\u{2022}'),
        0x96 => Some('\u{2013}'),
        0x97 => Some('\u{2014}'),
        0x98 => Some('\u{02DC}'),
        0x99 => Some('\u{2122}'),
        0x9A => Some('\u{0161}'),
        0x9B => Some('\u{203A}'),
        0x9C => Some('\u{0153}'),
        0x9E => Some('\u{017E}'),
        0x9F => Some('\u{0178}'),
        0xA0..=0xFF => Some(code as char), // Latin-1 Supplement直接対応
        _ => None,
    }
}
