use std::path::Path;

use lopdf::{Dictionary, Document};

use crate::pdf::page_scan::{PageLayout, ResourceScope, scan_page};

pub struct PdfReader {
    doc: Document,
}

impl PdfReader {
    /// PDFファイルを開いてPdfReaderを作成する。
    ///
    /// 読めない・PDFとして解析できない場合は `DocumentOpenError`。
    pub fn open(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|e| {
            crate::error::DuctError::document_open(format!("{}: {e}", path.display()))
        })?;
        Ok(Self { doc })
    }

    /// メモリ上のPDFバイト列からPdfReaderを作成する。
    pub fn from_bytes(bytes: &[u8]) -> crate::error::Result<Self> {
        let doc = Document::load_mem(bytes)
            .map_err(|e| crate::error::DuctError::document_open(e.to_string()))?;
        Ok(Self { doc })
    }

    /// ページ辞書から属性を取得する（Parent経由の継承も考慮）。
    fn get_inherited(&self, dict: &Dictionary, key: &[u8]) -> Option<lopdf::Object> {
        // まず現在の辞書から探す
        if let Ok(obj) = dict.get(key) {
            return self.doc.dereference(obj).ok().map(|(_, o)| o.clone());
        }

        // 見つからなければParentをたどって継承を確認する
        if let Ok(lopdf::Object::Reference(parent_id)) = dict.get(b"Parent") {
            let parent_dict = self.doc.get_dictionary(*parent_id).ok()?;
            return self.get_inherited(parent_dict, key);
        }

        None
    }

    /// 指定ページ(1-indexed)のMediaBoxを `[x0, y0, x1, y1]`（x0 < x1, y0 < y1）で返す。
    pub fn media_box(&self, page_num: u32) -> crate::error::Result<[f64; 4]> {
        let page_id = self.get_page_id(page_num)?;
        let page_dict = self.doc.get_dictionary(page_id)?;

        // MediaBoxを取得（継承も考慮）
        let media_box = self
            .get_inherited(page_dict, b"MediaBox")
            .ok_or_else(|| crate::error::DuctError::pdf_read("MediaBox not found"))?;
        parse_rect(&media_box, "MediaBox")
    }

    /// 指定ページ(1-indexed)の表示領域を返す。
    ///
    /// CropBox（継承あり）とMediaBoxの共通部分。CropBoxが無い・壊れている・
    /// MediaBoxと重ならない場合はMediaBox。ビューアやpdfiumが描画する範囲と一致する。
    pub fn page_box(&self, page_num: u32) -> crate::error::Result<[f64; 4]> {
        let media = self.media_box(page_num)?;
        let page_dict = self.doc.get_dictionary(self.get_page_id(page_num)?)?;

        let Some(crop_obj) = self.get_inherited(page_dict, b"CropBox") else {
            return Ok(media);
        };
        let crop = match parse_rect(&crop_obj, "CropBox") {
            Ok(rect) => rect,
            Err(e) => {
                tracing::debug!(error = %e, "invalid CropBox ignored");
                return Ok(media);
            }
        };

        let clipped = [
            crop[0].max(media[0]),
            crop[1].max(media[1]),
            crop[2].min(media[2]),
            crop[3].min(media[3]),
        ];
        if clipped[2] <= clipped[0] || clipped[3] <= clipped[1] {
            tracing::debug!(?crop, ?media, "CropBox outside MediaBox ignored");
            return Ok(media);
        }
        Ok(clipped)
    }

    /// 指定ページ(1-indexed)を走査し、描画とテキストレイアウトを返す。
    ///
    /// 座標は表示領域（[`PdfReader::page_box`]）の左上を原点とする。
    pub fn page_layout(&self, page_num: u32) -> crate::error::Result<PageLayout> {
        let page_id = self.get_page_id(page_num)?;
        let page_box = self.page_box(page_num)?;
        let content = self.doc.get_page_content(page_id)?;

        let (resource_dict, resource_ids) = self.doc.get_page_resources(page_id)?;
        let mut dicts: Vec<&Dictionary> = Vec::new();
        // ページ辞書に直接埋め込まれたResourcesを優先する
        if let Some(dict) = resource_dict {
            dicts.push(dict);
        }
        for res_id in resource_ids {
            dicts.push(self.doc.get_dictionary(res_id)?);
        }

        let scope = ResourceScope::from_dicts(&self.doc, &dicts);
        scan_page(&content, page_box, &scope)
    }

    /// ページ番号(1-indexed)からObjectIdを取得する。
    fn get_page_id(&self, page_num: u32) -> crate::error::Result<lopdf::ObjectId> {
        let pages = self.doc.get_pages();
        pages.get(&page_num).copied().ok_or_else(|| {
            crate::error::DuctError::pdf_read(format!("page {} not found", page_num))
        })
    }
}

/// `[x0, y0, x1, y1]` 配列を左下・右上の順に正規化して読む。
fn parse_rect(obj: &lopdf::Object, what: &str) -> crate::error::Result<[f64; 4]> {
    let array = obj.as_array()?;
    if array.len() < 4 {
        return Err(crate::error::DuctError::pdf_read(format!("Invalid {what}")));
    }

    // 値は整数または実数の可能性がある
    let to_f64 = |obj: &lopdf::Object| -> crate::error::Result<f64> {
        match obj {
            lopdf::Object::Integer(i) => Ok(*i as f64),
            lopdf::Object::Real(f) => Ok(*f as f64),
            _ => Err(crate::error::DuctError::pdf_read(format!("Invalid {what} value"))),
        }
    };

    let (ax, ay, bx, by) = (
        to_f64(&array[0])?,
        to_f64(&array[1])?,
        to_f64(&array[2])?,
        to_f64(&array[3])?,
    );

    if (bx - ax).abs() <= 0.0 || (by - ay).abs() <= 0.0 {
        return Err(crate::error::DuctError::pdf_read(format!(
            "Invalid {what}: non-positive page dimensions"
        )));
    }

    Ok([ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)])
}
