use crate::geometry::BBox;

/// テキスト断片（1回のTj/TJ/'/"呼び出しに対応）
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub bbox: BBox,
    pub font_name: String,
    pub font_size: f64,
}

/// 同一行とみなすスパンの列（行送りオペレータで区切る）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

/// BT...ETブロック1つ分の行の列
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

/// ページ全体のテキストレイアウト（blocks → lines → spans）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextPage {
    pub blocks: Vec<TextBlock>,
}

impl TextPage {
    /// 全スパンを出現順（ブロック→行→スパン）に走査する。
    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .flat_map(|l| l.spans.iter())
    }

    /// 全スパンの文字列を空白1つで連結する。
    pub fn full_text(&self) -> String {
        self.spans()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// スパン列を単一ブロック・単一行に収めたページを作る。
    pub fn from_spans(spans: impl IntoIterator<Item = TextSpan>) -> Self {
        let line = TextLine {
            spans: spans.into_iter().collect(),
        };
        TextPage {
            blocks: vec![TextBlock { lines: vec![line] }],
        }
    }
}
