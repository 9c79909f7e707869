use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JobFile {
    pub jobs: Vec<Job>,
}

/// 1図面分の計測ジョブ。省略した項目はsettings.yamlの値を使う。
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    /// 入力PDF
    pub input: String,
    /// 計測結果JSONの出力先
    pub output: String,
    /// 切り出し画像の出力ディレクトリ（省略時は出力しない）
    pub crops_dir: Option<String>,
    /// 縮尺分母の明示指定（省略時は図面の "1:S" 表記から検出）
    pub scale: Option<f64>,
    pub color_tolerance: Option<u8>,
    pub max_label_distance: Option<f64>,
    pub crop_zoom: Option<f64>,
    pub crop_limit: Option<usize>,
}

impl JobFile {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        serde_yml::from_str(yaml).map_err(|e| {
            crate::error::DuctError::config(format!("Failed to parse job YAML: {e}"))
        })
    }
}
