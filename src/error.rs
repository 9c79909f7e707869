use thiserror::Error;

#[derive(Debug, Error)]
pub enum DuctError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Document open error: {0}")]
    DocumentOpenError(String),

    #[error("PDF read error: {0}")]
    PdfReadError(String),

    #[error("Content stream error: {0}")]
    ContentStreamError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Generates factory methods for [`DuctError`] variants that wrap a `String`.
macro_rules! error_constructors {
    ($(
        $(#[doc = $doc:expr])*
        $method:ident => $variant:ident
    ),* $(,)?) => {
        impl DuctError {
            $(
                $(#[doc = $doc])*
                pub fn $method(msg: impl Into<String>) -> Self {
                    Self::$variant(msg.into())
                }
            )*
        }
    };
}

error_constructors! {
    /// Create a configuration error.
    config => ConfigError,
    /// Create a document open error.
    document_open => DocumentOpenError,
    /// Create a PDF read error.
    pdf_read => PdfReadError,
    /// Create a content stream error.
    content_stream => ContentStreamError,
    /// Create a render error.
    render => RenderError,
    /// Create an output error.
    output => OutputError,
}

impl From<lopdf::Error> for DuctError {
    fn from(e: lopdf::Error) -> Self {
        Self::PdfReadError(e.to_string())
    }
}

impl From<serde_json::Error> for DuctError {
    fn from(e: serde_json::Error) -> Self {
        Self::OutputError(e.to_string())
    }
}

impl From<serde_yml::Error> for DuctError {
    fn from(e: serde_yml::Error) -> Self {
        Self::ConfigError(e.to_string())
    }
}

#[cfg(feature = "render")]
impl From<pdfium_render::prelude::PdfiumError> for DuctError {
    fn from(e: pdfium_render::prelude::PdfiumError) -> Self {
        Self::RenderError(e.to_string())
    }
}

impl From<image::ImageError> for DuctError {
    fn from(e: image::ImageError) -> Self {
        Self::OutputError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DuctError>;
