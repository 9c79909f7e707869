pub mod content_stream;
pub mod drawing;
pub mod font;
pub mod page_scan;
pub mod reader;
pub mod text_layout;
