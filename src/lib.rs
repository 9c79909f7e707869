//! Duct take-off from colour-coded vector drawings.
//!
//! Page 1 of a PDF is scanned for stroked paths and text. Red paths are supply
//! ducts, blue paths extract ducts. Each primitive is measured under the
//! drawing scale found in the page text ("1:50") and labelled with the
//! nearest size annotation ("200mm", "Ø250", "300x150").

pub mod config;
pub mod error;
pub mod geometry;
pub mod measure;
pub mod pdf;
pub mod pipeline;
pub mod render;
