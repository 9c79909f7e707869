pub mod classify;
pub mod engine;
pub mod label;
pub mod result;
pub mod scale;

pub use classify::{ColorRule, Role, classify};
pub use engine::{MeasureOptions, measure, measure_bytes, measure_layout};
pub use label::{SizeLabel, find_label, parse_size};
pub use result::{MeasurementResult, RoleMeasurements};
pub use scale::resolve_scale;
