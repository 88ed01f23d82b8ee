//! Per-placeholder slide content: data types, sizing and generation.

mod generator;
pub mod prompts;
mod sizing;
mod types;

pub use generator::{parse_bullets, strip_bullet_marker, ContentGenerator};
pub use sizing::{font_size_for_area, max_bullets_for_area, word_limit, FontScale};
pub use types::{parse_number, ChartData, ChartSeries, ChartType, KpiData, TableData};
