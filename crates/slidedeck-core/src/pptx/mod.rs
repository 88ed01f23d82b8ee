//! Reading templates and writing `.pptx` decks.
//!
//! A deck is an OPC package: a ZIP of XML parts tied together by
//! relationship parts. [`Template`] parses the slide master, its layouts and
//! theme; [`DeckWriter`] starts from a template, drops its slides, and writes
//! new slides that reference the template layouts.

pub mod builtin;
mod chart;
mod error;
pub mod package;
mod properties;
mod reader;
mod template;
mod writer;
pub mod xml;

pub use builtin::{blank_package, blank_template, BUILTIN_TEMPLATE_NAME};
pub use error::PptxError;
pub use package::{Package, Relationship};
pub use properties::{FontDefaults, Spacing, TemplateProperties, ThemeColors};
pub use reader::{read_slide_texts, SlideText};
pub use template::{
    Bounds, LayoutPlaceholder, PlaceholderKind, SlideLayout, Template, DEFAULT_SLIDE_HEIGHT,
    DEFAULT_SLIDE_WIDTH,
};
pub use writer::{column_widths, inline_spans, DeckWriter, InlineSpan, SlideBuilder, TextStyle, FIRST_SLIDE_ID};

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Converts EMU to inches.
pub fn emu_to_inches(emu: i64) -> f64 {
    emu as f64 / EMU_PER_INCH as f64
}
