//! Fitting generated text to placeholder geometry.
//!
//! All inputs are inches; font sizes are points.

/// Bullet count a placeholder of `area` square inches can hold.
pub fn max_bullets_for_area(area: f64) -> usize {
    if area < 3.0 {
        3
    } else if area < 10.0 {
        5
    } else if area < 20.0 {
        7
    } else {
        10
    }
}

/// Words per bullet that fit a `width` x `height` box split into `bullets`.
///
/// Assumes an 18pt line (0.3in), eight characters per inch and six
/// characters per word. Clamped to 5..=40; degenerate input gives 15.
pub fn word_limit(width: f64, height: f64, bullets: usize) -> usize {
    if width <= 0.0 || height <= 0.0 || bullets == 0 {
        return 15;
    }
    let lines_per_bullet = (height / 0.3) / bullets as f64;
    let words_per_line = width * 8.0 / 6.0;
    let limit = (lines_per_bullet * words_per_line) as usize;
    limit.clamp(5, 40)
}

/// Relative size of a run within a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontScale {
    /// Headline numbers.
    Large,
    /// Captions and labels.
    Small,
}

/// Font size scaled from the template base size by placeholder area.
pub fn font_size_for_area(area: f64, base_pt: f64, scale: FontScale) -> f64 {
    let factor = match (scale, area) {
        (FontScale::Large, a) if a < 2.0 => 1.3,
        (FontScale::Large, a) if a < 5.0 => 1.8,
        (FontScale::Large, _) => 2.5,
        (FontScale::Small, a) if a < 2.0 => 0.6,
        (FontScale::Small, a) if a < 5.0 => 0.7,
        (FontScale::Small, _) => 0.8,
    };
    base_pt * factor
}
