use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pptx::{Bounds, LayoutPlaceholder, PlaceholderKind};

/// What a placeholder is used for when a slide is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderRole {
    Title,
    Subtitle,
    Content,
    Footer,
}

impl PlaceholderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Subtitle => "subtitle",
            Self::Content => "content",
            Self::Footer => "footer",
        }
    }
}

impl fmt::Display for PlaceholderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A layout placeholder measured in inches, with derived size flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderInfo {
    pub idx: u32,
    pub kind: PlaceholderKind,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    pub role: PlaceholderRole,
    /// Spatial group name (`left_column`, `row_2`, ...); empty until grouped.
    pub position_group: String,
    pub aspect_ratio: f64,
    pub is_small: bool,
    pub is_medium: bool,
    pub is_large: bool,
    pub is_wide: bool,
    pub is_tall: bool,
}

impl PlaceholderInfo {
    /// Measures a placeholder; its role comes from [`classify_role`].
    pub fn new(idx: u32, kind: PlaceholderKind, left: f64, top: f64, width: f64, height: f64) -> Self {
        let area = width * height;
        let aspect_ratio = if height > 0.0 { width / height } else { 1.0 };
        Self {
            idx,
            kind,
            left,
            top,
            width,
            height,
            area,
            role: classify_role(kind, width, height, area),
            position_group: String::new(),
            aspect_ratio,
            is_small: area < 3.0,
            is_medium: (3.0..15.0).contains(&area),
            is_large: area >= 15.0,
            is_wide: aspect_ratio > 2.0,
            is_tall: aspect_ratio < 0.5,
        }
    }

    /// Measures a layout placeholder; `None` when it has no geometry.
    pub fn from_layout(placeholder: &LayoutPlaceholder) -> Option<Self> {
        let b: Bounds = placeholder.bounds?;
        Some(Self::new(
            placeholder.idx,
            placeholder.kind,
            b.left_in(),
            b.top_in(),
            b.width_in(),
            b.height_in(),
        ))
    }
}

/// The largest placeholder by area; the first one wins ties.
pub fn largest<'a>(items: impl IntoIterator<Item = &'a PlaceholderInfo>) -> Option<&'a PlaceholderInfo> {
    items.into_iter().fold(None, |best, p| match best {
        Some(b) if b.area >= p.area => Some(b),
        _ => Some(p),
    })
}

/// Role of a placeholder from its kind and size.
///
/// Body and object placeholders that are short, tiny, or wide-and-short
/// behave as subtitles.
pub fn classify_role(kind: PlaceholderKind, width: f64, height: f64, area: f64) -> PlaceholderRole {
    match kind {
        PlaceholderKind::SubTitle => PlaceholderRole::Subtitle,
        k if k.is_title() => PlaceholderRole::Title,
        k if k.is_footer() => PlaceholderRole::Footer,
        PlaceholderKind::Chart | PlaceholderKind::Tbl | PlaceholderKind::Pic => {
            PlaceholderRole::Content
        }
        PlaceholderKind::Body | PlaceholderKind::Obj => {
            let aspect = if height > 0.0 { width / height } else { 1.0 };
            if height < 0.5 || area < 1.0 || (aspect > 3.0 && height < 0.8) {
                PlaceholderRole::Subtitle
            } else {
                PlaceholderRole::Content
            }
        }
        _ => PlaceholderRole::Content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_flags() {
        let p = PlaceholderInfo::new(1, PlaceholderKind::Obj, 0.5, 1.75, 9.0, 4.95);
        assert!(p.is_large);
        assert!(!p.is_medium);
        assert!((p.aspect_ratio - 9.0 / 4.95).abs() < 1e-9);

        let flat = PlaceholderInfo::new(2, PlaceholderKind::Obj, 0.0, 0.0, 1.0, 0.0);
        assert_eq!(flat.aspect_ratio, 1.0);
        assert!(flat.is_small);
    }

    #[test]
    fn test_classify_role() {
        use PlaceholderKind::*;
        assert_eq!(classify_role(SubTitle, 7.0, 1.75, 12.25), PlaceholderRole::Subtitle);
        assert_eq!(classify_role(CtrTitle, 8.5, 1.6, 13.6), PlaceholderRole::Title);
        assert_eq!(classify_role(SldNum, 2.0, 0.4, 0.8), PlaceholderRole::Footer);
        assert_eq!(classify_role(Chart, 1.0, 0.3, 0.3), PlaceholderRole::Content);
        assert_eq!(classify_role(Body, 4.4, 0.6, 2.64), PlaceholderRole::Subtitle);
        assert_eq!(classify_role(Body, 2.5, 1.1, 2.75), PlaceholderRole::Content);
        assert_eq!(classify_role(Obj, 0.9, 0.9, 0.81), PlaceholderRole::Subtitle);
        assert_eq!(classify_role(Obj, 9.0, 0.45, 4.05), PlaceholderRole::Subtitle);
    }
}
