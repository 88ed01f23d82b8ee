use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::matcher::PlaceholderAssignment;
use crate::pptx::{PlaceholderKind, SlideLayout};

/// What a placeholder is filled with during execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRole {
    Subtitle,
    Chart,
    Table,
    Kpi,
    Content,
    MainContent,
    Image,
    Icon,
}

impl FillRole {
    /// Roles offered to the model during role validation, in match order.
    pub const ALL: [FillRole; 8] = [
        FillRole::Subtitle,
        FillRole::Chart,
        FillRole::Table,
        FillRole::Kpi,
        FillRole::Content,
        FillRole::MainContent,
        FillRole::Image,
        FillRole::Icon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subtitle => "subtitle",
            Self::Chart => "chart",
            Self::Table => "table",
            Self::Kpi => "kpi",
            Self::Content => "content",
            Self::MainContent => "main_content",
            Self::Image => "image",
            Self::Icon => "icon",
        }
    }

    /// Exact name first, then the first allowed role the text contains.
    pub fn fuzzy(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        Self::ALL
            .iter()
            .find(|r| r.as_str() == value)
            .or_else(|| Self::ALL.iter().find(|r| value.contains(r.as_str())))
            .copied()
    }

    /// Body text roles.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Content | Self::MainContent)
    }
}

impl fmt::Display for FillRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role implied by placeholder kind and size (inches).
pub fn infer_role(kind: PlaceholderKind, height: f64, area: f64) -> FillRole {
    match kind {
        PlaceholderKind::Title | PlaceholderKind::SubTitle => FillRole::Subtitle,
        PlaceholderKind::Chart => FillRole::Chart,
        PlaceholderKind::Tbl => FillRole::Table,
        PlaceholderKind::Pic => FillRole::Image,
        PlaceholderKind::Body | PlaceholderKind::Obj => {
            if height < 0.8 {
                FillRole::Subtitle
            } else if area < 3.0 {
                FillRole::Kpi
            } else if area < 15.0 {
                FillRole::Content
            } else {
                FillRole::MainContent
            }
        }
        _ => FillRole::Content,
    }
}

/// A fillable placeholder of a slide being executed.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSlot {
    pub idx: u32,
    pub kind: PlaceholderKind,
    pub role: FillRole,
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub area: f64,
    /// Content the matcher proposed for this placeholder.
    pub suggested: Option<PlaceholderAssignment>,
}

/// Fillable placeholders of a layout keyed by idx.
///
/// Skips idx 0, title placeholders and date/footer/number fields. Missing
/// geometry counts as a one inch square at the origin.
pub fn map_placeholders(layout: &SlideLayout) -> BTreeMap<u32, PlaceholderSlot> {
    layout
        .placeholders
        .iter()
        .filter(|p| p.idx != 0 && !p.kind.is_title() && !p.kind.is_footer())
        .map(|p| {
            let (left, top, width, height) = match p.bounds {
                Some(b) => (b.left_in(), b.top_in(), b.width_in(), b.height_in()),
                None => (0.0, 0.0, 1.0, 1.0),
            };
            let area = width * height;
            let slot = PlaceholderSlot {
                idx: p.idx,
                kind: p.kind,
                role: infer_role(p.kind, height, area),
                left,
                top,
                width,
                height,
                area,
                suggested: None,
            };
            (p.idx, slot)
        })
        .collect()
}

/// Applies matcher suggestions. Bullet suggestions keep an existing text
/// role.
pub fn merge_suggestions(
    slots: &mut BTreeMap<u32, PlaceholderSlot>,
    suggestions: BTreeMap<u32, PlaceholderAssignment>,
) {
    for (idx, assignment) in suggestions {
        let Some(slot) = slots.get_mut(&idx) else {
            continue;
        };
        slot.role = match &assignment {
            PlaceholderAssignment::Chart { .. } => FillRole::Chart,
            PlaceholderAssignment::Table { .. } => FillRole::Table,
            PlaceholderAssignment::Subtitle { .. } => FillRole::Subtitle,
            PlaceholderAssignment::Icon { .. } => FillRole::Icon,
            PlaceholderAssignment::Bullets { .. } if slot.role.is_text() => slot.role,
            PlaceholderAssignment::Bullets { .. } => FillRole::Content,
        };
        slot.suggested = Some(assignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::{Bounds, LayoutPlaceholder};

    fn ph(idx: u32, kind: PlaceholderKind, w: f64, h: f64) -> LayoutPlaceholder {
        LayoutPlaceholder {
            idx,
            kind,
            name: format!("ph {idx}"),
            bounds: Some(Bounds::inches(0.5, 1.0, w, h)),
        }
    }

    #[test]
    fn test_infer_role_by_size() {
        assert_eq!(infer_role(PlaceholderKind::Body, 0.5, 4.0), FillRole::Subtitle);
        assert_eq!(infer_role(PlaceholderKind::Obj, 1.0, 2.0), FillRole::Kpi);
        assert_eq!(infer_role(PlaceholderKind::Obj, 3.0, 12.0), FillRole::Content);
        assert_eq!(infer_role(PlaceholderKind::Body, 5.0, 40.0), FillRole::MainContent);
        assert_eq!(infer_role(PlaceholderKind::Tbl, 5.0, 40.0), FillRole::Table);
        assert_eq!(infer_role(PlaceholderKind::Pic, 5.0, 40.0), FillRole::Image);
        assert_eq!(infer_role(PlaceholderKind::SubTitle, 5.0, 40.0), FillRole::Subtitle);
    }

    #[test]
    fn test_fuzzy_role() {
        assert_eq!(FillRole::fuzzy("KPI"), Some(FillRole::Kpi));
        assert_eq!(FillRole::fuzzy("main_content"), Some(FillRole::MainContent));
        assert_eq!(FillRole::fuzzy("a bar chart"), Some(FillRole::Chart));
        assert_eq!(FillRole::fuzzy("paragraph"), None);
    }

    #[test]
    fn test_map_placeholders_skips_title_and_footers() {
        let layout = SlideLayout {
            index: 1,
            name: "Title and Content".to_string(),
            part_name: "ppt/slideLayouts/slideLayout2.xml".to_string(),
            placeholders: vec![
                ph(0, PlaceholderKind::Title, 9.0, 1.0),
                ph(1, PlaceholderKind::Obj, 9.0, 5.0),
                ph(10, PlaceholderKind::Dt, 2.0, 0.4),
            ],
        };
        let slots = map_placeholders(&layout);
        assert_eq!(slots.keys().copied().collect::<Vec<_>>(), vec![1]);
        assert_eq!(slots[&1].role, FillRole::Content);
        assert!((slots[&1].area - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_keeps_text_role_for_bullets() {
        let layout = SlideLayout {
            index: 1,
            name: "Two".to_string(),
            part_name: "ppt/slideLayouts/slideLayout2.xml".to_string(),
            placeholders: vec![ph(1, PlaceholderKind::Body, 9.0, 5.0), ph(2, PlaceholderKind::Body, 1.5, 1.5)],
        };
        let mut slots = map_placeholders(&layout);
        assert_eq!(slots[&1].role, FillRole::MainContent);
        let mut suggestions = BTreeMap::new();
        suggestions.insert(1, PlaceholderAssignment::Bullets { items: Vec::new() });
        suggestions.insert(2, PlaceholderAssignment::Subtitle { text: "Overview".to_string() });
        suggestions.insert(7, PlaceholderAssignment::Subtitle { text: "ignored".to_string() });
        merge_suggestions(&mut slots, suggestions);
        assert_eq!(slots[&1].role, FillRole::MainContent);
        assert_eq!(slots[&2].role, FillRole::Subtitle);
        assert!(slots[&2].suggested.is_some());
    }
}
