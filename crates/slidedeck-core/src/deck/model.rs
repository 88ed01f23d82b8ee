use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::content::{ChartData, TableData};

/// Marker that opens a pictogram bullet: `[[icon]] text`.
pub const ICON_MARKER: &str = "[[";

/// The JSON document the one-shot generator asks the model for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckContent {
    #[serde(default = "untitled")]
    pub title: String,
    #[serde(default)]
    pub slides: Vec<SlideContent>,
}

fn untitled() -> String {
    "Untitled Presentation".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(default)]
    pub heading: String,
    #[serde(default, deserialize_with = "bullets_lenient", skip_serializing_if = "Vec::is_empty")]
    pub bullet_points: Vec<BulletItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img_keywords: Option<String>,
    #[serde(default, deserialize_with = "chart_lenient", skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartData>,
    #[serde(default, deserialize_with = "table_lenient", skip_serializing_if = "Option::is_none")]
    pub table: Option<TableData>,
    /// Layout requested by the model; the matcher decides when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_idx: Option<usize>,
}

/// One bullet: plain text, a nested list one level deeper, or a headed group
/// (a comparison column).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BulletItem {
    Text(String),
    Nested(Vec<BulletItem>),
    Group(BulletGroup),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulletGroup {
    #[serde(default)]
    pub heading: String,
    #[serde(default, deserialize_with = "bullets_lenient")]
    pub bullet_points: Vec<BulletItem>,
}

impl BulletItem {
    /// Converts any JSON value; numbers and booleans become text, `null` is dropped.
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(Self::Text(s)),
            Value::Array(items) => Some(Self::Nested(
                items.into_iter().filter_map(Self::from_value).collect(),
            )),
            Value::Object(mut map) => {
                let heading = match map.remove("heading") {
                    Some(Value::String(s)) => s,
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                let bullet_points = map
                    .remove("bullet_points")
                    .map(bullets_from_value)
                    .unwrap_or_default();
                Some(Self::Group(BulletGroup {
                    heading,
                    bullet_points,
                }))
            }
            other => Some(Self::Text(other.to_string())),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&BulletGroup> {
        match self {
            Self::Group(g) => Some(g),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for BulletItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).ok_or_else(|| serde::de::Error::custom("null bullet"))
    }
}

fn bullets_from_value(value: Value) -> Vec<BulletItem> {
    match value {
        Value::Array(items) => items.into_iter().filter_map(BulletItem::from_value).collect(),
        Value::Null => Vec::new(),
        other => BulletItem::from_value(other).into_iter().collect(),
    }
}

fn bullets_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<BulletItem>, D::Error> {
    Ok(bullets_from_value(Value::deserialize(deserializer)?))
}

// Charts and tables that fail to parse are dropped rather than failing the deck.
fn chart_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<ChartData>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<ChartData>(value)
        .ok()
        .map(ChartData::normalize)
        .filter(ChartData::is_renderable))
}

fn table_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<TableData>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value::<TableData>(value)
        .ok()
        .filter(|t| t.column_count() > 0)
        .map(TableData::normalize))
}

impl SlideContent {
    /// Every bullet is a `[[icon]] text` string.
    pub fn is_icon_slide(&self) -> bool {
        !self.bullet_points.is_empty()
            && self.bullet_points.iter().all(|b| {
                b.as_text()
                    .is_some_and(|t| t.trim_start().starts_with(ICON_MARKER))
            })
    }

    /// Two or more headed groups.
    pub fn is_double_column(&self) -> bool {
        self.bullet_points.len() >= 2 && self.bullet_points.iter().all(|b| b.as_group().is_some())
    }

    pub fn groups(&self) -> impl Iterator<Item = &BulletGroup> {
        self.bullet_points.iter().filter_map(BulletItem::as_group)
    }

    /// `(icon, text)` pairs of a pictogram slide.
    pub fn icon_items(&self) -> Vec<(String, String)> {
        self.bullet_points
            .iter()
            .filter_map(BulletItem::as_text)
            .filter_map(parse_icon_item)
            .collect()
    }
}

/// Splits `[[name]] text` into its icon name and text.
pub fn parse_icon_item(item: &str) -> Option<(String, String)> {
    let rest = item.trim_start().strip_prefix(ICON_MARKER)?;
    let end = rest.find("]]")?;
    Some((rest[..end].trim().to_string(), rest[end + 2..].trim().to_string()))
}

/// Flattens bullets to `(text, level)` pairs.
///
/// Nested lists go one level deeper; a group contributes its heading at the
/// current level and its bullets one level below.
pub fn flatten_bullets(items: &[BulletItem], level: u32) -> Vec<(String, u32)> {
    let mut flat = Vec::new();
    for item in items {
        match item {
            BulletItem::Text(text) => flat.push((text.clone(), level)),
            BulletItem::Nested(inner) => flat.extend(flatten_bullets(inner, level + 1)),
            BulletItem::Group(group) => {
                if !group.heading.is_empty() {
                    flat.push((group.heading.clone(), level));
                }
                flat.extend(flatten_bullets(&group.bullet_points, level + 1));
            }
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_bullets_parse() {
        let json = r#"{
            "heading": "AI in Key Industries",
            "bullet_points": [
                {"heading": "Retail", "bullet_points": ["Inventory", ["Demand forecasting"]]},
                {"heading": "Finance", "bullet_points": "Credit scoring"}
            ],
            "key_message": "AI is everywhere"
        }"#;
        let slide: SlideContent = serde_json::from_str(json).unwrap();
        assert!(slide.is_double_column());
        let finance = slide.bullet_points[1].as_group().unwrap();
        assert_eq!(finance.bullet_points, vec![BulletItem::Text("Credit scoring".into())]);

        let flat = flatten_bullets(&slide.bullet_points, 0);
        assert_eq!(flat[0], ("Retail".to_string(), 0));
        assert_eq!(flat[2], ("Demand forecasting".to_string(), 2));
    }

    #[test]
    fn test_icon_items() {
        let slide = SlideContent {
            heading: "Aspects".into(),
            bullet_points: vec![
                BulletItem::Text("[[brain]] Human-like *intelligence*".into()),
                BulletItem::Text("[[]] Data processing".into()),
            ],
            ..Default::default()
        };
        assert!(slide.is_icon_slide());
        let items = slide.icon_items();
        assert_eq!(items[0], ("brain".to_string(), "Human-like *intelligence*".to_string()));
        assert_eq!(items[1].0, "");
    }

    #[test]
    fn test_bad_chart_is_dropped() {
        let json = r#"{"heading": "x", "chart": {"categories": []}, "table": {"headers": ["A", "B"], "rows": [["1"]]}}"#;
        let slide: SlideContent = serde_json::from_str(json).unwrap();
        assert!(slide.chart.is_none());
        assert_eq!(slide.table.unwrap().rows[0], vec!["1".to_string(), String::new()]);
    }
}
