use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Chart families the deck writer can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    #[default]
    Column,
    Line,
    Pie,
}

impl ChartType {
    /// Lenient parse: accepts `bar_chart`, `clustered column`, `doughnut`, ...
    pub fn parse(value: &str) -> Self {
        let v = value.to_lowercase();
        if v.contains("pie") || v.contains("doughnut") || v.contains("donut") {
            ChartType::Pie
        } else if v.contains("line") || v.contains("trend") {
            ChartType::Line
        } else if v.contains("bar") {
            ChartType::Bar
        } else {
            ChartType::Column
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Bar => "bar",
            ChartType::Column => "column",
            ChartType::Line => "line",
            ChartType::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ChartType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(ChartType::parse(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_numbers")]
    pub values: Vec<f64>,
}

/// Category chart content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "type", alias = "chart_type", default)]
    pub chart_type: ChartType,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    /// Quarterly placeholder data used when generation fails.
    pub fn fallback(title: &str, chart_type: ChartType) -> Self {
        Self {
            title: title.to_string(),
            chart_type,
            categories: ["Q1", "Q2", "Q3", "Q4"].iter().map(|s| s.to_string()).collect(),
            series: vec![ChartSeries {
                name: "Data".to_string(),
                values: vec![100.0, 120.0, 140.0, 160.0],
            }],
        }
    }

    /// Pads or truncates every series to the category count and drops
    /// empty series. Pie charts keep only the first series.
    pub fn normalize(mut self) -> Self {
        let n = self.categories.len();
        for (i, series) in self.series.iter_mut().enumerate() {
            series.values.resize(n, 0.0);
            if series.name.trim().is_empty() {
                series.name = format!("Series {}", i + 1);
            }
        }
        self.series.retain(|s| !s.values.is_empty());
        if self.chart_type == ChartType::Pie {
            self.series.truncate(1);
        }
        self
    }

    /// Whether the chart has anything to draw.
    pub fn is_renderable(&self) -> bool {
        !self.categories.is_empty() && !self.series.is_empty()
    }
}

/// Table content; the first row is the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    #[serde(default, deserialize_with = "lenient_strings")]
    pub headers: Vec<String>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn fallback() -> Self {
        Self {
            headers: vec!["Metric".into(), "Value".into(), "Change".into()],
            rows: vec![
                vec!["Revenue".into(), "$XXB".into(), "+X%".into()],
                vec!["Profit".into(), "$XXB".into(), "+X%".into()],
            ],
        }
    }

    /// Pads or truncates each row to the header width.
    pub fn normalize(mut self) -> Self {
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        self
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }
}

/// A headline number with its caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

impl KpiData {
    pub fn fallback(title: &str) -> Self {
        Self {
            value: "N/A".to_string(),
            label: title.chars().take(20).collect(),
        }
    }
}

fn value_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(serde_json::Value::deserialize(deserializer)?))
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values.into_iter().map(value_to_string).collect())
}

fn lenient_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<String>>, D::Error> {
    let rows = Vec::<Vec<serde_json::Value>>::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| row.into_iter().map(value_to_string).collect())
        .collect())
}

/// Numbers may arrive as `"12.5%"` or `"$3.2B"`; keep the numeric part.
fn lenient_numbers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let values = Vec::<serde_json::Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
            serde_json::Value::String(s) => parse_number(&s).unwrap_or(0.0),
            _ => 0.0,
        })
        .collect())
}

/// First number in a string, ignoring currency signs and separators.
pub fn parse_number(text: &str) -> Option<f64> {
    let mut digits = String::new();
    let mut started = false;
    for ch in text.chars() {
        match ch {
            '0'..='9' | '.' => {
                digits.push(ch);
                started = true;
            }
            '-' if !started => digits.push(ch),
            ',' if started => {}
            _ if started => break,
            _ => digits.clear(),
        }
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_type_lenient() {
        assert_eq!(ChartType::parse("bar_chart"), ChartType::Bar);
        assert_eq!(ChartType::parse("Clustered Column"), ChartType::Column);
        assert_eq!(ChartType::parse("doughnut"), ChartType::Pie);
        assert_eq!(ChartType::parse("line_chart"), ChartType::Line);
        assert_eq!(ChartType::parse("scatter"), ChartType::Column);
    }

    #[test]
    fn test_chart_json_with_string_numbers() {
        let json = r#"{"title":"Revenue","type":"line","categories":[2022,2023],
            "series":[{"name":"Rev","values":["$1.5B","2,300"]}]}"#;
        let chart: ChartData = serde_json::from_str(json).unwrap();
        assert_eq!(chart.chart_type, ChartType::Line);
        assert_eq!(chart.categories, vec!["2022", "2023"]);
        assert_eq!(chart.series[0].values, vec![1.5, 2300.0]);
    }

    #[test]
    fn test_chart_normalize_pads_and_truncates() {
        let chart = ChartData {
            title: String::new(),
            chart_type: ChartType::Pie,
            categories: vec!["a".into(), "b".into(), "c".into()],
            series: vec![
                ChartSeries {
                    name: String::new(),
                    values: vec![1.0],
                },
                ChartSeries {
                    name: "x".into(),
                    values: vec![1.0, 2.0, 3.0, 4.0],
                },
            ],
        }
        .normalize();
        assert_eq!(chart.series.len(), 1);
        assert_eq!(chart.series[0].values, vec![1.0, 0.0, 0.0]);
        assert_eq!(chart.series[0].name, "Series 1");
    }

    #[test]
    fn test_table_normalize() {
        let table: TableData =
            serde_json::from_str(r#"{"headers":["A","B"],"rows":[["1"],[2,3,4]]}"#).unwrap();
        let table = table.normalize();
        assert_eq!(table.rows[0], vec!["1", ""]);
        assert_eq!(table.rows[1], vec!["2", "3"]);
    }

    #[test]
    fn test_kpi_fallback_truncates_label() {
        let kpi = KpiData::fallback("Quarterly revenue growth overview");
        assert_eq!(kpi.value, "N/A");
        assert_eq!(kpi.label.chars().count(), 20);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("$119.6B"), Some(119.6));
        assert_eq!(parse_number("-4%"), Some(-4.0));
        assert_eq!(parse_number("1,250 units"), Some(1250.0));
        assert_eq!(parse_number("n/a"), None);
    }
}
