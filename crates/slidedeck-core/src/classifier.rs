//! Rule-based choice of a placeholder's content type.

/// Picks a content type for a placeholder from its description and the
/// types its layout handles well.
///
/// Comparisons prefer a table, trends a line chart, breakdowns a pie or
/// column chart, and metrics a KPI card. Anything else takes the first
/// optimal type, or `text` when there is none.
pub fn select_content_type(description: &str, optimal_types: &[String]) -> String {
    let desc = description.to_lowercase();
    let has = |t: &str| optimal_types.iter().any(|o| o == t);
    let any_chart = optimal_types.iter().any(|o| o.contains("chart"));

    if desc.contains("comparison") || desc.contains("vs") {
        if has("table") {
            return "comparison_table".to_string();
        }
        if any_chart {
            return "bar_chart".to_string();
        }
    }
    if (desc.contains("trend") || desc.contains("over time")) && any_chart {
        return "line_chart".to_string();
    }
    if desc.contains("breakdown") || desc.contains("distribution") {
        if has("pie_chart") {
            return "pie_chart".to_string();
        }
        if has("column_chart") {
            return "column_chart".to_string();
        }
    }
    if ["metric", "kpi", "number", "stat"].iter().any(|w| desc.contains(w)) && has("kpi") {
        return "kpi".to_string();
    }
    optimal_types
        .first()
        .cloned()
        .unwrap_or_else(|| "text".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_comparison_rules() {
        assert_eq!(select_content_type("Cloud vs on-prem", &types(&["chart", "table"])), "comparison_table");
        assert_eq!(select_content_type("Vendor comparison", &types(&["bar_chart"])), "bar_chart");
    }

    #[test]
    fn test_trend_breakdown_and_metrics() {
        assert_eq!(select_content_type("Revenue trend", &types(&["line_chart"])), "line_chart");
        assert_eq!(select_content_type("Cost breakdown", &types(&["bullets", "pie_chart"])), "pie_chart");
        assert_eq!(select_content_type("Key metric", &types(&["bullets", "kpi"])), "kpi");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(select_content_type("Overview", &types(&["bullets", "chart"])), "bullets");
        assert_eq!(select_content_type("Overview", &[]), "text");
        // no table or chart available: falls through
        assert_eq!(select_content_type("A vs B", &types(&["bullets"])), "bullets");
    }
}
