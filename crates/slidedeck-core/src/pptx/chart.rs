//! DrawingML chart parts with literal (cached) data and no embedded workbook.

use crate::content::{ChartData, ChartType};

use super::xml::escape;

const CAT_AX_ID: u32 = 500_000_001;
const VAL_AX_ID: u32 = 500_000_002;

/// Renders a `c:chartSpace` part for the chart.
pub fn chart_part_xml(chart: &ChartData, accent: &str) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><c:roundedCorners val="0"/><c:chart>"#,
    );

    if chart.title.trim().is_empty() {
        xml.push_str(r#"<c:autoTitleDeleted val="1"/>"#);
    } else {
        xml.push_str(&title_xml(&chart.title));
        xml.push_str(r#"<c:autoTitleDeleted val="0"/>"#);
    }

    xml.push_str("<c:plotArea><c:layout/>");
    match chart.chart_type {
        ChartType::Bar | ChartType::Column => {
            let dir = if chart.chart_type == ChartType::Bar {
                "bar"
            } else {
                "col"
            };
            xml.push_str(&format!(
                r#"<c:barChart><c:barDir val="{dir}"/><c:grouping val="clustered"/><c:varyColors val="0"/>"#
            ));
            push_series(&mut xml, chart, accent, false);
            xml.push_str(&format!(
                r#"<c:gapWidth val="150"/><c:axId val="{CAT_AX_ID}"/><c:axId val="{VAL_AX_ID}"/></c:barChart>"#
            ));
            push_axes(&mut xml, chart.chart_type == ChartType::Bar);
        }
        ChartType::Line => {
            xml.push_str(r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>"#);
            push_series(&mut xml, chart, accent, true);
            xml.push_str(&format!(
                r#"<c:marker val="1"/><c:axId val="{CAT_AX_ID}"/><c:axId val="{VAL_AX_ID}"/></c:lineChart>"#
            ));
            push_axes(&mut xml, false);
        }
        ChartType::Pie => {
            xml.push_str(r#"<c:pieChart><c:varyColors val="1"/>"#);
            push_series(&mut xml, chart, accent, false);
            xml.push_str(r#"<c:firstSliceAng val="0"/></c:pieChart>"#);
        }
    }
    xml.push_str("</c:plotArea>");

    let legend_pos = if chart.chart_type == ChartType::Pie {
        "r"
    } else {
        "b"
    };
    xml.push_str(&format!(
        r#"<c:legend><c:legendPos val="{legend_pos}"/><c:overlay val="0"/></c:legend><c:plotVisOnly val="1"/><c:dispBlanksAs val="gap"/></c:chart>"#
    ));
    xml.push_str(r#"<c:txPr><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="1200"/></a:pPr><a:endParaRPr lang="en-US"/></a:p></c:txPr></c:chartSpace>"#);
    xml
}

fn title_xml(title: &str) -> String {
    format!(
        r#"<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:pPr><a:defRPr sz="1600" b="1"/></a:pPr><a:r><a:rPr lang="en-US" sz="1600" b="1"/><a:t>{}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>"#,
        escape(title)
    )
}

fn push_series(xml: &mut String, chart: &ChartData, accent: &str, line: bool) {
    for (i, series) in chart.series.iter().enumerate() {
        xml.push_str(&format!(
            r#"<c:ser><c:idx val="{i}"/><c:order val="{i}"/><c:tx><c:v>{}</c:v></c:tx>"#,
            escape(&series.name)
        ));

        // First series takes the theme accent; the rest use Office defaults.
        if i == 0 && chart.chart_type != ChartType::Pie {
            if line {
                xml.push_str(&format!(
                    r#"<c:spPr><a:ln w="28575"><a:solidFill><a:srgbClr val="{accent}"/></a:solidFill></a:ln></c:spPr>"#
                ));
            } else {
                xml.push_str(&format!(
                    r#"<c:spPr><a:solidFill><a:srgbClr val="{accent}"/></a:solidFill></c:spPr>"#
                ));
            }
        }
        if chart.chart_type != ChartType::Pie && !line {
            xml.push_str(r#"<c:invertIfNegative val="0"/>"#);
        }
        if chart.chart_type == ChartType::Pie {
            xml.push_str(r#"<c:dLbls><c:showLegendKey val="0"/><c:showVal val="0"/><c:showCatName val="0"/><c:showSerName val="0"/><c:showPercent val="1"/><c:showBubbleSize val="0"/></c:dLbls>"#);
        }

        xml.push_str(&format!(
            r#"<c:cat><c:strLit><c:ptCount val="{}"/>"#,
            chart.categories.len()
        ));
        for (j, cat) in chart.categories.iter().enumerate() {
            xml.push_str(&format!(
                r#"<c:pt idx="{j}"><c:v>{}</c:v></c:pt>"#,
                escape(cat)
            ));
        }
        xml.push_str("</c:strLit></c:cat>");

        xml.push_str(&format!(
            r#"<c:val><c:numLit><c:formatCode>General</c:formatCode><c:ptCount val="{}"/>"#,
            series.values.len()
        ));
        for (j, v) in series.values.iter().enumerate() {
            xml.push_str(&format!(r#"<c:pt idx="{j}"><c:v>{}</c:v></c:pt>"#, format_number(*v)));
        }
        xml.push_str("</c:numLit></c:val>");

        if line {
            xml.push_str(r#"<c:smooth val="0"/>"#);
        }
        xml.push_str("</c:ser>");
    }
}

fn push_axes(xml: &mut String, horizontal_bars: bool) {
    let (cat_pos, val_pos) = if horizontal_bars { ("l", "b") } else { ("b", "l") };
    xml.push_str(&format!(
        r#"<c:catAx><c:axId val="{CAT_AX_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="{cat_pos}"/><c:numFmt formatCode="General" sourceLinked="0"/><c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{VAL_AX_ID}"/><c:crosses val="autoZero"/><c:auto val="1"/><c:lblAlgn val="ctr"/><c:lblOffset val="100"/><c:noMultiLvlLbl val="0"/></c:catAx>"#
    ));
    xml.push_str(&format!(
        r#"<c:valAx><c:axId val="{VAL_AX_ID}"/><c:scaling><c:orientation val="minMax"/></c:scaling><c:delete val="0"/><c:axPos val="{val_pos}"/><c:majorGridlines/><c:numFmt formatCode="General" sourceLinked="0"/><c:majorTickMark val="out"/><c:minorTickMark val="none"/><c:tickLblPos val="nextTo"/><c:crossAx val="{CAT_AX_ID}"/><c:crosses val="autoZero"/><c:crossBetween val="between"/></c:valAx>"#
    ));
}

fn format_number(v: f64) -> String {
    if v.is_finite() {
        if v.fract() == 0.0 && v.abs() < 1e15 {
            format!("{}", v as i64)
        } else {
            format!("{v}")
        }
    } else {
        "0".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ChartSeries;

    fn sample(chart_type: ChartType) -> ChartData {
        ChartData {
            title: "Revenue & Profit".into(),
            chart_type,
            categories: vec!["2023".into(), "2024".into()],
            series: vec![ChartSeries {
                name: "Revenue".into(),
                values: vec![10.0, 12.5],
            }],
        }
    }

    #[test]
    fn test_column_chart_part() {
        let xml = chart_part_xml(&sample(ChartType::Column), "4472C4");
        assert!(xml.contains(r#"<c:barDir val="col"/>"#));
        assert!(xml.contains("Revenue &amp; Profit"));
        assert!(xml.contains("<c:v>12.5</c:v>"));
        assert!(xml.contains("<c:v>10</c:v>"));
        assert!(xml.contains(r#"<c:legendPos val="b"/>"#));
        assert!(xml.contains("<c:catAx>"));
    }

    #[test]
    fn test_pie_chart_has_no_axes() {
        let xml = chart_part_xml(&sample(ChartType::Pie), "4472C4");
        assert!(xml.contains("<c:pieChart>"));
        assert!(!xml.contains("<c:catAx>"));
        assert!(xml.contains(r#"<c:legendPos val="r"/>"#));
    }

    #[test]
    fn test_untitled_chart() {
        let mut chart = sample(ChartType::Line);
        chart.title.clear();
        let xml = chart_part_xml(&chart, "4472C4");
        assert!(xml.contains(r#"<c:autoTitleDeleted val="1"/>"#));
        assert!(!xml.contains("<c:title>"));
        assert!(xml.contains("<c:lineChart>"));
    }
}
