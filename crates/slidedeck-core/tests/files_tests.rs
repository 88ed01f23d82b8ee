mod common;

use common::ScriptedLLM;
use slidedeck_core::content::ChartType;
use slidedeck_core::files::{extract_all, extract_chart_data, extract_text, FileError};
use slidedeck_core::llm::LLMError;

const SALES_CSV: &str = "Region,Q1,Q2\nNorth,120,135\n\"South, East\",90,\"1,050\"\n";

#[test]
fn test_extract_text_formats() {
    assert_eq!(extract_text("notes.txt", b"Revenue up 12%").unwrap(), "Revenue up 12%");
    assert_eq!(
        extract_text("sales.csv", SALES_CSV.as_bytes()).unwrap(),
        "Region | Q1 | Q2\nNorth | 120 | 135\nSouth, East | 90 | 1,050"
    );
    assert!(matches!(
        extract_text("report.pdf", b"%PDF"),
        Err(FileError::Unsupported(_))
    ));
    // Images are only read for chart data
    assert!(matches!(
        extract_text("chart.png", &[0x89, b'P', b'N', b'G']),
        Err(FileError::Unsupported(_))
    ));
}

#[test]
fn test_extract_all_labels_each_file() {
    let files: Vec<(&str, &[u8])> = vec![
        ("notes.md", b"# Q3 review\nMargins improved".as_slice()),
        ("empty.txt", b"   ".as_slice()),
        ("sales.csv", SALES_CSV.as_bytes()),
    ];
    let text = extract_all(files).unwrap();
    assert!(text.starts_with("--- notes.md ---\n# Q3 review"));
    assert!(text.contains("--- sales.csv ---\nRegion | Q1 | Q2"));
    assert!(!text.contains("empty.txt"));
}

#[tokio::test]
async fn test_chart_data_from_csv() {
    let response = r#"```json
{"title": "Sales by region", "type": "bar chart", "categories": ["North", "South"],
 "series": [{"name": "", "values": ["120", 90, 77]}]}
```"#;
    let (llm, shared) = ScriptedLLM::new(response).shared();

    let chart = extract_chart_data(&shared, "sales.csv", SALES_CSV.as_bytes())
        .await
        .unwrap();
    assert_eq!(chart.title, "Sales by region");
    assert_eq!(chart.chart_type, ChartType::Bar);
    assert_eq!(chart.series[0].name, "Series 1");
    assert_eq!(chart.series[0].values, vec![120.0, 90.0]);

    // The prompt carries the rendered rows
    assert!(llm.calls()[0].contains("North | 120 | 135"));
}

#[tokio::test]
async fn test_chart_data_without_series() {
    let (_llm, shared) = ScriptedLLM::new(r#"{"title": "Empty", "categories": []}"#).shared();
    let result = extract_chart_data(&shared, "notes.txt", b"no numbers here").await;
    assert!(matches!(result, Err(FileError::NoChartData(_))));
}

#[tokio::test]
async fn test_chart_image_needs_vision_model() {
    let (_llm, shared) = ScriptedLLM::new("{}").shared();
    let result = extract_chart_data(&shared, "chart.png", &[0x89, b'P', b'N', b'G']).await;
    assert!(matches!(result, Err(FileError::LLM(LLMError::Unsupported(_)))));
}
