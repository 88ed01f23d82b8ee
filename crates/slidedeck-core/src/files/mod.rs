//! Uploaded source files: text for the planner, chart data for a slide.

mod sheet;

use std::path::Path;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::CHART_CONTENT_CHARS;
use crate::content::ChartData;
use crate::llm::json::parse_json;
use crate::llm::{CompletionOptions, ImageInput, LLMError, SharedLLM};
use crate::pptx::PptxError;

pub use sheet::{parse_csv, read_xlsx, render_rows};

const CHART_SYSTEM_PROMPT: &str = "Extract chart data to JSON. Return only valid JSON.";

const CHART_SHAPE: &str = r#"{
  "title": "Chart Title",
  "type": "column",
  "categories": ["Cat1", "Cat2"],
  "series": [{"name": "Series 1", "values": [10, 20]}]
}"#;

/// How an upload is read, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Text,
    Csv,
    Xlsx,
    Image(&'static str),
}

impl FileKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "md" => Some(Self::Text),
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "png" => Some(Self::Image("image/png")),
            "jpg" | "jpeg" => Some(Self::Image("image/jpeg")),
            "gif" => Some(Self::Image("image/gif")),
            "webp" => Some(Self::Image("image/webp")),
            _ => None,
        }
    }
}

/// Text content of a document upload.
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, FileError> {
    let kind = FileKind::from_name(name).ok_or_else(|| FileError::Unsupported(name.to_string()))?;
    let text = match kind {
        FileKind::Text => String::from_utf8_lossy(bytes).into_owned(),
        FileKind::Csv => render_rows(&parse_csv(&String::from_utf8_lossy(bytes))),
        FileKind::Xlsx => render_rows(&read_xlsx(bytes)?),
        FileKind::Image(_) => return Err(FileError::Unsupported(name.to_string())),
    };
    debug!(file = name, chars = text.len(), "text extracted");
    Ok(text)
}

/// Joins the text of several uploads, each under its file name.
pub fn extract_all<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Result<String, FileError> {
    let mut parts = Vec::new();
    for (name, bytes) in files {
        let text = extract_text(name, bytes)?;
        if !text.trim().is_empty() {
            parts.push(format!("--- {name} ---\n{}", text.trim()));
        }
    }
    Ok(parts.join("\n\n"))
}

/// Chart data from an upload: images go to the vision model, other files
/// are read as text and structured by the model.
pub async fn extract_chart_data(llm: &SharedLLM, name: &str, bytes: &[u8]) -> Result<ChartData, FileError> {
    let kind = FileKind::from_name(name).ok_or_else(|| FileError::Unsupported(name.to_string()))?;
    let options = CompletionOptions::temperature(0.1).with_max_tokens(500).json();

    let response = match kind {
        FileKind::Image(mime) => {
            let image = ImageInput::from_bytes(mime, bytes);
            let prompt = format!(
                "Analyze this chart image and extract its data points. The type is one of bar, column, line or pie.\n\nReturn JSON:\n{CHART_SHAPE}"
            );
            llm.complete_with_image(CHART_SYSTEM_PROMPT, &prompt, &image).await?
        }
        _ => {
            let content: String = extract_text(name, bytes)?.chars().take(CHART_CONTENT_CHARS).collect();
            let prompt = format!("Extract chart data from this content:\n\n{content}\n\nReturn ONLY valid JSON:\n{CHART_SHAPE}");
            llm.complete_with_options(CHART_SYSTEM_PROMPT, &prompt, &options).await?
        }
    };

    let chart = parse_json::<ChartData>(&response)?.normalize();
    if !chart.is_renderable() {
        return Err(FileError::NoChartData(name.to_string()));
    }
    info!(file = name, categories = chart.categories.len(), series = chart.series.len(), "chart data extracted");
    Ok(chart)
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("Unsupported file type: {0}")]
    Unsupported(String),

    #[error("Malformed spreadsheet: {0}")]
    Malformed(String),

    #[error("Spreadsheet package error: {0}")]
    Package(#[from] PptxError),

    #[error("No chart data found in {0}")]
    NoChartData(String),

    #[error("LLM error: {0}")]
    LLM(#[from] LLMError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_kind_by_extension() {
        assert_eq!(FileKind::from_name("notes.MD"), Some(FileKind::Text));
        assert_eq!(FileKind::from_name("q3.xlsx"), Some(FileKind::Xlsx));
        assert_eq!(FileKind::from_name("chart.JPG"), Some(FileKind::Image("image/jpeg")));
        assert_eq!(FileKind::from_name("deck.pdf"), None);
        assert_eq!(FileKind::from_name("noext"), None);
    }

    #[test]
    fn test_extract_text_csv_and_unsupported() {
        let text = extract_text("sales.csv", b"Region,Revenue\nNorth,120\n").unwrap();
        assert_eq!(text, "Region | Revenue\nNorth | 120");
        assert!(matches!(extract_text("a.pdf", b""), Err(FileError::Unsupported(_))));
        assert!(matches!(extract_text("a.png", b""), Err(FileError::Unsupported(_))));
    }

    #[test]
    fn test_extract_all_labels_files() {
        let files = [("a.txt", &b"alpha"[..]), ("b.md", &b"  "[..])];
        assert_eq!(extract_all(files).unwrap(), "--- a.txt ---\nalpha");
    }
}
