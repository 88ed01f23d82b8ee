//! Tabular sources: CSV text and the first worksheet of an `.xlsx` book.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::pptx::xml::{attr, resolve_entity};
use crate::pptx::Package;

use super::FileError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const SHARED_STRINGS_PART: &str = "xl/sharedStrings.xml";
const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
/// Column `XFD`, the widest sheet a workbook can hold.
const MAX_COLUMNS: usize = 16_384;

/// Renders rows as ` | `-separated lines.
pub fn render_rows(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join(" | "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits CSV text into rows of fields. Quoted fields may contain commas,
/// doubled quotes and line breaks.
pub fn parse_csv(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if quoted {
            match ch {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(ch),
            }
            continue;
        }
        match ch {
            '"' if field.is_empty() => quoted = true,
            ',' => row.push(std::mem::take(&mut field).trim().to_string()),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field).trim().to_string());
                if row.iter().any(|f| !f.is_empty()) {
                    rows.push(std::mem::take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field.trim().to_string());
        if row.iter().any(|f| !f.is_empty()) {
            rows.push(row);
        }
    }
    rows
}

/// Column index of a cell reference such as `C7` (zero-based), or `None`
/// when the reference has no column letters. Columns past `XFD` are
/// malformed.
fn column_index(reference: &str) -> Result<Option<usize>, FileError> {
    let mut n = 0usize;
    for b in reference.bytes().take_while(u8::is_ascii_alphabetic) {
        n = n
            .checked_mul(26)
            .and_then(|acc| acc.checked_add(usize::from(b.to_ascii_uppercase() - b'A' + 1)))
            .filter(|&col| col <= MAX_COLUMNS)
            .ok_or_else(|| FileError::Malformed(format!("cell reference {reference} is past column XFD")))?;
    }
    Ok(n.checked_sub(1))
}

/// Rows of the first worksheet, with shared strings resolved.
pub fn read_xlsx(bytes: &[u8]) -> Result<Vec<Vec<String>>, FileError> {
    let package = Package::from_bytes(bytes)?;
    let shared = match package.part(SHARED_STRINGS_PART) {
        Some(_) => shared_strings(&package.part_str(SHARED_STRINGS_PART)?)?,
        None => Vec::new(),
    };
    let sheet = first_sheet_part(&package)?;
    let xml = package.part_str(&sheet)?;
    sheet_rows(&sheet, &xml, &shared)
}

fn first_sheet_part(package: &Package) -> Result<String, FileError> {
    let workbook = package.part_str(WORKBOOK_PART)?;
    let mut reader = Reader::from_str(&workbook);
    let mut first_rid = None;
    loop {
        match reader.read_event().map_err(|e| FileError::Malformed(e.to_string()))? {
            Event::Empty(ref e) | Event::Start(ref e) if e.local_name().as_ref() == b"sheet" => {
                first_rid = attr(e, b"id");
                break;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    let rid = first_rid.ok_or_else(|| FileError::Malformed("workbook has no sheets".to_string()))?;
    package
        .resolved_relationships(WORKBOOK_PART)?
        .into_iter()
        .find(|(rel, _)| rel.id == rid && rel.rel_type == REL_WORKSHEET)
        .map(|(_, part)| part)
        .ok_or_else(|| FileError::Malformed(format!("worksheet {rid} not found")))
}

/// Collects the text of every `<si>` entry, concatenating rich-text runs.
fn shared_strings(xml: &str) -> Result<Vec<String>, FileError> {
    let mut reader = Reader::from_str(xml);
    let mut strings = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event().map_err(|e| FileError::Malformed(e.to_string()))? {
            Event::Start(ref e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::Text(ref t) if in_text => current.push_str(&String::from_utf8_lossy(t)),
            Event::GeneralRef(ref r) if in_text => {
                if let Some(ch) = resolve_entity(&String::from_utf8_lossy(r)) {
                    current.push(ch);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"si" => strings.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(strings)
}

fn sheet_rows(part: &str, xml: &str, shared: &[String]) -> Result<Vec<Vec<String>>, FileError> {
    let mut reader = Reader::from_str(xml);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut cell_col = 0usize;
    let mut value = String::new();
    let mut in_value = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| FileError::Malformed(format!("{part}: {e}")))?;
        match event {
            Event::Start(ref e) => match e.local_name().as_ref() {
                b"row" => row.clear(),
                b"c" => {
                    cell_type = attr(e, b"t");
                    cell_col = match attr(e, b"r") {
                        Some(reference) => column_index(&reference)?.unwrap_or(row.len()),
                        None => row.len(),
                    };
                    value.clear();
                }
                b"v" | b"t" => in_value = true,
                _ => {}
            },
            Event::Text(ref t) if in_value => value.push_str(&String::from_utf8_lossy(t)),
            Event::GeneralRef(ref r) if in_value => {
                if let Some(ch) = resolve_entity(&String::from_utf8_lossy(r)) {
                    value.push(ch);
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"t" => in_value = false,
                b"c" => {
                    let text = match cell_type.as_deref() {
                        Some("s") => value
                            .trim()
                            .parse::<usize>()
                            .ok()
                            .and_then(|i| shared.get(i).cloned())
                            .unwrap_or_default(),
                        Some("b") => (if value.trim() == "1" { "TRUE" } else { "FALSE" }).to_string(),
                        _ => value.trim().to_string(),
                    };
                    if row.len() <= cell_col {
                        row.resize(cell_col + 1, String::new());
                    }
                    row[cell_col] = text;
                }
                b"row" => {
                    if row.iter().any(|c| !c.is_empty()) {
                        rows.push(std::mem::take(&mut row));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(rows)
}
