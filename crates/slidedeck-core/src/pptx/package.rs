//! OPC package access: parts, relationships and content types.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::ZipArchive;

use super::xml::{attr, escape};
use super::PptxError;

pub const CONTENT_TYPES: &str = "[Content_Types].xml";

pub const REL_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
pub const REL_SLIDE_LAYOUT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
pub const REL_SLIDE_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
pub const REL_THEME: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
pub const REL_NOTES_SLIDE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
pub const REL_NOTES_MASTER: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
pub const REL_CHART: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

pub const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
pub const CT_NOTES_SLIDE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml";
pub const CT_CHART: &str = "application/vnd.openxmlformats-officedocument.drawingml.chart+xml";

/// A relationship from one part to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Target as written in the rels part (usually relative).
    pub target: String,
    pub external: bool,
}

/// An in-memory presentation package.
///
/// Parts are kept in name order so that saved archives are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Package {
    parts: BTreeMap<String, Vec<u8>>,
}

impl Package {
    /// Opens a package from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PptxError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PptxError::io(path, e))?;
        Self::from_bytes(&bytes)
    }

    /// Reads every part of a ZIP archive into memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PptxError> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;
        let mut parts = BTreeMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().trim_start_matches('/').to_string();
            let mut content = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut content)?;
            parts.insert(name, content);
        }

        if !parts.contains_key(CONTENT_TYPES) {
            return Err(PptxError::InvalidPackage(
                "missing [Content_Types].xml".to_string(),
            ));
        }

        Ok(Self { parts })
    }

    /// Serialises the package as a Deflate-compressed ZIP.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PptxError> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        // Content types first, as Office expects.
        if let Some(ct) = self.parts.get(CONTENT_TYPES) {
            zip.start_file(CONTENT_TYPES, options)?;
            zip.write_all(ct)?;
        }
        for (name, content) in &self.parts {
            if name == CONTENT_TYPES {
                continue;
            }
            zip.start_file(name.as_str(), options)?;
            zip.write_all(content)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// Writes the package to disk, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PptxError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PptxError::io(parent, e))?;
        }
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).map_err(|e| PptxError::io(path, e))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parts.contains_key(name)
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts.get(name).map(Vec::as_slice)
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<String, PptxError> {
        let bytes = self
            .parts
            .get(name)
            .ok_or_else(|| PptxError::MissingPart(name.to_string()))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn set_part(&mut self, name: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.parts.insert(name.into(), content.into());
    }

    pub fn remove_part(&mut self, name: &str) -> Option<Vec<u8>> {
        self.parts.remove(name)
    }

    pub fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }

    /// Relationships declared by `part` (empty when it has no rels part).
    pub fn relationships(&self, part: &str) -> Result<Vec<Relationship>, PptxError> {
        let rels_name = rels_path(part);
        match self.parts.get(&rels_name) {
            Some(bytes) => parse_relationships(&rels_name, bytes),
            None => Ok(Vec::new()),
        }
    }

    /// Relationships of `part` with their targets resolved to part names.
    pub fn resolved_relationships(
        &self,
        part: &str,
    ) -> Result<Vec<(Relationship, String)>, PptxError> {
        Ok(self
            .relationships(part)?
            .into_iter()
            .filter(|r| !r.external)
            .map(|r| {
                let target = resolve_target(part, &r.target);
                (r, target)
            })
            .collect())
    }

    /// Part names of every `Override` in the content types part.
    pub fn content_type_overrides(&self) -> Result<Vec<(String, String)>, PptxError> {
        let xml = self.part_str(CONTENT_TYPES)?;
        let mut reader = Reader::from_str(&xml);
        let mut overrides = Vec::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                    if e.local_name().as_ref() == b"Override" =>
                {
                    if let (Some(name), Some(ct)) = (attr(e, b"PartName"), attr(e, b"ContentType")) {
                        overrides.push((name.trim_start_matches('/').to_string(), ct));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(PptxError::xml(CONTENT_TYPES, e)),
                _ => {}
            }
        }
        Ok(overrides)
    }

    /// Adds or replaces the content type override for a part.
    pub fn set_content_type(&mut self, part: &str, content_type: &str) -> Result<(), PptxError> {
        self.remove_content_type(part)?;
        let mut xml = self.part_str(CONTENT_TYPES)?;
        let entry = format!(
            r#"<Override PartName="/{}" ContentType="{}"/>"#,
            escape(part),
            escape(content_type)
        );
        let end = xml
            .rfind("</Types>")
            .ok_or_else(|| PptxError::xml(CONTENT_TYPES, "missing </Types>"))?;
        xml.insert_str(end, &entry);
        self.set_part(CONTENT_TYPES, xml);
        Ok(())
    }

    /// Removes the content type override for a part, if any.
    pub fn remove_content_type(&mut self, part: &str) -> Result<(), PptxError> {
        let mut xml = self.part_str(CONTENT_TYPES)?;
        let needle = format!("PartName=\"/{}\"", escape(part));
        while let Some(pos) = xml.find(&needle) {
            let start = xml[..pos]
                .rfind("<Override")
                .ok_or_else(|| PptxError::xml(CONTENT_TYPES, "dangling PartName"))?;
            let end = xml[pos..]
                .find("/>")
                .map(|e| pos + e + 2)
                .ok_or_else(|| PptxError::xml(CONTENT_TYPES, "unterminated Override"))?;
            xml.replace_range(start..end, "");
        }
        self.set_part(CONTENT_TYPES, xml);
        Ok(())
    }

    /// Makes sure a `Default` entry exists for an extension.
    pub fn ensure_default_content_type(
        &mut self,
        extension: &str,
        content_type: &str,
    ) -> Result<(), PptxError> {
        let mut xml = self.part_str(CONTENT_TYPES)?;
        let lower = xml.to_ascii_lowercase();
        if lower.contains(&format!("extension=\"{}\"", extension.to_ascii_lowercase())) {
            return Ok(());
        }
        let entry = format!(
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            escape(extension),
            escape(content_type)
        );
        let start = xml
            .find("<Types")
            .and_then(|s| xml[s..].find('>').map(|e| s + e + 1))
            .ok_or_else(|| PptxError::xml(CONTENT_TYPES, "missing <Types>"))?;
        xml.insert_str(start, &entry);
        self.set_part(CONTENT_TYPES, xml);
        Ok(())
    }
}

/// The rels part name for a part: `a/b.xml` → `a/_rels/b.xml.rels`.
pub fn rels_path(part: &str) -> String {
    match part.rfind('/') {
        Some(pos) => format!("{}/_rels/{}.rels", &part[..pos], &part[pos + 1..]),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolves a relationship target relative to the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rfind('/') {
        Some(pos) => source_part[..pos].split('/').collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// A relative target from `source_part` to `target_part`.
pub fn relative_target(source_part: &str, target_part: &str) -> String {
    let source_dir: Vec<&str> = match source_part.rfind('/') {
        Some(pos) => source_part[..pos].split('/').collect(),
        None => Vec::new(),
    };
    let target: Vec<&str> = target_part.split('/').collect();
    let common = source_dir
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut parts: Vec<&str> = std::iter::repeat("..").take(source_dir.len() - common).collect();
    parts.extend(&target[common..]);
    parts.join("/")
}

fn parse_relationships(name: &str, bytes: &[u8]) -> Result<Vec<Relationship>, PptxError> {
    let mut reader = Reader::from_reader(bytes);
    let mut buf = Vec::new();
    let mut rels = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let id = attr(e, b"Id").unwrap_or_default();
                let rel_type = attr(e, b"Type").unwrap_or_default();
                let target = attr(e, b"Target").unwrap_or_default();
                let external = attr(e, b"TargetMode").as_deref() == Some("External");
                rels.push(Relationship {
                    id,
                    rel_type,
                    target,
                    external,
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PptxError::xml(name, e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(rels)
}

/// Renders a rels part.
pub fn write_relationships(rels: &[Relationship]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
            escape(&rel.id),
            escape(&rel.rel_type),
            escape(&rel.target),
            if rel.external {
                r#" TargetMode="External""#
            } else {
                ""
            }
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// The next free `rIdN` for a relationship list.
pub fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|r| r.id.strip_prefix("rId").and_then(|n| n.parse::<u32>().ok()))
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}
