//! Writes decks on top of a template package.
//!
//! The template's own slides are dropped; every added slide references one of
//! the template layouts and carries only the placeholders that were filled.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::content::{ChartData, KpiData, TableData};

use super::chart::chart_part_xml;
use super::package::{
    next_rel_id, relative_target, rels_path, write_relationships, Package, Relationship,
    CT_CHART, CT_NOTES_SLIDE, CT_SLIDE, REL_CHART, REL_NOTES_MASTER, REL_NOTES_SLIDE, REL_SLIDE,
    REL_SLIDE_LAYOUT,
};
use super::properties::ThemeColors;
use super::template::{presentation_part, Bounds, LayoutPlaceholder, PlaceholderKind, SlideLayout, Template};
use super::xml::{element_span, escape};
use super::PptxError;

const NS_DECL: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

/// First id handed out in `p:sldIdLst`.
pub const FIRST_SLIDE_ID: u32 = 256;

/// Run formatting. Unset fields inherit from the layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextStyle {
    pub size_pt: Option<f64>,
    /// `RRGGBB`.
    pub color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub font: Option<String>,
    pub centered: bool,
}

impl TextStyle {
    pub fn sized(size_pt: f64) -> Self {
        Self {
            size_pt: Some(size_pt),
            ..Self::default()
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn font(mut self, font: impl Into<String>) -> Self {
        self.font = Some(font.into());
        self
    }

    pub fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Run {
    text: String,
    style: TextStyle,
}

#[derive(Debug, Clone)]
struct Paragraph {
    runs: Vec<Run>,
    level: u32,
}

impl Paragraph {
    fn single(text: &str, level: u32, style: &TextStyle) -> Self {
        Self {
            runs: vec![Run {
                text: text.to_string(),
                style: style.clone(),
            }],
            level,
        }
    }

    /// Splits `**bold**` and `*italic*` markup into runs.
    fn formatted(text: &str, level: u32, style: &TextStyle) -> Self {
        let runs: Vec<Run> = inline_spans(text)
            .into_iter()
            .map(|span| {
                let mut style = style.clone();
                style.bold |= span.bold;
                style.italic |= span.italic;
                Run {
                    text: span.text,
                    style,
                }
            })
            .collect();
        if runs.is_empty() {
            return Self::single("", level, style);
        }
        Self { runs, level }
    }
}

/// A piece of text with inline emphasis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// Parses `**bold**` and `*italic*` markup. Unclosed markers stay literal;
/// empty emphasis is dropped.
pub fn inline_spans(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    let mut emphasis = |plain: &mut String, spans: &mut Vec<InlineSpan>, inner: &str, bold: bool| {
        if !plain.is_empty() {
            spans.push(InlineSpan {
                text: std::mem::take(plain),
                bold: false,
                italic: false,
            });
        }
        if !inner.is_empty() {
            spans.push(InlineSpan {
                text: inner.to_string(),
                bold,
                italic: !bold,
            });
        }
    };

    while let Some(ch) = rest.chars().next() {
        if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**") {
                emphasis(&mut plain, &mut spans, &after[..end], true);
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*') {
                emphasis(&mut plain, &mut spans, &after[..end], false);
                rest = &after[end + 1..];
                continue;
            }
        }
        plain.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    if !plain.is_empty() {
        spans.push(InlineSpan {
            text: plain,
            bold: false,
            italic: false,
        });
    }
    spans
}

#[derive(Debug, Clone)]
enum Shape {
    Placeholder {
        ph: LayoutPlaceholder,
        paragraphs: Vec<Paragraph>,
    },
    TextBox {
        bounds: Bounds,
        paragraphs: Vec<Paragraph>,
        /// `RRGGBB` fill of a rounded card; plain box when unset.
        fill: Option<String>,
    },
    Table {
        idx: u32,
        bounds: Bounds,
        table: TableData,
        font: String,
    },
    Chart {
        idx: u32,
        bounds: Bounds,
        chart: usize,
    },
}

impl Shape {
    /// Layout placeholder this shape occupies, if any.
    fn slot(&self) -> Option<u32> {
        match self {
            Shape::Placeholder { ph, .. } => Some(ph.idx),
            Shape::Table { idx, .. } | Shape::Chart { idx, .. } => Some(*idx),
            Shape::TextBox { .. } => None,
        }
    }
}

/// Content for one slide, collected before the package is written.
#[derive(Debug, Clone)]
pub struct SlideBuilder {
    layout: SlideLayout,
    slide_size: (i64, i64),
    theme: ThemeColors,
    font: String,
    shapes: Vec<Shape>,
    charts: Vec<ChartData>,
    notes: Option<String>,
}

impl SlideBuilder {
    pub fn layout(&self) -> &SlideLayout {
        &self.layout
    }

    /// Bounds of a layout placeholder.
    pub fn placeholder_bounds(&self, idx: u32) -> Option<Bounds> {
        self.layout.placeholder(idx).and_then(|p| p.bounds)
    }

    /// Whether a placeholder has already been filled.
    pub fn is_filled(&self, idx: u32) -> bool {
        self.shapes.iter().any(|s| s.slot() == Some(idx))
    }

    /// Sets the title; returns false when the layout has no title placeholder.
    pub fn set_title(&mut self, text: &str) -> bool {
        let Some(ph) = self.layout.title_placeholder().cloned() else {
            return false;
        };
        self.replace(Shape::Placeholder {
            ph,
            paragraphs: vec![Paragraph::single(text, 0, &TextStyle::default())],
        });
        true
    }

    /// Fills a placeholder with plain text (one paragraph per line).
    pub fn set_text(&mut self, idx: u32, text: &str, style: &TextStyle) -> Result<(), PptxError> {
        let ph = self.require(idx)?;
        let paragraphs = text
            .lines()
            .map(|line| Paragraph::single(line, 0, style))
            .collect::<Vec<_>>();
        let paragraphs = if paragraphs.is_empty() {
            vec![Paragraph::single("", 0, style)]
        } else {
            paragraphs
        };
        self.replace(Shape::Placeholder { ph, paragraphs });
        Ok(())
    }

    /// Fills a placeholder with bullet paragraphs at the given levels.
    pub fn set_bullets(
        &mut self,
        idx: u32,
        items: &[(String, u32)],
        style: &TextStyle,
    ) -> Result<(), PptxError> {
        let ph = self.require(idx)?;
        let paragraphs = items
            .iter()
            .map(|(text, level)| Paragraph::formatted(text, (*level).min(8), style))
            .collect();
        self.replace(Shape::Placeholder { ph, paragraphs });
        Ok(())
    }

    /// A large accent-coloured value above a small label.
    pub fn set_kpi(
        &mut self,
        idx: u32,
        kpi: &KpiData,
        value_pt: f64,
        label_pt: f64,
    ) -> Result<(), PptxError> {
        let ph = self.require(idx)?;
        let value_style = TextStyle::sized(value_pt)
            .bold()
            .color(self.theme.accent1.clone())
            .font(self.font.clone());
        let label_style = TextStyle::sized(label_pt).font(self.font.clone());
        self.replace(Shape::Placeholder {
            ph,
            paragraphs: vec![
                Paragraph::single(&kpi.value, 0, &value_style),
                Paragraph::single(&kpi.label, 0, &label_style),
            ],
        });
        Ok(())
    }

    /// Replaces a placeholder with a table at its position.
    pub fn set_table(&mut self, idx: u32, table: &TableData) -> Result<(), PptxError> {
        let ph = self.require(idx)?;
        let bounds = ph.bounds.unwrap_or_else(|| self.default_bounds());
        self.replace(Shape::Table {
            idx,
            bounds,
            table: table.clone().normalize(),
            font: self.font.clone(),
        });
        Ok(())
    }

    /// Replaces a placeholder with a chart at its position.
    pub fn set_chart(&mut self, idx: u32, chart: &ChartData) -> Result<(), PptxError> {
        let ph = self.require(idx)?;
        let bounds = ph.bounds.unwrap_or_else(|| self.default_bounds());
        self.charts.push(chart.clone().normalize());
        let chart = self.charts.len() - 1;
        self.replace(Shape::Chart { idx, bounds, chart });
        Ok(())
    }

    /// Adds a free-floating text box.
    pub fn add_text_box(&mut self, bounds: Bounds, text: &str, style: &TextStyle) {
        self.push_box(bounds, text, style, None);
    }

    /// Adds a rounded card with a solid fill and a light outline.
    pub fn add_card(&mut self, bounds: Bounds, text: &str, style: &TextStyle, fill: &str) {
        self.push_box(bounds, text, style, Some(fill.to_string()));
    }

    fn push_box(&mut self, bounds: Bounds, text: &str, style: &TextStyle, fill: Option<String>) {
        let paragraphs = text
            .lines()
            .map(|line| Paragraph::formatted(line, 0, style))
            .collect();
        self.shapes.push(Shape::TextBox {
            bounds,
            paragraphs,
            fill,
        });
    }

    pub fn slide_size(&self) -> (i64, i64) {
        self.slide_size
    }

    pub fn theme(&self) -> &ThemeColors {
        &self.theme
    }

    pub fn font_name(&self) -> &str {
        &self.font
    }

    /// Speaker notes; written only when the template has a notes master.
    pub fn set_notes(&mut self, notes: &str) {
        self.notes = Some(notes.to_string());
    }

    /// Text placed so far, for logs and previews.
    pub fn texts(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter_map(|s| match s {
                Shape::Placeholder { paragraphs, .. } | Shape::TextBox { paragraphs, .. } => Some(
                    paragraphs
                        .iter()
                        .flat_map(|p| p.runs.iter().map(|r| r.text.as_str()))
                        .collect::<Vec<_>>()
                        .join(" "),
                ),
                _ => None,
            })
            .collect()
    }

    fn require(&self, idx: u32) -> Result<LayoutPlaceholder, PptxError> {
        self.layout
            .placeholder(idx)
            .cloned()
            .ok_or_else(|| PptxError::PlaceholderNotFound {
                layout: self.layout.name.clone(),
                idx,
            })
    }

    fn replace(&mut self, shape: Shape) {
        if let Some(slot) = shape.slot() {
            self.shapes.retain(|s| s.slot() != Some(slot));
        }
        self.shapes.push(shape);
    }

    fn default_bounds(&self) -> Bounds {
        let (w, h) = self.slide_size;
        let margin = super::EMU_PER_INCH / 2;
        Bounds::new(margin, 3 * margin, w - 2 * margin, h - 4 * margin)
    }

    /// Renders `p:sld`; `chart_rids[i]` is the relationship of chart `i`.
    fn render(&self, chart_rids: &[String]) -> String {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {NS_DECL}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
        );

        for (i, shape) in self.shapes.iter().enumerate() {
            let id = i + 2;
            match shape {
                Shape::Placeholder { ph, paragraphs } => {
                    xml.push_str(&placeholder_xml(id, ph, paragraphs));
                }
                Shape::TextBox {
                    bounds,
                    paragraphs,
                    fill,
                } => {
                    xml.push_str(&text_box_xml(id, bounds, paragraphs, fill.as_deref()));
                }
                Shape::Table {
                    bounds, table, font, ..
                } => {
                    xml.push_str(&table_xml(id, bounds, table, font));
                }
                Shape::Chart { bounds, chart, .. } => {
                    if let Some(rid) = chart_rids.get(*chart) {
                        xml.push_str(&chart_frame_xml(id, bounds, rid));
                    }
                }
            }
        }

        xml.push_str(r#"</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#);
        xml
    }
}

/// Builds a deck from a template.
#[derive(Debug)]
pub struct DeckWriter {
    package: Package,
    presentation: String,
    layouts: Vec<SlideLayout>,
    slide_size: (i64, i64),
    theme: ThemeColors,
    font: String,
    notes_master: Option<String>,
    slides: Vec<SlideBuilder>,
}

impl DeckWriter {
    /// Starts a deck from the template with all of its slides removed.
    pub fn new(template: &Template) -> Result<Self, PptxError> {
        let mut package = template.package().clone();
        let presentation = presentation_part(&package)?;
        remove_existing_slides(&mut package, &presentation)?;

        Ok(Self {
            package,
            presentation,
            layouts: template.layouts().to_vec(),
            slide_size: (template.slide_width(), template.slide_height()),
            theme: template.properties().theme_colors.clone(),
            font: template.properties().default_font.name.clone(),
            notes_master: template.notes_master_part().map(str::to_string),
            slides: Vec::new(),
        })
    }

    pub fn layout_count(&self) -> usize {
        self.layouts.len()
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Appends a slide using the layout at `layout_index`.
    pub fn add_slide(&mut self, layout_index: usize) -> Result<&mut SlideBuilder, PptxError> {
        let layout = self
            .layouts
            .get(layout_index)
            .cloned()
            .ok_or(PptxError::LayoutOutOfRange {
                index: layout_index,
                count: self.layouts.len(),
            })?;
        self.slides.push(SlideBuilder {
            layout,
            slide_size: self.slide_size,
            theme: self.theme.clone(),
            font: self.font.clone(),
            shapes: Vec::new(),
            charts: Vec::new(),
            notes: None,
        });
        let last = self.slides.len() - 1;
        Ok(&mut self.slides[last])
    }

    /// Drops the most recently added slide (used when filling it failed).
    pub fn discard_last_slide(&mut self) {
        self.slides.pop();
    }

    /// Writes all slides into the package.
    pub fn finish(mut self) -> Result<Package, PptxError> {
        let mut pres_rels = self.package.relationships(&self.presentation)?;
        let mut used_charts: BTreeSet<String> = self
            .package
            .part_names()
            .filter(|n| n.starts_with("ppt/charts/chart"))
            .map(str::to_string)
            .collect();
        let mut chart_counter = 0usize;
        let mut sld_ids = String::from("<p:sldIdLst>");

        let slides = std::mem::take(&mut self.slides);
        for (n, slide) in slides.iter().enumerate() {
            let number = n + 1;
            let slide_part = format!("ppt/slides/slide{number}.xml");

            let mut rels = vec![Relationship {
                id: "rId1".to_string(),
                rel_type: REL_SLIDE_LAYOUT.to_string(),
                target: relative_target(&slide_part, &slide.layout.part_name),
                external: false,
            }];

            let mut chart_rids = Vec::with_capacity(slide.charts.len());
            for chart in &slide.charts {
                let chart_part = loop {
                    chart_counter += 1;
                    let name = format!("ppt/charts/chart{chart_counter}.xml");
                    if used_charts.insert(name.clone()) {
                        break name;
                    }
                };
                self.package
                    .set_part(chart_part.clone(), chart_part_xml(chart, &self.theme.accent1));
                self.package.set_content_type(&chart_part, CT_CHART)?;
                let rid = next_rel_id(&rels);
                rels.push(Relationship {
                    id: rid.clone(),
                    rel_type: REL_CHART.to_string(),
                    target: relative_target(&slide_part, &chart_part),
                    external: false,
                });
                chart_rids.push(rid);
            }

            if let Some(notes) = slide.notes.as_deref() {
                match self.notes_master.as_deref() {
                    Some(master) => {
                        let notes_part = format!("ppt/notesSlides/notesSlide{number}.xml");
                        self.package.set_part(notes_part.clone(), notes_xml(notes));
                        let notes_rels = vec![
                            Relationship {
                                id: "rId1".to_string(),
                                rel_type: REL_NOTES_MASTER.to_string(),
                                target: relative_target(&notes_part, master),
                                external: false,
                            },
                            Relationship {
                                id: "rId2".to_string(),
                                rel_type: REL_SLIDE.to_string(),
                                target: relative_target(&notes_part, &slide_part),
                                external: false,
                            },
                        ];
                        self.package
                            .set_part(rels_path(&notes_part), write_relationships(&notes_rels));
                        self.package.set_content_type(&notes_part, CT_NOTES_SLIDE)?;
                        rels.push(Relationship {
                            id: next_rel_id(&rels),
                            rel_type: REL_NOTES_SLIDE.to_string(),
                            target: relative_target(&slide_part, &notes_part),
                            external: false,
                        });
                    }
                    None => debug!(slide = number, "Template has no notes master; notes skipped"),
                }
            }

            self.package.set_part(slide_part.clone(), slide.render(&chart_rids));
            self.package
                .set_part(rels_path(&slide_part), write_relationships(&rels));
            self.package.set_content_type(&slide_part, CT_SLIDE)?;

            let rid = next_rel_id(&pres_rels);
            pres_rels.push(Relationship {
                id: rid.clone(),
                rel_type: REL_SLIDE.to_string(),
                target: relative_target(&self.presentation, &slide_part),
                external: false,
            });
            sld_ids.push_str(&format!(
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                FIRST_SLIDE_ID as usize + n,
                rid
            ));
        }
        sld_ids.push_str("</p:sldIdLst>");

        self.package.set_part(
            rels_path(&self.presentation),
            write_relationships(&pres_rels),
        );
        let pres_xml = self.package.part_str(&self.presentation)?;
        let pres_xml = replace_slide_id_list(&pres_xml, if slides.is_empty() { "" } else { &sld_ids })
            .ok_or_else(|| PptxError::xml(&self.presentation, "cannot place p:sldIdLst"))?;
        self.package.set_part(self.presentation.clone(), pres_xml);

        debug!(slides = slides.len(), "Deck written");
        Ok(self.package)
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, PptxError> {
        self.finish()?.to_bytes()
    }

    pub fn save(self, path: impl AsRef<Path>) -> Result<(), PptxError> {
        self.finish()?.save(path)
    }
}

/// Removes slides, their rels, notes, charts, ids and content type overrides.
fn remove_existing_slides(package: &mut Package, presentation: &str) -> Result<(), PptxError> {
    let rels = package.relationships(presentation)?;
    let (slide_rels, kept): (Vec<_>, Vec<_>) =
        rels.into_iter().partition(|r| r.rel_type == REL_SLIDE);

    for rel in &slide_rels {
        let slide_part = super::package::resolve_target(presentation, &rel.target);
        for (child, target) in package.resolved_relationships(&slide_part)? {
            if child.rel_type == REL_NOTES_SLIDE || child.rel_type == REL_CHART {
                drop_part(package, &target)?;
            }
        }
        drop_part(package, &slide_part)?;
    }

    if !slide_rels.is_empty() {
        debug!(count = slide_rels.len(), "Removed template slides");
    }
    package.set_part(rels_path(presentation), write_relationships(&kept));

    let xml = package.part_str(presentation)?;
    match replace_slide_id_list(&xml, "") {
        Some(xml) => package.set_part(presentation.to_string(), xml),
        None => warn!("presentation.xml has no slide size; slide list left untouched"),
    }
    Ok(())
}

fn drop_part(package: &mut Package, part: &str) -> Result<(), PptxError> {
    package.remove_part(part);
    package.remove_part(&rels_path(part));
    package.remove_content_type(part)
}

/// Replaces (or inserts before `p:sldSz`) the slide id list.
fn replace_slide_id_list(xml: &str, list: &str) -> Option<String> {
    if let Some((start, end)) = element_span(xml, "p:sldIdLst") {
        let mut out = xml.to_string();
        out.replace_range(start..end, list);
        return Some(out);
    }
    let pos = xml.find("<p:sldSz")?;
    let mut out = xml.to_string();
    out.insert_str(pos, list);
    Some(out)
}

fn xfrm(bounds: &Bounds, ns: &str) -> String {
    format!(
        r#"<{ns}:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></{ns}:xfrm>"#,
        bounds.left,
        bounds.top,
        bounds.width.max(0),
        bounds.height.max(0)
    )
}

fn run_xml(run: &Run) -> String {
    let mut attrs = String::from(r#" lang="en-US" dirty="0""#);
    if let Some(size) = run.style.size_pt {
        attrs.push_str(&format!(r#" sz="{}""#, (size * 100.0).round() as i64));
    }
    if run.style.bold {
        attrs.push_str(r#" b="1""#);
    }
    if run.style.italic {
        attrs.push_str(r#" i="1""#);
    }
    let mut children = String::new();
    if let Some(color) = &run.style.color {
        children.push_str(&format!(
            r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
            escape(color)
        ));
    }
    if let Some(font) = &run.style.font {
        children.push_str(&format!(r#"<a:latin typeface="{}"/>"#, escape(font)));
    }
    let rpr = if children.is_empty() {
        format!("<a:rPr{attrs}/>")
    } else {
        format!("<a:rPr{attrs}>{children}</a:rPr>")
    };
    format!("<a:r>{rpr}<a:t>{}</a:t></a:r>", escape(&run.text))
}

fn paragraphs_xml(paragraphs: &[Paragraph]) -> String {
    if paragraphs.is_empty() {
        return "<a:p/>".to_string();
    }
    paragraphs
        .iter()
        .map(|p| {
            let centered = p.runs.first().is_some_and(|r| r.style.centered);
            let ppr = match (p.level, centered) {
                (0, false) => String::new(),
                (0, true) => r#"<a:pPr algn="ctr"/>"#.to_string(),
                (lvl, false) => format!(r#"<a:pPr lvl="{lvl}"/>"#),
                (lvl, true) => format!(r#"<a:pPr lvl="{lvl}" algn="ctr"/>"#),
            };
            let runs: String = p.runs.iter().map(run_xml).collect();
            format!("<a:p>{ppr}{runs}</a:p>")
        })
        .collect()
}

fn placeholder_xml(id: usize, ph: &LayoutPlaceholder, paragraphs: &[Paragraph]) -> String {
    let mut ph_attrs = String::new();
    if ph.kind != PlaceholderKind::Obj {
        ph_attrs.push_str(&format!(r#" type="{}""#, ph.kind.as_str()));
    }
    if ph.idx != 0 {
        ph_attrs.push_str(&format!(r#" idx="{}""#, ph.idx));
    }
    let name = if ph.name.is_empty() {
        format!("Placeholder {id}")
    } else {
        ph.name.clone()
    };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph{ph_attrs}/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr><a:normAutofit/></a:bodyPr><a:lstStyle/>{}</p:txBody></p:sp>"#,
        escape(&name),
        paragraphs_xml(paragraphs)
    )
}

fn text_box_xml(id: usize, bounds: &Bounds, paragraphs: &[Paragraph], fill: Option<&str>) -> String {
    let (nv, geometry, body) = match fill {
        Some(color) => (
            format!(r#"<p:cNvPr id="{id}" name="Card {id}"/><p:cNvSpPr/>"#),
            format!(
                r#"<a:prstGeom prst="roundRect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:ln w="12700"><a:solidFill><a:srgbClr val="C8C8C8"/></a:solidFill></a:ln>"#,
                escape(color)
            ),
            r#"<a:bodyPr wrap="square" rtlCol="0" anchor="ctr"><a:normAutofit/></a:bodyPr>"#,
        ),
        None => (
            format!(r#"<p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/>"#),
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#.to_string(),
            r#"<a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr>"#,
        ),
    };
    format!(
        r#"<p:sp><p:nvSpPr>{nv}<p:nvPr/></p:nvSpPr><p:spPr>{}{geometry}</p:spPr><p:txBody>{body}<a:lstStyle/>{}</p:txBody></p:sp>"#,
        xfrm(bounds, "a"),
        paragraphs_xml(paragraphs)
    )
}

/// Column widths proportional to the longest text in each column, each at
/// least 10% of the table, summing exactly to `total`.
pub fn column_widths(table: &TableData, total: i64) -> Vec<i64> {
    let cols = table.column_count();
    if cols == 0 {
        return Vec::new();
    }
    let lengths: Vec<f64> = (0..cols)
        .map(|c| {
            let header = table.headers[c].chars().count();
            let body = table
                .rows
                .iter()
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0);
            header.max(body).max(1) as f64
        })
        .collect();
    let sum: f64 = lengths.iter().sum();
    let shares: Vec<f64> = lengths.iter().map(|l| (l / sum).max(0.1)).collect();
    let share_sum: f64 = shares.iter().sum();

    let mut widths: Vec<i64> = shares
        .iter()
        .map(|s| (total as f64 * s / share_sum).floor() as i64)
        .collect();
    let assigned: i64 = widths.iter().sum();
    if let Some(last) = widths.last_mut() {
        *last += total - assigned;
    }
    widths
}

fn table_xml(id: usize, bounds: &Bounds, table: &TableData, font: &str) -> String {
    let rows = table.rows.len() + 1;
    let row_h = (bounds.height / rows as i64).max(1);
    let grid: String = column_widths(table, bounds.width)
        .iter()
        .map(|w| format!(r#"<a:gridCol w="{w}"/>"#))
        .collect();

    let cell = |text: &str, bold: bool| {
        let style = TextStyle {
            bold,
            font: Some(font.to_string()),
            ..TextStyle::default()
        };
        format!(
            r#"<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p>{}</a:p></a:txBody><a:tcPr/></a:tc>"#,
            run_xml(&Run {
                text: text.to_string(),
                style,
            })
        )
    };

    let mut body = format!(r#"<a:tr h="{row_h}">"#);
    for header in &table.headers {
        body.push_str(&cell(header, true));
    }
    body.push_str("</a:tr>");
    for row in &table.rows {
        body.push_str(&format!(r#"<a:tr h="{row_h}">"#));
        for value in row {
            body.push_str(&cell(value, false));
        }
        body.push_str("</a:tr>");
    }

    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Table {id}"/><p:cNvGraphicFramePr><a:graphicFrameLocks noGrp="1"/></p:cNvGraphicFramePr><p:nvPr/></p:nvGraphicFramePr>{}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr firstRow="1" bandRow="1"/><a:tblGrid>{grid}</a:tblGrid>{body}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        xfrm(bounds, "p")
    )
}

fn chart_frame_xml(id: usize, bounds: &Bounds, rid: &str) -> String {
    format!(
        r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{id}" name="Chart {id}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr>{}<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{rid}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
        xfrm(bounds, "p")
    )
}

fn notes_xml(notes: &str) -> String {
    let paragraphs: String = notes
        .lines()
        .map(|line| format!(r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#, escape(line)))
        .collect();
    let paragraphs = if paragraphs.is_empty() {
        "<a:p/>".to_string()
    } else {
        paragraphs
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:notes {NS_DECL}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/><p:sp><p:nvSpPr><p:cNvPr id="2" name="Slide Image Placeholder 1"/><p:cNvSpPr><a:spLocks noGrp="1" noRot="1" noChangeAspect="1"/></p:cNvSpPr><p:nvPr><p:ph type="sldImg"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Notes Placeholder 2"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp></p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_widths_floor_and_sum() {
        let table = TableData {
            headers: vec!["A".into(), "A much longer header text here".into(), "C".into()],
            rows: vec![vec!["1".into(), "x".into(), "2".into()]],
        };
        let widths = column_widths(&table, 9_000_000);
        assert_eq!(widths.iter().sum::<i64>(), 9_000_000);
        // Short columns are floored at roughly 10% of the table.
        assert!(widths[0] >= 700_000);
        assert!(widths[1] > widths[0] * 5);
    }

    #[test]
    fn test_replace_slide_id_list() {
        let xml = r#"<p:presentation><p:sldMasterIdLst/><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="1" cy="2"/></p:presentation>"#;
        let out = replace_slide_id_list(xml, "").unwrap();
        assert!(!out.contains("sldIdLst"));
        let out = replace_slide_id_list(&out, "<p:sldIdLst>X</p:sldIdLst>").unwrap();
        assert!(out.contains("<p:sldIdLst>X</p:sldIdLst><p:sldSz"));
    }

    #[test]
    fn test_inline_spans() {
        let spans = inline_spans("Revenue **up 12%** in *Q4* * alone");
        let texts: Vec<(&str, bool, bool)> = spans
            .iter()
            .map(|s| (s.text.as_str(), s.bold, s.italic))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("Revenue ", false, false),
                ("up 12%", true, false),
                (" in ", false, false),
                ("Q4", false, true),
                (" * alone", false, false),
            ]
        );
        assert!(inline_spans("").is_empty());
    }

    #[test]
    fn test_card_xml_has_fill() {
        let p = Paragraph::formatted("Key *point*", 0, &TextStyle::default().centered());
        let xml = text_box_xml(4, &Bounds::inches(1.0, 1.0, 2.0, 1.0), &[p], Some("F0F0F0"));
        assert!(xml.contains(r#"prst="roundRect""#));
        assert!(xml.contains(r#"<a:srgbClr val="F0F0F0"/>"#));
        assert!(xml.contains(r#"i="1""#));
    }

    #[test]
    fn test_run_xml_escapes_and_styles() {
        let run = Run {
            text: "P&L < 5".into(),
            style: TextStyle::sized(24.0).bold().color("4472C4"),
        };
        let xml = run_xml(&run);
        assert!(xml.contains(r#"sz="2400""#));
        assert!(xml.contains(r#"b="1""#));
        assert!(xml.contains("P&amp;L &lt; 5"));
        assert!(xml.contains(r#"<a:srgbClr val="4472C4"/>"#));
    }
}
