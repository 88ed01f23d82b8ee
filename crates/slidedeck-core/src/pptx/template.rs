//! Template parsing: slide master, ordered layouts and their placeholders.

use std::fmt;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::package::{Package, REL_NOTES_MASTER, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER};
use super::properties::TemplateProperties;
use super::xml::{attr, attr_i64};
use super::{PptxError, EMU_PER_INCH};

/// Default slide size (10 x 7.5 in).
pub const DEFAULT_SLIDE_WIDTH: i64 = 9_144_000;
pub const DEFAULT_SLIDE_HEIGHT: i64 = 6_858_000;

/// OOXML `ST_PlaceholderType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderKind {
    Title,
    Body,
    CtrTitle,
    SubTitle,
    Dt,
    SldNum,
    Ftr,
    Hdr,
    Obj,
    Chart,
    Tbl,
    ClipArt,
    Dgm,
    Media,
    SldImg,
    Pic,
}

impl PlaceholderKind {
    /// Parses a `type` attribute; a missing attribute means `obj`.
    pub fn from_ooxml(value: Option<&str>) -> Self {
        match value.unwrap_or("obj") {
            "title" => Self::Title,
            "body" => Self::Body,
            "ctrTitle" => Self::CtrTitle,
            "subTitle" => Self::SubTitle,
            "dt" => Self::Dt,
            "sldNum" => Self::SldNum,
            "ftr" => Self::Ftr,
            "hdr" => Self::Hdr,
            "chart" => Self::Chart,
            "tbl" => Self::Tbl,
            "clipArt" => Self::ClipArt,
            "dgm" => Self::Dgm,
            "media" => Self::Media,
            "sldImg" => Self::SldImg,
            "pic" => Self::Pic,
            _ => Self::Obj,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Body => "body",
            Self::CtrTitle => "ctrTitle",
            Self::SubTitle => "subTitle",
            Self::Dt => "dt",
            Self::SldNum => "sldNum",
            Self::Ftr => "ftr",
            Self::Hdr => "hdr",
            Self::Obj => "obj",
            Self::Chart => "chart",
            Self::Tbl => "tbl",
            Self::ClipArt => "clipArt",
            Self::Dgm => "dgm",
            Self::Media => "media",
            Self::SldImg => "sldImg",
            Self::Pic => "pic",
        }
    }

    pub fn is_title(&self) -> bool {
        matches!(self, Self::Title | Self::CtrTitle)
    }

    /// Date, footer, slide number and header placeholders.
    pub fn is_footer(&self) -> bool {
        matches!(self, Self::Dt | Self::Ftr | Self::SldNum | Self::Hdr)
    }

    /// Placeholders that hold body text.
    pub fn is_text_body(&self) -> bool {
        matches!(self, Self::Body | Self::Obj)
    }

    /// Master placeholder this kind inherits geometry from.
    fn family(&self) -> Self {
        match self {
            Self::Title | Self::CtrTitle => Self::Title,
            Self::Dt => Self::Dt,
            Self::Ftr => Self::Ftr,
            Self::SldNum => Self::SldNum,
            Self::Hdr => Self::Hdr,
            _ => Self::Body,
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position and size in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i64,
    pub top: i64,
    pub width: i64,
    pub height: i64,
}

impl Bounds {
    pub fn new(left: i64, top: i64, width: i64, height: i64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Bounds given in inches.
    pub fn inches(left: f64, top: f64, width: f64, height: f64) -> Self {
        let emu = |v: f64| (v * EMU_PER_INCH as f64).round() as i64;
        Self::new(emu(left), emu(top), emu(width), emu(height))
    }

    pub fn left_in(&self) -> f64 {
        self.left as f64 / EMU_PER_INCH as f64
    }

    pub fn top_in(&self) -> f64 {
        self.top as f64 / EMU_PER_INCH as f64
    }

    pub fn width_in(&self) -> f64 {
        self.width as f64 / EMU_PER_INCH as f64
    }

    pub fn height_in(&self) -> f64 {
        self.height as f64 / EMU_PER_INCH as f64
    }

    pub fn area_in(&self) -> f64 {
        self.width_in() * self.height_in()
    }
}

/// A placeholder declared by a layout (or the master).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutPlaceholder {
    pub idx: u32,
    pub kind: PlaceholderKind,
    pub name: String,
    /// Bounds after inheritance; `None` when neither layout nor master set them.
    pub bounds: Option<Bounds>,
}

/// A slide layout of the template's first master.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideLayout {
    /// Position in the master's layout list.
    pub index: usize,
    pub name: String,
    pub part_name: String,
    pub placeholders: Vec<LayoutPlaceholder>,
}

impl SlideLayout {
    pub fn placeholder(&self, idx: u32) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.idx == idx)
    }

    /// The title (or centre title) placeholder.
    pub fn title_placeholder(&self) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.kind.is_title())
    }
}

/// A parsed presentation template.
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    name: String,
    slide_width: i64,
    slide_height: i64,
    master_part: String,
    notes_master_part: Option<String>,
    layouts: Vec<SlideLayout>,
    properties: TemplateProperties,
}

impl Template {
    /// Opens a template from a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PptxError> {
        let path = path.as_ref();
        let package = Package::open(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "template".to_string());
        Self::from_package(package, name)
    }

    /// Parses a template from `.pptx` bytes.
    pub fn from_bytes(bytes: &[u8], name: impl Into<String>) -> Result<Self, PptxError> {
        Self::from_package(Package::from_bytes(bytes)?, name.into())
    }

    fn from_package(package: Package, name: String) -> Result<Self, PptxError> {
        let presentation = presentation_part(&package)?;
        let pres_xml = package.part_str(&presentation)?;
        let (slide_width, slide_height) = parse_slide_size(&presentation, &pres_xml)?;

        let pres_rels = package.resolved_relationships(&presentation)?;
        let master_ids = parse_id_list(&presentation, &pres_xml, b"sldMasterId")?;
        let master_part = master_ids
            .iter()
            .find_map(|rid| {
                pres_rels
                    .iter()
                    .find(|(r, _)| &r.id == rid && r.rel_type == REL_SLIDE_MASTER)
                    .map(|(_, target)| target.clone())
            })
            .or_else(|| {
                pres_rels
                    .iter()
                    .find(|(r, _)| r.rel_type == REL_SLIDE_MASTER)
                    .map(|(_, target)| target.clone())
            })
            .ok_or_else(|| PptxError::InvalidPackage("no slide master".to_string()))?;

        let notes_master_part = pres_rels
            .iter()
            .find(|(r, _)| r.rel_type == REL_NOTES_MASTER)
            .map(|(_, target)| target.clone())
            .filter(|part| package.contains(part));

        let master_xml = package.part_str(&master_part)?;
        let master_placeholders = parse_placeholders(&master_part, &master_xml)?;

        let master_rels = package.resolved_relationships(&master_part)?;
        let layout_ids = parse_id_list(&master_part, &master_xml, b"sldLayoutId")?;
        let mut layout_parts: Vec<String> = layout_ids
            .iter()
            .filter_map(|rid| {
                master_rels
                    .iter()
                    .find(|(r, _)| &r.id == rid && r.rel_type == REL_SLIDE_LAYOUT)
                    .map(|(_, target)| target.clone())
            })
            .collect();
        if layout_parts.is_empty() {
            layout_parts = master_rels
                .iter()
                .filter(|(r, _)| r.rel_type == REL_SLIDE_LAYOUT)
                .map(|(_, target)| target.clone())
                .collect();
        }

        let mut layouts = Vec::with_capacity(layout_parts.len());
        for (index, part) in layout_parts.into_iter().enumerate() {
            let xml = package.part_str(&part)?;
            let mut placeholders = parse_placeholders(&part, &xml)?;
            inherit_bounds(&mut placeholders, &master_placeholders);
            let name = parse_layout_name(&part, &xml)?.unwrap_or_else(|| format!("Layout {index}"));
            debug!(index, name = %name, placeholders = placeholders.len(), "Parsed layout");
            layouts.push(SlideLayout {
                index,
                name,
                part_name: part,
                placeholders,
            });
        }

        let properties = TemplateProperties::extract(
            &package,
            &master_part,
            &layouts,
            (slide_width, slide_height),
        )?;

        Ok(Self {
            package,
            name,
            slide_width,
            slide_height,
            master_part,
            notes_master_part,
            layouts,
            properties,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn slide_width(&self) -> i64 {
        self.slide_width
    }

    pub fn slide_height(&self) -> i64 {
        self.slide_height
    }

    /// Slide size in inches.
    pub fn slide_size_in(&self) -> (f64, f64) {
        (
            self.slide_width as f64 / EMU_PER_INCH as f64,
            self.slide_height as f64 / EMU_PER_INCH as f64,
        )
    }

    pub fn master_part(&self) -> &str {
        &self.master_part
    }

    pub fn notes_master_part(&self) -> Option<&str> {
        self.notes_master_part.as_deref()
    }

    pub fn layouts(&self) -> &[SlideLayout] {
        &self.layouts
    }

    pub fn layout(&self, index: usize) -> Option<&SlideLayout> {
        self.layouts.get(index)
    }

    pub fn properties(&self) -> &TemplateProperties {
        &self.properties
    }
}

/// The main presentation part named by the package root rels.
pub(crate) fn presentation_part(package: &Package) -> Result<String, PptxError> {
    let rels = package.resolved_relationships("")?;
    Ok(rels
        .into_iter()
        .find(|(r, _)| r.rel_type == super::package::REL_OFFICE_DOCUMENT)
        .map(|(_, target)| target)
        .unwrap_or_else(|| "ppt/presentation.xml".to_string()))
}

fn parse_slide_size(part: &str, xml: &str) -> Result<(i64, i64), PptxError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"sldSz" =>
            {
                let cx = attr_i64(e, b"cx").unwrap_or(DEFAULT_SLIDE_WIDTH);
                let cy = attr_i64(e, b"cy").unwrap_or(DEFAULT_SLIDE_HEIGHT);
                return Ok((cx, cy));
            }
            Ok(Event::Eof) => return Ok((DEFAULT_SLIDE_WIDTH, DEFAULT_SLIDE_HEIGHT)),
            Err(e) => return Err(PptxError::xml(part, e)),
            _ => {}
        }
    }
}

/// Relationship ids of an id list (`sldMasterId`, `sldLayoutId`, `sldId`), in order.
pub(crate) fn parse_id_list(part: &str, xml: &str, element: &[u8]) -> Result<Vec<String>, PptxError> {
    let mut reader = Reader::from_str(xml);
    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == element =>
            {
                // `r:id`; local name is `id`, which also matches the numeric id.
                for a in e.attributes().flatten() {
                    if a.key.as_ref().ends_with(b":id") {
                        ids.push(String::from_utf8_lossy(&a.value).into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(PptxError::xml(part, e)),
            _ => {}
        }
    }
    Ok(ids)
}

fn parse_layout_name(part: &str, xml: &str) -> Result<Option<String>, PptxError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e))
                if e.local_name().as_ref() == b"cSld" =>
            {
                return Ok(attr(e, b"name").filter(|n| !n.is_empty()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => return Err(PptxError::xml(part, e)),
            _ => {}
        }
    }
}

#[derive(Default)]
struct ShapeState {
    depth: usize,
    name: String,
    ph: Option<(Option<String>, Option<u32>)>,
    bounds: Option<Bounds>,
    in_xfrm: bool,
    off: Option<(i64, i64)>,
}

/// Placeholders (`sp`, `pic`, `graphicFrame` with `p:ph`) of a layout or master part.
///
/// Shapes nested in groups are ignored since their coordinates are in
/// group space.
pub(crate) fn parse_placeholders(part: &str, xml: &str) -> Result<Vec<LayoutPlaceholder>, PptxError> {
    let mut reader = Reader::from_str(xml);
    let mut placeholders = Vec::new();
    let mut shape: Option<ShapeState> = None;
    let mut group_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| PptxError::xml(part, e))?;
        match event {
            Event::Start(ref e) => {
                if let Some(state) = shape.as_mut() {
                    state.depth += 1;
                    on_shape_element(state, e);
                } else {
                    match e.local_name().as_ref() {
                        b"grpSp" => group_depth += 1,
                        b"sp" | b"pic" | b"graphicFrame" if group_depth == 0 => {
                            shape = Some(ShapeState {
                                depth: 1,
                                ..ShapeState::default()
                            });
                        }
                        _ => {}
                    }
                }
            }
            Event::Empty(ref e) => {
                if let Some(state) = shape.as_mut() {
                    on_shape_element(state, e);
                }
            }
            Event::End(ref e) => {
                let closed = match shape.as_mut() {
                    Some(state) => {
                        if e.local_name().as_ref() == b"xfrm" {
                            state.in_xfrm = false;
                        }
                        state.depth -= 1;
                        state.depth == 0
                    }
                    None => {
                        if e.local_name().as_ref() == b"grpSp" {
                            group_depth = group_depth.saturating_sub(1);
                        }
                        false
                    }
                };
                if closed {
                    if let Some(ShapeState {
                        name,
                        ph: Some((kind, idx)),
                        bounds,
                        ..
                    }) = shape.take()
                    {
                        placeholders.push(LayoutPlaceholder {
                            idx: idx.unwrap_or(0),
                            kind: PlaceholderKind::from_ooxml(kind.as_deref()),
                            name,
                            bounds,
                        });
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(placeholders)
}

fn on_shape_element(state: &mut ShapeState, e: &quick_xml::events::BytesStart<'_>) {
    match e.local_name().as_ref() {
        b"cNvPr" if state.name.is_empty() => {
            state.name = attr(e, b"name").unwrap_or_default();
        }
        b"ph" => {
            let kind = attr(e, b"type");
            let idx = attr_i64(e, b"idx").and_then(|v| u32::try_from(v).ok());
            state.ph = Some((kind, idx));
        }
        b"xfrm" if state.bounds.is_none() => state.in_xfrm = true,
        b"off" if state.in_xfrm => {
            state.off = Some((attr_i64(e, b"x").unwrap_or(0), attr_i64(e, b"y").unwrap_or(0)));
        }
        b"ext" if state.in_xfrm => {
            if let (Some((x, y)), Some(cx), Some(cy)) =
                (state.off, attr_i64(e, b"cx"), attr_i64(e, b"cy"))
            {
                state.bounds = Some(Bounds::new(x, y, cx, cy));
            }
        }
        _ => {}
    }
}

/// Fills missing layout bounds from the master placeholder of the same family.
fn inherit_bounds(placeholders: &mut [LayoutPlaceholder], master: &[LayoutPlaceholder]) {
    for ph in placeholders.iter_mut().filter(|p| p.bounds.is_none()) {
        let family = ph.kind.family();
        ph.bounds = master
            .iter()
            .find(|m| m.kind.family() == family && m.bounds.is_some())
            .and_then(|m| m.bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUT: &str = r#"<p:sldLayout xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld name="Two &amp; More"><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>
<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="3" name="Content 2"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr>
<p:spPr><a:xfrm><a:off x="457200" y="1600200"/><a:ext cx="4038600" cy="4525963"/></a:xfrm></p:spPr>
<p:txBody><a:bodyPr/><a:p><a:r><a:t>x</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:nvSpPr><p:cNvPr id="4" name="Decoration"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/></p:sp>
<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Chart 4"/><p:cNvGraphicFramePr/><p:nvPr><p:ph type="chart" idx="2"/></p:nvPr></p:nvGraphicFramePr>
<p:xfrm><a:off x="1" y="2"/><a:ext cx="3" cy="4"/></p:xfrm></p:graphicFrame>
</p:spTree></p:cSld></p:sldLayout>"#;

    #[test]
    fn test_parse_layout_placeholders() {
        let phs = parse_placeholders("layout.xml", LAYOUT).unwrap();
        assert_eq!(phs.len(), 3);
        assert_eq!(phs[0].kind, PlaceholderKind::Title);
        assert_eq!(phs[0].idx, 0);
        assert!(phs[0].bounds.is_none());
        assert_eq!(phs[1].kind, PlaceholderKind::Obj);
        assert_eq!(phs[1].bounds, Some(Bounds::new(457200, 1600200, 4038600, 4525963)));
        assert_eq!(phs[2].kind, PlaceholderKind::Chart);
        assert_eq!(phs[2].bounds, Some(Bounds::new(1, 2, 3, 4)));
    }

    #[test]
    fn test_layout_name_unescaped() {
        assert_eq!(
            parse_layout_name("l", LAYOUT).unwrap().as_deref(),
            Some("Two & More")
        );
    }

    #[test]
    fn test_inherit_bounds_by_family() {
        let mut phs = parse_placeholders("layout.xml", LAYOUT).unwrap();
        let master = vec![LayoutPlaceholder {
            idx: 0,
            kind: PlaceholderKind::Title,
            name: "Title".into(),
            bounds: Some(Bounds::inches(0.5, 0.3, 9.0, 1.25)),
        }];
        inherit_bounds(&mut phs, &master);
        assert_eq!(phs[0].bounds, master[0].bounds);
    }

    #[test]
    fn test_missing_type_is_obj() {
        assert_eq!(PlaceholderKind::from_ooxml(None), PlaceholderKind::Obj);
        assert_eq!(PlaceholderKind::from_ooxml(Some("subTitle")), PlaceholderKind::SubTitle);
        assert!(PlaceholderKind::CtrTitle.is_title());
        assert!(PlaceholderKind::SldNum.is_footer());
    }
}
