//! A built-in 4:3 template with twelve layouts.
//!
//! Used when a configured template file is missing, and by tests that need a
//! template without fixtures on disk.

use super::package::{
    write_relationships, Package, Relationship, REL_NOTES_MASTER, REL_OFFICE_DOCUMENT,
    REL_SLIDE_LAYOUT, REL_SLIDE_MASTER, REL_THEME,
};
use super::template::Bounds;
use super::xml::escape;
use super::PptxError;

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const CLR_MAP: &str = r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#;
const REL_PRES_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/presProps";
const REL_TABLE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/tableStyles";

/// Name of the built-in template.
pub const BUILTIN_TEMPLATE_NAME: &str = "Built-in";

struct Ph {
    kind: Option<&'static str>,
    idx: u32,
    name: &'static str,
    at: Option<(f64, f64, f64, f64)>,
}

const fn ph(
    kind: Option<&'static str>,
    idx: u32,
    name: &'static str,
    at: Option<(f64, f64, f64, f64)>,
) -> Ph {
    Ph {
        kind,
        idx,
        name,
        at,
    }
}

const TITLE: Ph = ph(Some("title"), 0, "Title 1", None);

fn layouts() -> Vec<(&'static str, Vec<Ph>)> {
    vec![
        (
            "Title Slide",
            vec![
                ph(Some("ctrTitle"), 0, "Title 1", Some((0.75, 2.33, 8.5, 1.6))),
                ph(Some("subTitle"), 1, "Subtitle 2", Some((1.5, 4.25, 7.0, 1.75))),
                ph(Some("dt"), 10, "Date Placeholder 3", None),
                ph(Some("ftr"), 11, "Footer Placeholder 4", None),
                ph(Some("sldNum"), 12, "Slide Number Placeholder 5", None),
            ],
        ),
        (
            "Title and Content",
            vec![TITLE, ph(None, 1, "Content Placeholder 2", Some((0.5, 1.75, 9.0, 4.95)))],
        ),
        (
            "Two Content",
            vec![
                TITLE,
                ph(None, 1, "Content Placeholder 2", Some((0.5, 1.75, 4.4, 4.95))),
                ph(None, 2, "Content Placeholder 3", Some((5.1, 1.75, 4.4, 4.95))),
            ],
        ),
        (
            "Comparison",
            vec![
                TITLE,
                ph(Some("body"), 1, "Text Placeholder 2", Some((0.5, 1.6, 4.4, 0.6))),
                ph(None, 2, "Content Placeholder 3", Some((0.5, 2.3, 4.4, 4.2))),
                ph(Some("body"), 3, "Text Placeholder 4", Some((5.1, 1.6, 4.4, 0.6))),
                ph(None, 4, "Content Placeholder 5", Some((5.1, 2.3, 4.4, 4.2))),
            ],
        ),
        ("Title Only", vec![TITLE]),
        ("Blank", vec![]),
        (
            "Content with Caption",
            vec![
                ph(Some("title"), 0, "Title 1", Some((0.5, 0.3, 3.2, 1.3))),
                ph(None, 1, "Content Placeholder 2", Some((4.0, 0.6, 5.5, 6.0))),
                ph(Some("body"), 2, "Text Placeholder 3", Some((0.5, 1.75, 3.2, 4.5))),
            ],
        ),
        (
            "Picture with Caption",
            vec![
                TITLE,
                ph(Some("pic"), 1, "Picture Placeholder 2", Some((0.5, 1.6, 5.5, 4.9))),
                ph(Some("body"), 2, "Text Placeholder 3", Some((6.2, 1.6, 3.3, 4.9))),
            ],
        ),
        (
            "Four Metrics",
            vec![
                TITLE,
                ph(Some("body"), 1, "Metric 1", Some((1.5, 2.2, 2.5, 1.1))),
                ph(Some("body"), 2, "Metric 2", Some((6.0, 2.2, 2.5, 1.1))),
                ph(Some("body"), 3, "Metric 3", Some((1.5, 4.2, 2.5, 1.1))),
                ph(Some("body"), 4, "Metric 4", Some((6.0, 4.2, 2.5, 1.1))),
            ],
        ),
        (
            "Chart",
            vec![TITLE, ph(Some("chart"), 1, "Chart Placeholder 2", Some((0.5, 1.6, 9.0, 5.1)))],
        ),
        (
            "Table",
            vec![TITLE, ph(Some("tbl"), 1, "Table Placeholder 2", Some((0.5, 1.6, 9.0, 5.1)))],
        ),
        (
            "Three Columns",
            vec![
                TITLE,
                ph(Some("body"), 1, "Heading 1", Some((0.5, 1.6, 2.8, 0.45))),
                ph(None, 2, "Column 1", Some((0.5, 2.2, 2.8, 4.3))),
                ph(Some("body"), 3, "Heading 2", Some((3.6, 1.6, 2.8, 0.45))),
                ph(None, 4, "Column 2", Some((3.6, 2.2, 2.8, 4.3))),
                ph(Some("body"), 5, "Heading 3", Some((6.7, 1.6, 2.8, 0.45))),
                ph(None, 6, "Column 3", Some((6.7, 2.2, 2.8, 4.3))),
            ],
        ),
    ]
}

/// Builds the template as `.pptx` bytes.
pub fn blank_template() -> Result<Vec<u8>, PptxError> {
    blank_package().to_bytes()
}

/// Builds the template package.
pub fn blank_package() -> Package {
    let layouts = layouts();
    let mut package = Package::default();

    package.set_part("[Content_Types].xml", content_types(layouts.len()));
    package.set_part(
        "_rels/.rels",
        write_relationships(&[rel(1, REL_OFFICE_DOCUMENT, "ppt/presentation.xml")]),
    );

    package.set_part("ppt/presentation.xml", presentation_xml());
    package.set_part(
        "ppt/_rels/presentation.xml.rels",
        write_relationships(&[
            rel(1, REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            rel(2, REL_NOTES_MASTER, "notesMasters/notesMaster1.xml"),
            rel(3, REL_THEME, "theme/theme1.xml"),
            rel(4, REL_PRES_PROPS, "presProps.xml"),
            rel(5, REL_TABLE_STYLES, "tableStyles.xml"),
        ]),
    );
    package.set_part(
        "ppt/presProps.xml",
        format!(r#"{XML_DECL}<p:presentationPr {NS}/>"#),
    );
    package.set_part(
        "ppt/tableStyles.xml",
        format!(
            r#"{XML_DECL}<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#
        ),
    );
    package.set_part("ppt/theme/theme1.xml", theme_xml("Office Theme"));
    package.set_part("ppt/theme/theme2.xml", theme_xml("Notes Theme"));

    package.set_part("ppt/slideMasters/slideMaster1.xml", master_xml(layouts.len()));
    let mut master_rels: Vec<Relationship> = (1..=layouts.len())
        .map(|i| {
            rel(
                i,
                REL_SLIDE_LAYOUT,
                &format!("../slideLayouts/slideLayout{i}.xml"),
            )
        })
        .collect();
    master_rels.push(rel(layouts.len() + 1, REL_THEME, "../theme/theme1.xml"));
    package.set_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        write_relationships(&master_rels),
    );

    for (i, (name, placeholders)) in layouts.iter().enumerate() {
        let n = i + 1;
        package.set_part(
            format!("ppt/slideLayouts/slideLayout{n}.xml"),
            layout_xml(name, placeholders),
        );
        package.set_part(
            format!("ppt/slideLayouts/_rels/slideLayout{n}.xml.rels"),
            write_relationships(&[rel(
                1,
                REL_SLIDE_MASTER,
                "../slideMasters/slideMaster1.xml",
            )]),
        );
    }

    package.set_part("ppt/notesMasters/notesMaster1.xml", notes_master_xml());
    package.set_part(
        "ppt/notesMasters/_rels/notesMaster1.xml.rels",
        write_relationships(&[rel(1, REL_THEME, "../theme/theme2.xml")]),
    );

    package
}

fn rel(n: usize, rel_type: &str, target: &str) -> Relationship {
    Relationship {
        id: format!("rId{n}"),
        rel_type: rel_type.to_string(),
        target: target.to_string(),
        external: false,
    }
}

fn content_types(layout_count: usize) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#
    );
    let overrides = [
        ("/ppt/presentation.xml", "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"),
        ("/ppt/notesMasters/notesMaster1.xml", "application/vnd.openxmlformats-officedocument.presentationml.notesMaster+xml"),
        ("/ppt/theme/theme1.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
        ("/ppt/theme/theme2.xml", "application/vnd.openxmlformats-officedocument.theme+xml"),
        ("/ppt/presProps.xml", "application/vnd.openxmlformats-officedocument.presentationml.presProps+xml"),
        ("/ppt/tableStyles.xml", "application/vnd.openxmlformats-officedocument.presentationml.tableStyles+xml"),
    ];
    for (part, ct) in overrides {
        xml.push_str(&format!(r#"<Override PartName="{part}" ContentType="{ct}"/>"#));
    }
    for n in 1..=layout_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slideLayouts/slideLayout{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn presentation_xml() -> String {
    format!(
        r#"{XML_DECL}<p:presentation {NS} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:notesMasterIdLst><p:notesMasterId r:id="rId2"/></p:notesMasterIdLst><p:sldSz cx="9144000" cy="6858000" type="screen4x3"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#
    )
}

fn sp_tree_open() -> &'static str {
    r#"<p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
}

fn placeholder_sp(id: usize, p: &Ph) -> String {
    let mut ph_attrs = String::new();
    if let Some(kind) = p.kind {
        ph_attrs.push_str(&format!(r#" type="{kind}""#));
    }
    if p.idx != 0 {
        ph_attrs.push_str(&format!(r#" idx="{}""#, p.idx));
    }
    let sp_pr = match p.at {
        Some((l, t, w, h)) => {
            let b = Bounds::inches(l, t, w, h);
            format!(
                r#"<p:spPr><a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm></p:spPr>"#,
                b.left, b.top, b.width, b.height
            )
        }
        None => "<p:spPr/>".to_string(),
    };
    let prompt = match p.kind {
        Some("title") | Some("ctrTitle") => "Click to edit title",
        Some("subTitle") => "Click to edit subtitle",
        Some("dt") | Some("ftr") | Some("sldNum") => "",
        _ => "Click to add text",
    };
    let body = if prompt.is_empty() {
        "<a:p/>".to_string()
    } else {
        format!(
            r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#,
            escape(prompt)
        )
    };
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph{ph_attrs}/></p:nvPr></p:nvSpPr>{sp_pr}<p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#,
        escape(p.name)
    )
}

fn layout_xml(name: &str, placeholders: &[Ph]) -> String {
    let shapes: String = placeholders
        .iter()
        .enumerate()
        .map(|(i, p)| placeholder_sp(i + 2, p))
        .collect();
    format!(
        r#"{XML_DECL}<p:sldLayout {NS} preserve="1"><p:cSld name="{}">{}{shapes}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#,
        escape(name),
        sp_tree_open()
    )
}

fn master_xml(layout_count: usize) -> String {
    let master_phs = [
        ph(Some("title"), 0, "Title Placeholder 1", Some((0.5, 0.3, 9.0, 1.25))),
        ph(Some("body"), 1, "Text Placeholder 2", Some((0.5, 1.75, 9.0, 4.95))),
        ph(Some("dt"), 2, "Date Placeholder 3", Some((0.5, 6.95, 2.33, 0.4))),
        ph(Some("ftr"), 3, "Footer Placeholder 4", Some((3.42, 6.95, 3.17, 0.4))),
        ph(Some("sldNum"), 4, "Slide Number Placeholder 5", Some((7.17, 6.95, 2.33, 0.4))),
    ];
    let shapes: String = master_phs
        .iter()
        .enumerate()
        .map(|(i, p)| placeholder_sp(i + 2, p))
        .collect();
    let layout_ids: String = (1..=layout_count)
        .map(|n| {
            format!(
                r#"<p:sldLayoutId id="{}" r:id="rId{n}"/>"#,
                2_147_483_648u64 + n as u64
            )
        })
        .collect();

    format!(
        r#"{XML_DECL}<p:sldMaster {NS}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{}{shapes}</p:spTree></p:cSld>{CLR_MAP}<p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst><p:txStyles><p:titleStyle><a:lvl1pPr algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:lnSpc><a:spcPct val="90000"/></a:lnSpc><a:spcBef><a:spcPct val="0"/></a:spcBef><a:buNone/><a:defRPr sz="4000" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/><a:ea typeface="+mj-ea"/><a:cs typeface="+mj-cs"/></a:defRPr></a:lvl1pPr></p:titleStyle><p:bodyStyle>{}</p:bodyStyle><p:otherStyle><a:defPPr><a:defRPr lang="en-US"/></a:defPPr><a:lvl1pPr marL="0" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:defRPr sz="1800" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl1pPr></p:otherStyle></p:txStyles></p:sldMaster>"#,
        sp_tree_open(),
        body_levels()
    )
}

fn body_levels() -> String {
    [(1, 228600, 2800), (2, 685800, 2400), (3, 1143000, 2000), (4, 1600200, 1800), (5, 2057400, 1800)]
        .iter()
        .map(|(lvl, mar_l, sz)| {
            format!(
                r#"<a:lvl{lvl}pPr marL="{mar_l}" indent="-228600" algn="l" defTabSz="914400" rtl="0" eaLnBrk="1" latinLnBrk="0" hangingPunct="1"><a:lnSpc><a:spcPct val="90000"/></a:lnSpc><a:spcBef><a:spcPts val="1000"/></a:spcBef><a:buFont typeface="Arial" panose="020B0604020202020204"/><a:buChar char="&#8226;"/><a:defRPr sz="{sz}" kern="1200"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/><a:ea typeface="+mn-ea"/><a:cs typeface="+mn-cs"/></a:defRPr></a:lvl{lvl}pPr>"#
            )
        })
        .collect()
}

fn notes_master_xml() -> String {
    let body = ph(Some("body"), 1, "Notes Placeholder 1", Some((0.75, 4.75, 6.0, 4.5)));
    let image = ph(Some("sldImg"), 2, "Slide Image Placeholder 2", Some((1.19, 0.75, 5.12, 3.84)));
    format!(
        r#"{XML_DECL}<p:notesMaster {NS}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>{}{}{}</p:spTree></p:cSld>{CLR_MAP}</p:notesMaster>"#,
        sp_tree_open(),
        placeholder_sp(2, &image),
        placeholder_sp(3, &body)
    )
}

fn theme_xml(name: &str) -> String {
    let colors = [
        ("dk1", r#"<a:sysClr val="windowText" lastClr="000000"/>"#),
        ("lt1", r#"<a:sysClr val="window" lastClr="FFFFFF"/>"#),
        ("dk2", r#"<a:srgbClr val="444444"/>"#),
        ("lt2", r#"<a:srgbClr val="E7E6E6"/>"#),
        ("accent1", r#"<a:srgbClr val="4472C4"/>"#),
        ("accent2", r#"<a:srgbClr val="70AD47"/>"#),
        ("accent3", r#"<a:srgbClr val="A5A5A5"/>"#),
        ("accent4", r#"<a:srgbClr val="FFC000"/>"#),
        ("accent5", r#"<a:srgbClr val="5B9BD5"/>"#),
        ("accent6", r#"<a:srgbClr val="ED7D31"/>"#),
        ("hlink", r#"<a:srgbClr val="0563C1"/>"#),
        ("folHlink", r#"<a:srgbClr val="954F72"/>"#),
    ];
    let clr_scheme: String = colors
        .iter()
        .map(|(slot, value)| format!("<a:{slot}>{value}</a:{slot}>"))
        .collect();
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    let fills = solid.repeat(3);
    let lines: String = [6350, 12700, 19050]
        .iter()
        .map(|w| format!(r#"<a:ln w="{w}" cap="flat" cmpd="sng" algn="ctr">{solid}<a:prstDash val="solid"/></a:ln>"#))
        .collect();
    let effects = "<a:effectStyle><a:effectLst/></a:effectStyle>".repeat(3);

    format!(
        r#"{XML_DECL}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="{}"><a:themeElements><a:clrScheme name="Office">{clr_scheme}</a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{fills}</a:fillStyleLst><a:lnStyleLst>{lines}</a:lnStyleLst><a:effectStyleLst>{effects}</a:effectStyleLst><a:bgFillStyleLst>{fills}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#,
        escape(name)
    )
}
