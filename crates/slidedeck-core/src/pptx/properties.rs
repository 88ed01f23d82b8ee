//! Visual properties read from a template: colours, fonts and spacing.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::package::{Package, REL_THEME};
use super::template::SlideLayout;
use super::xml::attr;
use super::PptxError;

/// Theme colours as `RRGGBB` hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeColors {
    pub accent1: String,
    pub accent2: String,
    pub text1: String,
    pub text2: String,
    pub background1: String,
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            accent1: "4472C4".to_string(),
            accent2: "70AD47".to_string(),
            text1: "000000".to_string(),
            text2: "444444".to_string(),
            background1: "FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDefaults {
    pub name: String,
    pub size_pt: f64,
}

impl Default for FontDefaults {
    fn default() -> Self {
        Self {
            name: "Calibri".to_string(),
            size_pt: 18.0,
        }
    }
}

/// Margins in inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub margin_left: f64,
    pub margin_top: f64,
    pub line_spacing: f64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            margin_left: 0.5,
            margin_top: 1.0,
            line_spacing: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateProperties {
    /// Slide width and height in EMU.
    pub slide_width: i64,
    pub slide_height: i64,
    pub theme_colors: ThemeColors,
    pub default_font: FontDefaults,
    pub spacing: Spacing,
}

impl TemplateProperties {
    pub(crate) fn extract(
        package: &Package,
        master_part: &str,
        layouts: &[SlideLayout],
        (slide_width, slide_height): (i64, i64),
    ) -> Result<Self, PptxError> {
        let theme_part = package
            .resolved_relationships(master_part)?
            .into_iter()
            .find(|(r, _)| r.rel_type == REL_THEME)
            .map(|(_, target)| target);

        let (theme_colors, default_font) = match theme_part {
            Some(part) if package.contains(&part) => {
                let xml = package.part_str(&part)?;
                parse_theme(&part, &xml)?
            }
            _ => (ThemeColors::default(), FontDefaults::default()),
        };

        let spacing = layouts
            .iter()
            .flat_map(|l| l.placeholders.iter())
            .filter_map(|p| p.bounds)
            .fold(None::<(f64, super::Bounds)>, |best, b| match best {
                Some((area, _)) if area >= b.area_in() => best,
                _ => Some((b.area_in(), b)),
            })
            .map(|(_, b)| Spacing {
                margin_left: b.left_in(),
                margin_top: b.top_in(),
                line_spacing: 1.5,
            })
            .unwrap_or_default();

        debug!(
            accent1 = %theme_colors.accent1,
            font = %default_font.name,
            "Extracted template properties"
        );

        Ok(Self {
            slide_width,
            slide_height,
            theme_colors,
            default_font,
            spacing,
        })
    }
}

/// Reads the colour scheme and minor latin font of a theme part.
fn parse_theme(part: &str, xml: &str) -> Result<(ThemeColors, FontDefaults), PptxError> {
    let mut reader = Reader::from_str(xml);
    let mut colors = ThemeColors::default();
    let mut font = FontDefaults::default();
    let mut slot: Option<String> = None;
    let mut in_clr_scheme = false;
    let mut in_minor = false;

    loop {
        let event = reader.read_event().map_err(|e| PptxError::xml(part, e))?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let local = e.local_name();
                match local.as_ref() {
                    b"clrScheme" => in_clr_scheme = true,
                    b"minorFont" => in_minor = true,
                    b"dk1" | b"dk2" | b"lt1" | b"accent1" | b"accent2" if in_clr_scheme => {
                        slot = Some(String::from_utf8_lossy(local.as_ref()).into_owned());
                    }
                    b"srgbClr" | b"sysClr" => {
                        let value = attr(e, b"val")
                            .filter(|v| v.len() == 6 && e.local_name().as_ref() == b"srgbClr")
                            .or_else(|| attr(e, b"lastClr"));
                        if let (Some(name), Some(value)) = (slot.take(), value) {
                            let value = value.to_ascii_uppercase();
                            match name.as_str() {
                                "dk1" => colors.text1 = value,
                                "dk2" => colors.text2 = value,
                                "lt1" => colors.background1 = value,
                                "accent1" => colors.accent1 = value,
                                "accent2" => colors.accent2 = value,
                                _ => {}
                            }
                        }
                    }
                    b"latin" if in_minor => {
                        if let Some(face) = attr(e, b"typeface").filter(|f| !f.is_empty()) {
                            font.name = face;
                        }
                        in_minor = false;
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"clrScheme" => in_clr_scheme = false,
                b"minorFont" => in_minor = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((colors, font))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_theme_colors_and_font() {
        let xml = r#"<a:theme xmlns:a="a"><a:themeElements><a:clrScheme name="x">
<a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
<a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
<a:dk2><a:srgbClr val="1f2a44"/></a:dk2>
<a:accent1><a:srgbClr val="C00000"/></a:accent1>
</a:clrScheme><a:fontScheme name="f"><a:majorFont><a:latin typeface="Georgia"/></a:majorFont>
<a:minorFont><a:latin typeface="Segoe UI"/></a:minorFont></a:fontScheme></a:themeElements></a:theme>"#;
        let (colors, font) = parse_theme("theme1.xml", xml).unwrap();
        assert_eq!(colors.accent1, "C00000");
        assert_eq!(colors.text2, "1F2A44");
        assert_eq!(colors.text1, "000000");
        assert_eq!(colors.accent2, "70AD47");
        assert_eq!(font.name, "Segoe UI");
        assert_eq!(font.size_pt, 18.0);
    }
}
