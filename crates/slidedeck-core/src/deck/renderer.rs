//! Renders a [`DeckContent`] document onto a template.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::analyzer::{largest, LayoutCapability, PlaceholderInfo, TemplateAnalysis};
use crate::config::{CLOSING_SLIDE_TITLE, TITLE_SLIDE_SUBTITLE};
use crate::matcher::{infer_content_type, ContentMatcher, SlideKind};
use crate::pptx::{emu_to_inches, Bounds, DeckWriter, SlideBuilder, Template, TextStyle};

use super::model::{flatten_bullets, BulletItem, DeckContent, SlideContent};
use super::DeckError;

static SLIDE_NUMBER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*slide\s+\d+\s*:").ok());

const KEY_MESSAGE_PT: f64 = 14.0;
const ICON_TOP_IN: f64 = 3.0;

/// Drops a leading `Slide N:` from a heading.
pub fn remove_slide_number(heading: &str) -> String {
    match SLIDE_NUMBER.as_ref().and_then(|re| re.find(heading)) {
        Some(m) => heading[m.end()..].trim().to_string(),
        None => heading.trim().to_string(),
    }
}

/// Black or white, whichever reads better on `background` (`RRGGBB`).
pub fn contrast_color(background: &str) -> &'static str {
    let channel = |i: usize| {
        background
            .get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .map_or(255.0, f64::from)
    };
    let luminance = (0.299 * channel(0) + 0.587 * channel(2) + 0.114 * channel(4)) / 255.0;
    if luminance > 0.5 {
        "000000"
    } else {
        "FFFFFF"
    }
}

/// Content type per slide, refusing a third consecutive slide of the same
/// non-bullet kind when the slide also has bullets to fall back on.
fn effective_kind(slide: &SlideContent, history: &[SlideKind]) -> SlideKind {
    let kind = infer_content_type(slide);
    let n = history.len();
    let third_in_row = n >= 2 && history[n - 1] == kind && history[n - 2] == kind;
    if third_in_row && kind != SlideKind::Bullets && !slide.bullet_points.is_empty() {
        debug!(kind = %kind, "third consecutive slide of one kind, rendering bullets");
        return SlideKind::Bullets;
    }
    kind
}

/// Writes `deck` to `output_path` and returns every slide heading, the deck
/// title first.
pub fn render_deck(
    template: &Template,
    analysis: &TemplateAnalysis,
    deck: &DeckContent,
    output_path: &Path,
) -> Result<Vec<String>, DeckError> {
    let mut writer = DeckWriter::new(template)?;
    let headers = render_into(&mut writer, analysis, deck)?;
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DeckError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    writer.save(output_path)?;
    info!(path = %output_path.display(), slides = headers.len() + 1, "deck written");
    Ok(headers)
}

/// The model's layout when it names a body layout that exists, else the
/// matcher's pick. Either way the choice lands in the matcher history.
fn body_layout(
    matcher: &mut ContentMatcher<'_>,
    slide: &SlideContent,
    index: usize,
    total: usize,
    layout_count: usize,
) -> usize {
    match slide.layout_idx {
        Some(idx) if idx >= 1 && idx < layout_count => {
            matcher.record(idx);
            idx
        }
        _ => matcher.select_layout_for_slide(slide, index, total),
    }
}

/// Adds the title, body and closing slides to `writer`.
pub fn render_into(
    writer: &mut DeckWriter,
    analysis: &TemplateAnalysis,
    deck: &DeckContent,
) -> Result<Vec<String>, DeckError> {
    let title = if deck.title.trim().is_empty() {
        "Untitled Presentation".to_string()
    } else {
        deck.title.trim().to_string()
    };
    let mut headers = vec![title.clone()];

    let cover = writer.add_slide(0)?;
    cover.set_title(&title);
    let subtitle = cover
        .layout()
        .placeholders
        .iter()
        .find(|p| p.idx != 0 && !p.kind.is_title() && !p.kind.is_footer())
        .map(|p| p.idx);
    if let Some(idx) = subtitle {
        cover.set_text(idx, TITLE_SLIDE_SUBTITLE, &TextStyle::default())?;
    }

    let mut matcher = ContentMatcher::new(analysis);
    let mut kinds = Vec::with_capacity(deck.slides.len());
    let total = deck.slides.len();

    for (i, slide) in deck.slides.iter().enumerate() {
        let kind = effective_kind(slide, &kinds);
        kinds.push(kind);

        let layout_idx = body_layout(&mut matcher, slide, i, total, writer.layout_count());
        let Some(capability) = analysis.layout(layout_idx) else {
            warn!(slide = i + 1, layout = layout_idx, "layout missing, slide skipped");
            continue;
        };

        let heading = remove_slide_number(&slide.heading);
        let builder = writer.add_slide(layout_idx)?;
        builder.set_title(&heading);
        headers.push(heading);

        render_body(builder, capability, slide, kind)?;
        if let Some(message) = slide.key_message.as_deref().filter(|m| !m.trim().is_empty()) {
            add_key_message(builder, message);
        }
    }

    let closing = writer.add_slide(0)?;
    closing.set_title(CLOSING_SLIDE_TITLE);
    Ok(headers)
}

fn render_body(
    slide: &mut SlideBuilder,
    layout: &LayoutCapability,
    content: &SlideContent,
    kind: SlideKind,
) -> Result<(), DeckError> {
    let body_style = TextStyle::default().font(slide.font_name().to_string());
    match kind {
        SlideKind::Chart => {
            if let (Some(chart), Some(target)) = (&content.chart, body_target(layout)) {
                slide.set_chart(target.idx, chart)?;
                return Ok(());
            }
        }
        SlideKind::Table => {
            if let (Some(table), Some(target)) = (&content.table, body_target(layout)) {
                if !table.headers.is_empty() && !table.rows.is_empty() {
                    slide.set_table(target.idx, table)?;
                    return Ok(());
                }
            }
        }
        SlideKind::Pictogram => {
            add_icon_cards(slide, content);
            return Ok(());
        }
        SlideKind::Comparison | SlideKind::KpiDashboard => {
            if fill_columns(slide, layout, content, &body_style)? {
                return Ok(());
            }
        }
        SlideKind::Bullets => {}
    }
    fill_bullets(slide, layout, &content.bullet_points, &body_style)
}

/// Largest content placeholder, else the largest non-title one.
fn body_target(layout: &LayoutCapability) -> Option<&PlaceholderInfo> {
    largest(&layout.content_placeholders).or_else(|| {
        largest(
            layout
                .all_placeholders
                .iter()
                .filter(|p| p.idx != 0 && !p.kind.is_title() && !p.kind.is_footer()),
        )
    })
}

fn bullet_text(text: &str) -> String {
    let text = text.trim();
    text.strip_prefix(">>").map_or(text, str::trim_start).to_string()
}

fn group_items(heading: &str, bullets: &[BulletItem]) -> Vec<(String, u32)> {
    let mut items = Vec::new();
    if !heading.trim().is_empty() {
        items.push((format!("**{}**", heading.trim()), 0));
    }
    items.extend(
        flatten_bullets(bullets, 1)
            .into_iter()
            .map(|(text, level)| (bullet_text(&text), level)),
    );
    items
}

/// Two headed groups side by side in the first two text placeholders.
/// Returns false when the layout has fewer than two.
fn fill_columns(
    slide: &mut SlideBuilder,
    layout: &LayoutCapability,
    content: &SlideContent,
    style: &TextStyle,
) -> Result<bool, DeckError> {
    let mut columns: Vec<&PlaceholderInfo> = layout.text_placeholders.iter().take(2).collect();
    if columns.len() < 2 {
        return Ok(false);
    }
    columns.sort_by(|a, b| a.left.total_cmp(&b.left));
    for (group, column) in content.groups().zip(columns) {
        slide.set_bullets(column.idx, &group_items(&group.heading, &group.bullet_points), style)?;
    }
    Ok(true)
}

fn fill_bullets(
    slide: &mut SlideBuilder,
    layout: &LayoutCapability,
    bullets: &[BulletItem],
    style: &TextStyle,
) -> Result<(), DeckError> {
    if bullets.is_empty() {
        return Ok(());
    }
    let mut targets: Vec<&PlaceholderInfo> = layout.content_placeholders.iter().collect();
    targets.sort_by(|a, b| a.left.total_cmp(&b.left));
    if targets.is_empty() {
        targets.extend(body_target(layout));
    }
    if targets.is_empty() {
        let (w, h) = slide.slide_size();
        let margin = crate::pptx::EMU_PER_INCH / 2;
        let bounds = Bounds::new(margin, 3 * margin, w - 2 * margin, h - 4 * margin);
        let text = flatten_bullets(bullets, 0)
            .into_iter()
            .map(|(t, _)| bullet_text(&t))
            .collect::<Vec<_>>()
            .join("\n");
        slide.add_text_box(bounds, &text, style);
        return Ok(());
    }

    let all_groups = bullets.iter().all(|b| b.as_group().is_some());
    if all_groups && bullets.len() <= targets.len() {
        for (group, target) in bullets.iter().filter_map(BulletItem::as_group).zip(&targets) {
            slide.set_bullets(target.idx, &group_items(&group.heading, &group.bullet_points), style)?;
        }
        return Ok(());
    }

    let mut buckets: Vec<Vec<(String, u32)>> = vec![Vec::new(); targets.len()];
    for (i, (text, level)) in flatten_bullets(bullets, 0).into_iter().enumerate() {
        buckets[i % targets.len()].push((bullet_text(&text), level));
    }
    for (target, items) in targets.iter().zip(buckets) {
        if !items.is_empty() {
            slide.set_bullets(target.idx, &items, style)?;
        }
    }
    Ok(())
}

/// Pictogram items as a row of coloured cards with a caption below each.
fn add_icon_cards(slide: &mut SlideBuilder, content: &SlideContent) {
    let items = content.icon_items();
    if items.is_empty() {
        return;
    }
    let (w, _) = slide.slide_size();
    let slide_w = emu_to_inches(w);
    let n = items.len() as f64;
    let size = (slide_w * 0.12).max(0.4).min(1.2);
    let spacing = ((slide_w - n * size) / (n + 1.0)).max(0.1);
    let caption_w = (size + spacing * 0.9).max(size);
    let theme = slide.theme().clone();
    let font = slide.font_name().to_string();

    for (i, (icon, text)) in items.iter().enumerate() {
        let left = spacing + i as f64 * (size + spacing);
        let fill = if i % 2 == 0 { &theme.accent1 } else { &theme.accent2 };
        let label = icon.replace(['_', '-'], " ");
        let card_style = TextStyle::sized(10.0)
            .bold()
            .centered()
            .color(contrast_color(fill))
            .font(font.clone());
        slide.add_card(Bounds::inches(left, ICON_TOP_IN, size, size), &label, &card_style, fill);

        let caption_left = left + size / 2.0 - caption_w / 2.0;
        let caption_style = TextStyle::sized(12.0).centered().font(font.clone());
        slide.add_text_box(
            Bounds::inches(caption_left.max(0.0), ICON_TOP_IN + size + 0.1, caption_w, 1.0),
            &bullet_text(text),
            &caption_style,
        );
    }
}

fn add_key_message(slide: &mut SlideBuilder, message: &str) {
    let (w, h) = slide.slide_size();
    let (slide_w, slide_h) = (emu_to_inches(w), emu_to_inches(h));
    let box_h = (slide_h * 0.12).max(0.8).min(2.0);
    let box_w = slide_w / 2.3;
    let bounds = Bounds::inches((slide_w - box_w) / 2.0, slide_h - box_h - 0.1, box_w, box_h);
    let fill = slide.theme().background1.clone();
    let style = TextStyle::sized(KEY_MESSAGE_PT)
        .bold()
        .centered()
        .color(contrast_color(&fill))
        .font(slide.font_name().to_string());
    slide.add_card(bounds, message.trim(), &style, &fill);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ChartType, TableData};

    #[test]
    fn test_remove_slide_number() {
        assert_eq!(remove_slide_number("Slide 3: Market Size"), "Market Size");
        assert_eq!(remove_slide_number("slide  12 :  Risks"), "Risks");
        assert_eq!(remove_slide_number("Slides overview"), "Slides overview");
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color("FFFFFF"), "000000");
        assert_eq!(contrast_color("1F1F1F"), "FFFFFF");
        assert_eq!(contrast_color("bad"), "000000");
    }

    #[test]
    fn test_bullet_text_strips_marker() {
        assert_eq!(bullet_text(">> Revenue grew"), "Revenue grew");
        assert_eq!(bullet_text("  plain "), "plain");
    }

    #[test]
    fn test_body_layout_skips_title_layout() {
        let bytes = crate::pptx::blank_template().unwrap();
        let template = Template::from_bytes(&bytes, "Basic").unwrap();
        let analysis = TemplateAnalysis::analyze(&template);
        let mut matcher = ContentMatcher::new(&analysis);
        let count = template.layouts().len();

        let mut slide = SlideContent {
            heading: "Pipeline".into(),
            bullet_points: vec![BulletItem::Text("Three deals closing".into())],
            layout_idx: Some(0),
            ..Default::default()
        };
        assert_ne!(body_layout(&mut matcher, &slide, 0, 3, count), 0);

        slide.layout_idx = Some(3);
        assert_eq!(body_layout(&mut matcher, &slide, 1, 3, count), 3);
        slide.layout_idx = Some(count);
        assert_ne!(body_layout(&mut matcher, &slide, 2, 3, count), count);

        let used = matcher.used_layouts();
        assert_eq!(used.len(), 3);
        assert_eq!(used[1], 3);
    }

    #[test]
    fn test_third_chart_in_row_falls_back_to_bullets() {
        let slide = SlideContent {
            heading: "Growth".into(),
            bullet_points: vec![BulletItem::Text("Up 10%".into())],
            chart: Some(crate::content::ChartData::fallback("Growth", ChartType::Bar)),
            ..Default::default()
        };
        let history = [SlideKind::Chart, SlideKind::Chart];
        assert_eq!(effective_kind(&slide, &history), SlideKind::Bullets);
        assert_eq!(effective_kind(&slide, &history[..1]), SlideKind::Chart);

        let table_only = SlideContent {
            table: Some(TableData::fallback()),
            ..Default::default()
        };
        let tables = [SlideKind::Table, SlideKind::Table];
        assert_eq!(effective_kind(&table_only, &tables), SlideKind::Table);
    }
}
