use super::session::StorySection;

pub const DECK_SYSTEM_PROMPT: &str = "You are an executive presentation writer. \
You answer with a single JSON object describing a slide deck and nothing else.";

const DECK_SCHEMA: &str = r#"{
  "title": "Presentation title",
  "slides": [
    {
      "heading": "Slide heading",
      "bullet_points": [
        "Plain bullet with **bold** or *italic* emphasis",
        ["Nested bullet one level deeper"],
        {"heading": "Column heading", "bullet_points": ["Column bullet"]}
      ],
      "key_message": "One sentence takeaway",
      "chart": {"type": "bar", "title": "...", "categories": ["A", "B"], "series": [{"name": "...", "values": [1, 2]}]},
      "table": {"headers": ["Metric", "Value"], "rows": [["Revenue", "$10M"]]}
    }
  ]
}"#;

/// Guidance block listing the executive story sections in order.
pub fn build_story_guidance(sections: &[StorySection]) -> String {
    let mut out = String::from("### EXECUTIVE STORY STRUCTURE:\n");
    out.push_str(&format!(
        "Create exactly {} slides following this structure:\n\n",
        sections.len()
    ));
    for (n, section) in sections.iter().enumerate() {
        out.push_str(&format!(
            "{}. **{}**: {}\n   - Content type: {}\n   - Style: {}\n\n",
            n + 1,
            section.kind.to_uppercase(),
            section.purpose,
            section.content_type,
            section.preferred_story,
        ));
    }
    out.push_str(
        "IMPORTANT RULES:\n\
         - NO duplicate section types\n\
         - Each section must have a UNIQUE purpose\n\
         - Use varied content types (charts, tables, bullets, icons)\n\
         - Executive verbosity: concise yet complete (level 7)\n\
         - Every slide must tell ONE clear story\n",
    );
    out
}

pub fn build_initial_prompt(topic: &str, guidance: &str, additional_info: &str) -> String {
    let extra = if additional_info.trim().is_empty() {
        String::new()
    } else {
        format!("\n### Additional information:\n{additional_info}\n")
    };
    format!(
        r#"Create the content of a slide deck on the topic below.

{guidance}
### Topic:
{topic}
{extra}
Formatting:
- Pictogram slides write every bullet as "[[icon_name]] text".
- Comparison slides use exactly two objects with "heading" and "bullet_points".
- Add "chart" only to data slides and "table" only to breakdown slides.
- Headings never start with "Slide N:".

Return JSON in this shape:
{DECK_SCHEMA}"#
    )
}

pub fn build_refinement_prompt(instructions: &str, previous_content: &str, additional_info: &str) -> String {
    let extra = if additional_info.trim().is_empty() {
        String::new()
    } else {
        format!("\n### Additional information:\n{additional_info}\n")
    };
    format!(
        r#"Revise the slide deck below. Apply every instruction, in order; later
instructions take precedence.

### Instructions:
{instructions}

### Previous content:
{previous_content}
{extra}
Keep the same JSON shape and return the complete revised deck:
{DECK_SCHEMA}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::session::executive_story_plan;

    #[test]
    fn test_story_guidance_lists_sections() {
        let guidance = build_story_guidance(&executive_story_plan());
        assert!(guidance.contains("Create exactly 10 slides"));
        assert!(guidance.contains("1. **OPENING**: Hook attention with key insight"));
        assert!(guidance.contains("   - Content type: kpi_dashboard"));
    }
}
