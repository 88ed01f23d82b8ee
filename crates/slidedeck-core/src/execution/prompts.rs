use serde_json::json;

use super::roles::{FillRole, PlaceholderSlot};

/// System prompt for batched role validation.
pub const ROLE_SYSTEM_PROMPT: &str = "You are a concise classifier. Return only valid JSON.";

pub fn build_role_prompt<'a>(
    title: &str,
    purpose: &str,
    slots: impl IntoIterator<Item = &'a PlaceholderSlot>,
) -> String {
    let placeholders: Vec<_> = slots
        .into_iter()
        .map(|s| {
            json!({
                "id": s.idx,
                "type": s.kind.as_str(),
                "area": (s.area * 100.0).round() / 100.0,
                "inferred_role": s.role.as_str(),
            })
        })
        .collect();
    let allowed: Vec<&str> = FillRole::ALL.iter().map(FillRole::as_str).collect();
    let payload = json!({
        "section_title": title,
        "section_purpose": purpose,
        "placeholders": placeholders,
        "allowed_roles": allowed,
    });
    format!(
        "Given section context and placeholders, return JSON mapping placeholder ids to the best role from allowed_roles. Return ONLY JSON.\n\n{payload}"
    )
}
