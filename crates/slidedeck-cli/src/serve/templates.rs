//! The single-page UI, assembled from `templates/index.html`,
//! `templates/styles.css` and `templates/app.js` embedded in the binary.

const HTML_TEMPLATE: &str = include_str!("templates/index.html");
const STYLES: &str = include_str!("templates/styles.css");
const SCRIPT: &str = include_str!("templates/app.js");

/// Render the single-page UI.
///
/// Substitutes `{{DEFAULT_TEMPLATE}}`, `{{STYLES}}` and `{{SCRIPT}}`.
pub fn render_index(default_template: &str) -> String {
    HTML_TEMPLATE
        .replace("{{DEFAULT_TEMPLATE}}", &html_escape(default_template))
        .replace("{{STYLES}}", STYLES)
        .replace("{{SCRIPT}}", SCRIPT)
}

/// Attribute-safe text.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index_fills_placeholders() {
        let page = render_index("Ion <Boardroom>");
        assert!(page.contains("data-default-template=\"Ion &lt;Boardroom&gt;\""));
        assert!(!page.contains("{{STYLES}}"));
        assert!(!page.contains("{{SCRIPT}}"));
    }
}
