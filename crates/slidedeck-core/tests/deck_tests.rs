mod common;

use common::ScriptedLLM;
use slidedeck_core::config::{LLMConfig, CLOSING_SLIDE_TITLE};
use slidedeck_core::deck::{render_deck, DeckError};
use slidedeck_core::pptx::read_slide_texts;
use slidedeck_core::{DeckContent, SlideDeck, TemplateAnalysis};
use tempfile::TempDir;

const DECK: &str = r#"{
  "title": "Cloud Spend Review",
  "slides": [
    {
      "heading": "Slide 1: Where the money goes",
      "bullet_points": ["Compute is 62% of spend", ["Reserved instances cover 40%", "Spot covers 8%"]],
      "key_message": "Compute dominates"
    },
    {
      "heading": "Spend by quarter",
      "bullet_points": [],
      "chart": {"type": "line", "title": "Spend ($M)", "categories": ["Q1", "Q2", "Q3"],
                "series": [{"name": "Spend", "values": [4.1, 4.4, "4.9"]}]}
    },
    {
      "heading": "Team breakdown",
      "bullet_points": [],
      "table": {"headers": ["Team", "Spend"], "rows": [["Data", "$1.2M"], ["Web", "$0.8M"]]}
    },
    {
      "heading": "Build versus buy",
      "bullet_points": [
        {"heading": "Build", "bullet_points": ["Full control", "Higher headcount"]},
        {"heading": "Buy", "bullet_points": ["Faster start", "Vendor lock-in"]}
      ]
    }
  ]
}"#;

const REVISED: &str = r#"{"title": "Cloud Spend Review", "slides": [
  {"heading": "Where the money goes", "bullet_points": ["Compute is 62% of spend"]}
]}"#;

fn session(temp: &TempDir, llm: ScriptedLLM) -> SlideDeck {
    let (_llm, shared) = llm.shared();
    SlideDeck::new(
        "Cloud cost review",
        shared,
        LLMConfig::default(),
        common::registry(temp),
    )
}

#[test]
fn test_render_deck_with_builtin_layouts() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("deck.pptx");
    let template = common::template();
    let analysis = TemplateAnalysis::analyze(&template);
    let deck: DeckContent = serde_json::from_str(DECK).unwrap();

    let headers = render_deck(&template, &analysis, &deck, &output).unwrap();
    assert_eq!(
        headers,
        vec![
            "Cloud Spend Review",
            "Where the money goes",
            "Spend by quarter",
            "Team breakdown",
            "Build versus buy"
        ]
    );

    let texts = read_slide_texts(&std::fs::read(&output).unwrap()).unwrap();
    assert_eq!(texts.len(), headers.len() + 1);
    assert_eq!(texts[0].title.as_deref(), Some("Cloud Spend Review"));
    assert_eq!(texts.last().unwrap().title.as_deref(), Some(CLOSING_SLIDE_TITLE));
    let body = texts[1].paragraphs.join("\n");
    assert!(body.contains("Compute is 62% of spend"));
    assert!(body.contains("Reserved instances cover 40%"));
}

#[tokio::test]
async fn test_generate_then_revise() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out/deck.pptx");
    let llm = ScriptedLLM::new(DECK).on("Keep only the first slide", REVISED);
    let mut deck = session(&temp, llm);

    let headers = deck.generate(&output).await.unwrap();
    assert_eq!(headers.len(), 5);
    assert!(output.exists());
    assert!(deck.last_response().unwrap().contains("Cloud Spend Review"));

    let headers = deck.revise("Keep only the first slide", &output).await.unwrap();
    assert_eq!(headers, vec!["Cloud Spend Review", "Where the money goes"]);
    assert_eq!(deck.history().len(), 2);
    assert_eq!(read_slide_texts(&std::fs::read(&output).unwrap()).unwrap().len(), 3);
}

#[tokio::test]
async fn test_revise_before_generate() {
    let temp = TempDir::new().unwrap();
    let mut deck = session(&temp, ScriptedLLM::new(DECK));
    let result = deck.revise("Shorter", &temp.path().join("deck.pptx")).await;
    assert!(matches!(result, Err(DeckError::NotGenerated)));
}

#[tokio::test]
async fn test_unparseable_revision_keeps_last_deck() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("deck.pptx");
    let llm = ScriptedLLM::new(DECK).on("Make it a poem", "Roses are red, decks are blue");
    let mut deck = session(&temp, llm);

    deck.generate(&output).await.unwrap();
    let before = deck.last_response().unwrap().to_string();

    assert!(deck.revise("Make it a poem", &output).await.is_err());
    assert_eq!(deck.last_response(), Some(before.as_str()));
}

#[test]
fn test_template_selection_and_reset() {
    let temp = TempDir::new().unwrap();
    let mut deck = session(&temp, ScriptedLLM::new(DECK));

    deck.set_template(1);
    assert_eq!(deck.template_idx(), 1);
    deck.set_template(7);
    assert_eq!(deck.template_idx(), 0);

    assert!(matches!(
        deck.set_model("gpt-4o", None),
        Err(DeckError::InvalidModel(_))
    ));
    deck.set_model("[ollama]mistral", None).unwrap();
    assert_eq!(deck.model(), "[ollama]mistral");

    deck.set_template(1);
    deck.reset();
    assert_eq!(deck.template_idx(), 0);
    assert!(deck.topic().is_empty());
    assert!(deck.last_response().is_none());
}
