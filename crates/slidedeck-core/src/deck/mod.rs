//! One-shot deck generation.
//!
//! The model writes the whole deck as one JSON document ([`DeckContent`]),
//! following a fixed executive storyline; [`render_deck`] maps each slide
//! onto template layouts. [`SlideDeck`] keeps the session state needed to
//! revise a deck through follow-up instructions.

mod model;
pub mod prompts;
mod renderer;
mod session;

pub use model::{
    flatten_bullets, parse_icon_item, BulletGroup, BulletItem, DeckContent, SlideContent, ICON_MARKER,
};
pub use renderer::{contrast_color, remove_slide_number, render_deck, render_into};
pub use session::{
    executive_story_plan, parse_model_name, plan_topic, ChatMessage, ChatRole, DeckError, SlideDeck,
    StorySection, KNOWN_PROVIDERS,
};
