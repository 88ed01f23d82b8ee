//! Research planning: from a request and an analyzed template to a
//! reviewable [`ResearchPlan`] of slides, placeholders and search queries.

mod generator;
mod plan;
pub mod prompts;

pub use generator::{
    determine_content_type, enforce_layout_diversity, fallback_assignment, template_capabilities,
    PlanError, PlanGenerator, SectionBlueprint, SlideTopic,
};
pub use plan::{
    Dimensions, PlaceholderContentSpec, PlanAnalysis, ResearchPlan, SearchQuery, SectionPlan,
    TemplateInfo,
};
