//! Simulated web search for plan queries.

mod executor;
pub mod prompts;

pub use executor::{parse_facts, SearchExecutor, SearchResults};
