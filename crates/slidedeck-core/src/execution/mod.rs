//! Plan execution: searches, per-placeholder content and deck writing.

mod log;
mod orchestrator;
mod progress;
mod prompts;
mod roles;

pub use log::{FillStatus, PlaceholderLog, SlideLog};
pub use orchestrator::{execution_log_path, ExecutionError, ExecutionOrchestrator, ExecutionReport};
pub use progress::Stage;
pub use roles::{infer_role, map_placeholders, merge_suggestions, FillRole, PlaceholderSlot};
