pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod content;
pub mod deck;
pub mod execution;
pub mod files;
pub mod llm;
pub mod manager;
pub mod matcher;
pub mod planning;
pub mod pptx;
pub mod research;
pub mod storage;
pub mod templates;

pub use analyzer::TemplateAnalysis;
pub use config::{Config, ConfigError, StorageConfig};
pub use deck::{DeckContent, SlideDeck};
pub use execution::{ExecutionOrchestrator, ExecutionReport, Stage};
pub use manager::{DeckManager, ManagerError};
pub use planning::{PlanGenerator, ResearchPlan};
pub use pptx::Template;
pub use storage::{FileStorage, PlanRecord, ReportRecord, Storage, StorageError};
pub use templates::TemplateRegistry;
