mod error;
mod file;
mod record;

pub use error::StorageError;
pub use file::FileStorage;
pub use record::{PlanRecord, PlanSummary, ReportRecord};

/// Trait for plan and report storage backends.
///
/// Implementations persist plans between the plan and execute steps, and
/// the report of every executed plan.
pub trait Storage {
    /// Saves (or replaces) a plan record.
    fn save_plan(&self, record: &PlanRecord) -> Result<(), StorageError>;

    /// Loads a plan record by ID.
    fn load_plan(&self, id: &str) -> Result<PlanRecord, StorageError>;

    /// Lists plans, newest first.
    fn list_plans(&self) -> Result<Vec<PlanSummary>, StorageError>;

    /// Deletes a plan record.
    fn delete_plan(&self, id: &str) -> Result<(), StorageError>;

    /// Saves (or replaces) a report record.
    fn save_report(&self, record: &ReportRecord) -> Result<(), StorageError>;

    /// Loads a report record by ID.
    fn load_report(&self, id: &str) -> Result<ReportRecord, StorageError>;

    /// Lists reports, newest first.
    fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError>;

    /// Deletes a report record. The deck file itself is left in place.
    fn delete_report(&self, id: &str) -> Result<(), StorageError>;
}
