use chrono::Utc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::content::ChartData;
use crate::execution::ExecutionReport;
use crate::planning::{ResearchPlan, SectionPlan};
use crate::storage::{PlanRecord, PlanSummary, ReportRecord, Storage, StorageError};

/// Manages plans and reports with automatic persistence.
///
/// Shared by the CLI and the web server so both see the same records.
pub struct DeckManager<S: Storage> {
    storage: S,
}

impl<S: Storage> DeckManager<S> {
    /// Creates a new DeckManager with the given storage backend.
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Stores a freshly generated plan with its uploads.
    pub fn create_plan(
        &self,
        plan: ResearchPlan,
        template: &str,
        source_text: Option<String>,
        chart_data: Option<ChartData>,
    ) -> Result<PlanRecord, ManagerError> {
        let record = PlanRecord::new(plan, template)
            .with_source_text(source_text)
            .with_chart_data(chart_data);
        self.storage.save_plan(&record)?;
        info!(plan_id = %record.id, sections = record.plan.sections.len(), "plan stored");
        Ok(record)
    }

    pub fn get_plan(&self, id: &str) -> Result<PlanRecord, ManagerError> {
        Ok(self.storage.load_plan(id)?)
    }

    /// Replaces the sections of a stored plan with reviewed ones.
    pub fn update_sections(&self, id: &str, sections: Vec<SectionPlan>) -> Result<PlanRecord, ManagerError> {
        if sections.is_empty() {
            return Err(ManagerError::NoSections);
        }
        let mut record = self.storage.load_plan(id)?;
        record.plan.sections = sections;
        record.plan.recount();
        self.storage.save_plan(&record)?;
        info!(plan_id = %id, sections = record.plan.sections.len(), "plan sections updated");
        Ok(record)
    }

    pub fn list_plans(&self) -> Result<Vec<PlanSummary>, ManagerError> {
        Ok(self.storage.list_plans()?)
    }

    pub fn delete_plan(&self, id: &str) -> Result<(), ManagerError> {
        Ok(self.storage.delete_plan(id)?)
    }

    /// Records an executed plan. The slide count is the body sections plus
    /// the title and closing slides.
    pub fn record_execution(&self, plan: &PlanRecord, report: &ExecutionReport) -> Result<ReportRecord, ManagerError> {
        let record = ReportRecord {
            id: Uuid::new_v4().to_string(),
            plan_id: plan.id.clone(),
            created_at: Utc::now(),
            title: plan.query.clone(),
            template: plan.template.clone(),
            slides_generated: plan.plan.sections.len() + 2,
            execution_time: report.execution_time,
            deck_path: report.output_path.clone(),
            log_path: report.log_path.clone(),
        };
        self.storage.save_report(&record)?;
        info!(report_id = %record.id, plan_id = %plan.id, "report stored");
        Ok(record)
    }

    pub fn get_report(&self, id: &str) -> Result<ReportRecord, ManagerError> {
        Ok(self.storage.load_report(id)?)
    }

    pub fn list_reports(&self) -> Result<Vec<ReportRecord>, ManagerError> {
        Ok(self.storage.list_reports()?)
    }

    pub fn delete_report(&self, id: &str) -> Result<(), ManagerError> {
        Ok(self.storage.delete_report(id)?)
    }
}

/// Errors that can occur in DeckManager operations.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("A plan needs at least one section")]
    NoSections,
}

impl ManagerError {
    /// Whether the error means the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManagerError::Storage(StorageError::PlanNotFound(_) | StorageError::ReportNotFound(_))
        )
    }
}
