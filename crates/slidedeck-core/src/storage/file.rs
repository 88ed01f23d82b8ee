use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::StorageConfig;

use super::error::StorageError;
use super::record::{PlanRecord, PlanSummary, ReportRecord};
use super::Storage;

/// File-based storage implementation.
///
/// One JSON file per record:
/// ```text
/// .slidedeck/
///   plans/{plan-id}.json
///   reports/{report-id}.json
/// ```
pub struct FileStorage {
    config: StorageConfig,
}

impl Default for FileStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FileStorage {
    /// Creates a new FileStorage with the default data directory.
    pub fn new() -> Self {
        Self {
            config: StorageConfig::default(),
        }
    }

    /// Creates a new FileStorage with custom configuration.
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    fn plans_dir(&self) -> PathBuf {
        self.config.plans_path()
    }

    fn reports_dir(&self) -> PathBuf {
        self.config.reports_path()
    }

    /// Path of a record file. Ids never contain path separators.
    fn record_file(dir: &Path, id: &str) -> Result<PathBuf, StorageError> {
        let valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidId(id.to_string()));
        }
        Ok(dir.join(format!("{id}.json")))
    }

    fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
        }
        Ok(())
    }

    fn write_record<T: Serialize>(dir: &Path, id: &str, record: &T) -> Result<(), StorageError> {
        Self::ensure_dir(dir)?;
        let path = Self::record_file(dir, id)?;
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json).map_err(|e| StorageError::io(&path, e))
    }

    /// `Ok(None)` when the record does not exist.
    fn read_record<T: DeserializeOwned>(dir: &Path, id: &str) -> Result<Option<T>, StorageError> {
        let path = Self::record_file(dir, id)?;
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(|e| StorageError::io(&path, e))?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn read_all<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>, StorageError> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut records = Vec::new();
        let entries = fs::read_dir(dir).map_err(|e| StorageError::io(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let parsed = fs::read_to_string(&path)
                .map_err(|e| StorageError::io(&path, e))
                .and_then(|json| serde_json::from_str(&json).map_err(StorageError::from));
            match parsed {
                Ok(record) => records.push(record),
                // Skip unreadable records
                Err(e) => warn!(path = %path.display(), error = %e, "skipping record"),
            }
        }
        Ok(records)
    }

    /// `false` when there was nothing to delete.
    fn remove_record(dir: &Path, id: &str) -> Result<bool, StorageError> {
        let path = Self::record_file(dir, id)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|e| StorageError::io(&path, e))?;
        Ok(true)
    }
}

impl Storage for FileStorage {
    fn save_plan(&self, record: &PlanRecord) -> Result<(), StorageError> {
        Self::write_record(&self.plans_dir(), &record.id, record)
    }

    fn load_plan(&self, id: &str) -> Result<PlanRecord, StorageError> {
        Self::read_record(&self.plans_dir(), id)?.ok_or_else(|| StorageError::PlanNotFound(id.to_string()))
    }

    fn list_plans(&self) -> Result<Vec<PlanSummary>, StorageError> {
        let mut summaries: Vec<PlanSummary> = Self::read_all::<PlanRecord>(&self.plans_dir())?
            .iter()
            .map(PlanRecord::to_summary)
            .collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    fn delete_plan(&self, id: &str) -> Result<(), StorageError> {
        if !Self::remove_record(&self.plans_dir(), id)? {
            return Err(StorageError::PlanNotFound(id.to_string()));
        }
        Ok(())
    }

    fn save_report(&self, record: &ReportRecord) -> Result<(), StorageError> {
        Self::write_record(&self.reports_dir(), &record.id, record)
    }

    fn load_report(&self, id: &str) -> Result<ReportRecord, StorageError> {
        Self::read_record(&self.reports_dir(), id)?
            .ok_or_else(|| StorageError::ReportNotFound(id.to_string()))
    }

    fn list_reports(&self) -> Result<Vec<ReportRecord>, StorageError> {
        let mut reports: Vec<ReportRecord> = Self::read_all(&self.reports_dir())?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    fn delete_report(&self, id: &str) -> Result<(), StorageError> {
        if !Self::remove_record(&self.reports_dir(), id)? {
            return Err(StorageError::ReportNotFound(id.to_string()));
        }
        Ok(())
    }
}
