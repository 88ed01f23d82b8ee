//! Named presentation templates.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::analyzer::{AnalysisExport, TemplateAnalysis};
use crate::config::{TemplateEntry, TemplatesConfig};
use crate::pptx::{blank_template, PptxError, Template, BUILTIN_TEMPLATE_NAME};

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Unknown template: {0}")]
    Unknown(String),

    #[error("Template error: {0}")]
    Pptx(#[from] PptxError),

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What `/api/templates` lists for one entry.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateListing {
    pub caption: String,
    pub file: String,
}

/// Template files configured by name.
///
/// Entries whose file is missing load the built-in template instead, so a
/// fresh checkout works without template files.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    config: TemplatesConfig,
}

impl TemplateRegistry {
    pub fn new(config: TemplatesConfig) -> Self {
        Self { config }
    }

    pub fn list(&self) -> &[TemplateEntry] {
        &self.config.entries
    }

    pub fn names(&self) -> Vec<&str> {
        self.config.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.config.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.config.entries.is_empty()
    }

    pub fn default_name(&self) -> &str {
        &self.config.default
    }

    pub fn listings(&self) -> BTreeMap<String, TemplateListing> {
        self.config
            .entries
            .iter()
            .map(|e| {
                let listing = TemplateListing {
                    caption: e.caption.clone(),
                    file: e.file.clone(),
                };
                (e.name.clone(), listing)
            })
            .collect()
    }

    /// Looks an entry up by name; an empty name means the default.
    pub fn resolve(&self, name: &str) -> Result<&TemplateEntry, TemplateError> {
        let name = if name.trim().is_empty() {
            self.config.default.as_str()
        } else {
            name.trim()
        };
        self.config
            .entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| TemplateError::Unknown(name.to_string()))
    }

    /// Entry at `idx`; out of range selects the first.
    pub fn by_index(&self, idx: usize) -> Option<&TemplateEntry> {
        self.config.entries.get(idx).or_else(|| self.config.entries.first())
    }

    /// Index of `idx` after the out-of-range rule.
    pub fn clamp_index(&self, idx: usize) -> usize {
        if idx < self.config.entries.len() {
            idx
        } else {
            0
        }
    }

    pub fn path_for(&self, entry: &TemplateEntry) -> PathBuf {
        self.config.path_for(entry)
    }

    /// Opens a template by name.
    pub fn load(&self, name: &str) -> Result<Template, TemplateError> {
        if name == BUILTIN_TEMPLATE_NAME {
            return Ok(builtin(BUILTIN_TEMPLATE_NAME)?);
        }
        let entry = self.resolve(name)?;
        self.load_entry(entry)
    }

    pub fn load_entry(&self, entry: &TemplateEntry) -> Result<Template, TemplateError> {
        let path = self.path_for(entry);
        if path.exists() {
            return Ok(Template::open(&path)?);
        }
        warn!(template = %entry.name, path = %path.display(), "template file missing, using built-in layouts");
        Ok(builtin(&entry.name)?)
    }

    /// Analyzes every template; unreadable ones are skipped with a warning.
    pub fn analyze_all(&self) -> BTreeMap<String, AnalysisExport> {
        let mut out = BTreeMap::new();
        for entry in &self.config.entries {
            match self.load_entry(entry) {
                Ok(template) => {
                    let analysis = TemplateAnalysis::analyze(&template);
                    info!(template = %entry.name, layouts = analysis.len(), "template analyzed");
                    out.insert(entry.name.clone(), analysis.export_analysis());
                }
                Err(e) => warn!(template = %entry.name, error = %e, "template analysis failed"),
            }
        }
        out
    }

    /// Writes [`Self::analyze_all`] as pretty JSON.
    pub fn write_analysis(&self, path: &Path) -> Result<usize, TemplateError> {
        let all = self.analyze_all();
        let json = serde_json::to_string_pretty(&all)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| TemplateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, json).map_err(|source| TemplateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(all.len())
    }
}

fn builtin(name: &str) -> Result<Template, PptxError> {
    Template::from_bytes(&blank_template()?, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TemplateRegistry {
        let config = TemplatesConfig {
            dir: "/nonexistent-templates".to_string(),
            ..TemplatesConfig::default()
        };
        TemplateRegistry::new(config)
    }

    #[test]
    fn test_resolve_default_and_unknown() {
        let registry = registry();
        assert_eq!(registry.resolve("").unwrap().name, "Basic");
        assert_eq!(registry.resolve("Ion Boardroom").unwrap().file, "Ion_Boardroom.pptx");
        assert!(matches!(registry.resolve("Nope"), Err(TemplateError::Unknown(_))));
    }

    #[test]
    fn test_index_out_of_range_selects_first() {
        let registry = registry();
        assert_eq!(registry.by_index(99).unwrap().name, "Basic");
        assert_eq!(registry.clamp_index(99), 0);
        assert_eq!(registry.clamp_index(2), 2);
    }

    #[test]
    fn test_missing_file_loads_builtin() {
        let template = registry().load("Basic").unwrap();
        assert_eq!(template.name(), "Basic");
        assert!(!template.layouts().is_empty());
    }

    #[test]
    fn test_listings() {
        let listings = registry().listings();
        assert_eq!(listings.len(), 4);
        assert_eq!(listings["Basic"].file, "Blank.pptx");
    }
}
