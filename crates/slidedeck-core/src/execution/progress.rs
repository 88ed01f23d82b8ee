use serde::{Deserialize, Serialize};

/// Pipeline stage reported while a deck is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Analyzing,
    Planning,
    Searching,
    Generating,
    Rendering,
    Complete,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Analyzing => "analyzing",
            Stage::Planning => "planning",
            Stage::Searching => "searching",
            Stage::Generating => "generating",
            Stage::Rendering => "rendering",
            Stage::Complete => "complete",
        }
    }

    /// Human-readable status line.
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Analyzing => "Analyzing template layouts",
            Stage::Planning => "Planning sections",
            Stage::Searching => "Researching facts",
            Stage::Generating => "Generating slide content",
            Stage::Rendering => "Writing presentation",
            Stage::Complete => "Done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
