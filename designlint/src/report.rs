//! Run summaries for machine-readable output.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Severity};

/// Finding counts by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    pub errors: usize,
    pub warnings: usize,
    pub infos: usize,
}

impl RunStats {
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut stats = Self::default();
        for d in diagnostics {
            match d.level {
                Severity::Error => stats.errors += 1,
                Severity::Warning => stats.warnings += 1,
                Severity::Info => stats.infos += 1,
            }
        }
        stats
    }

    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}

/// Everything one checking run produced, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub stats: RunStats,
    pub diagnostics: Vec<Diagnostic>,
}

impl RunReport {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            generated_at: Utc::now(),
            stats: RunStats::from_diagnostics(&diagnostics),
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.stats.errors > 0 || self.stats.warnings > 0
    }
}
