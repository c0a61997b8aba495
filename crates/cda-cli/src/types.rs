use std::path::PathBuf;

use cda_model::{RunReport, ValidationSummary};

/// What one `transform` or `validate` invocation produced, for rendering.
#[derive(Debug)]
pub struct RunOutcome {
    pub summary: ValidationSummary,
    pub run: RunReport,
    /// Directory ndjson files were written to; absent on dry runs and
    /// validate-only invocations.
    pub output_dir: Option<PathBuf>,
    pub written: Vec<PathBuf>,
}

impl RunOutcome {
    pub fn has_findings(&self) -> bool {
        self.summary.has_dangling()
    }
}
