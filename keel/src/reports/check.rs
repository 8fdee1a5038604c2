//! Check command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from data model validation.
///
/// Structural errors never reach this report: the model failed to parse and
/// miette already rendered them.
#[derive(Debug)]
pub struct CheckReport {
    pub schema_path: PathBuf,
    pub app_name: String,
    pub app_version: String,
    /// Lint warnings, with their location.
    pub warnings: Vec<String>,
    pub infos: Vec<String>,
    pub entity_count: usize,
    pub plugins: Vec<String>,
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        for warning in &self.warnings {
            out.warning(warning);
        }
        for info in &self.infos {
            out.preformatted(&format!("info: {}", info));
        }
        if !self.warnings.is_empty() || !self.infos.is_empty() {
            out.newline();
        }

        out.preformatted(&format!("✓ {} is valid", self.schema_path.display()));
        out.newline();
        out.preformatted(&format!("  {} v{}", self.app_name, self.app_version));
        out.preformatted(&format!(
            "  {} entit{}",
            self.entity_count,
            if self.entity_count == 1 { "y" } else { "ies" }
        ));
        if !self.plugins.is_empty() {
            out.preformatted(&format!("  plugins: {}", self.plugins.join(", ")));
        }
    }
}
