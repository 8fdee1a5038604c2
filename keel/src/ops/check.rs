//! Check operation - data model validation.

use std::path::Path;

use keel_schema::{DataModel, Severity};

use crate::reports::CheckReport;

/// Collect the lints of a model that parsed and validated.
pub fn check(model: &DataModel, schema_path: &Path) -> CheckReport {
    let mut warnings = Vec::new();
    let mut infos = Vec::new();

    for diag in keel_schema::lint(model) {
        let msg = match &diag.location {
            Some(loc) => format!("{}\n  --> {}", diag.message, loc),
            None => diag.message.clone(),
        };
        match diag.severity {
            Severity::Warning => warnings.push(msg),
            Severity::Info => infos.push(msg),
        }
    }

    CheckReport {
        schema_path: schema_path.to_path_buf(),
        app_name: model.app.name.clone(),
        app_version: model.app.version.clone(),
        warnings,
        infos,
        entity_count: model.entities.len(),
        plugins: model.enabled_plugins().map(|(id, _)| id.to_string()).collect(),
    }
}
