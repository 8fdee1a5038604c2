//! Lints over a validated data model.
//!
//! Lints never reject a model. They produce [`Diagnostic`]s that `keel check`
//! and `keel generate` print as warnings.

use serde::Serialize;

use crate::{DataModel, FieldType};

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Severity {
    /// A warning that doesn't prevent generation but should be addressed.
    Warning,
    /// Informational message.
    Info,
}

impl Severity {
    /// Returns true if this is a warning severity.
    pub fn is_warning(&self) -> bool {
        matches!(self, Severity::Warning)
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A diagnostic message produced by a lint.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// The lint that produced this diagnostic.
    pub lint: String,
    pub message: String,
    /// Optional location in the data model (e.g., "entities.Task").
    pub location: Option<String>,
}

impl Diagnostic {
    /// Create a new warning diagnostic.
    pub fn warning(lint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            lint: lint.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Create a new info diagnostic.
    pub fn info(lint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            lint: lint.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Add a location to this diagnostic.
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)?;
        if let Some(loc) = &self.location {
            write!(f, " (at {})", loc)?;
        }
        Ok(())
    }
}

/// A lint that checks the data model for issues.
pub trait Lint: Send + Sync {
    /// The name of this lint.
    fn name(&self) -> &'static str;

    /// Check the model and add any diagnostics.
    fn check(&self, model: &DataModel, diagnostics: &mut Vec<Diagnostic>);
}

/// Warns about entities without a description.
pub struct MissingDescriptionLint;

impl Lint for MissingDescriptionLint {
    fn name(&self) -> &'static str {
        "missing-description"
    }

    fn check(&self, model: &DataModel, diagnostics: &mut Vec<Diagnostic>) {
        for (name, entity) in &model.entities {
            let empty = entity
                .description
                .as_deref()
                .is_none_or(|d| d.trim().is_empty());
            if empty {
                diagnostics.push(
                    Diagnostic::warning(
                        self.name(),
                        format!("entity '{}' has no description", name),
                    )
                    .at(format!("entities.{}", name)),
                );
            }
        }
    }
}

/// Warns about entities nobody is allowed to access.
pub struct MissingPermissionsLint;

impl Lint for MissingPermissionsLint {
    fn name(&self) -> &'static str {
        "missing-permissions"
    }

    fn check(&self, model: &DataModel, diagnostics: &mut Vec<Diagnostic>) {
        for (name, entity) in &model.entities {
            if entity.permissions.is_empty() {
                diagnostics.push(
                    Diagnostic::warning(
                        self.name(),
                        format!("entity '{}' grants no permissions to any role", name),
                    )
                    .at(format!("entities.{}.permissions", name)),
                );
            }
        }
    }
}

/// Warns about entities that only carry their id.
pub struct EmptyEntityLint;

impl Lint for EmptyEntityLint {
    fn name(&self) -> &'static str {
        "empty-entity"
    }

    fn check(&self, model: &DataModel, diagnostics: &mut Vec<Diagnostic>) {
        for (name, entity) in &model.entities {
            if entity.fields.values().all(|f| f.ty == FieldType::Id) {
                diagnostics.push(
                    Diagnostic::warning(self.name(), format!("entity '{}' has no fields", name))
                        .at(format!("entities.{}.fields", name)),
                );
            }
        }
    }
}

/// The default lint set.
pub fn default_lints() -> Vec<Box<dyn Lint>> {
    vec![
        Box::new(MissingDescriptionLint),
        Box::new(MissingPermissionsLint),
        Box::new(EmptyEntityLint),
    ]
}

/// Run the default lints over a model.
pub fn lint(model: &DataModel) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for lint in default_lints() {
        lint.check(model, &mut diagnostics);
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_str;

    #[test]
    fn test_clean_model_has_no_diagnostics() {
        let model = parse_str(
            r#"
            [app]
            name = "tasks"

            [auth]
            roles = ["user"]

            [entities.Task]
            description = "A unit of work"

            [entities.Task.fields.title]
            type = "text"

            [entities.Task.permissions]
            read = ["user"]
            "#,
        )
        .unwrap();

        assert!(lint(&model).is_empty());
    }

    #[test]
    fn test_bare_entity_warnings() {
        let model = parse_str(
            r#"
            [app]
            name = "tasks"

            [entities.Task]
            "#,
        )
        .unwrap();

        let diagnostics = lint(&model);
        let lints: Vec<_> = diagnostics.iter().map(|d| d.lint.as_str()).collect();

        assert_eq!(
            lints,
            vec!["missing-description", "missing-permissions", "empty-entity"]
        );
        assert!(diagnostics.iter().all(|d| d.severity.is_warning()));
        assert_eq!(diagnostics[0].location.as_deref(), Some("entities.Task"));
    }

    #[test]
    fn test_diagnostic_display() {
        let diag =
            Diagnostic::warning("empty-entity", "entity 'Task' has no fields").at("entities.Task");
        assert_eq!(
            diag.to_string(),
            "warning: entity 'Task' has no fields (at entities.Task)"
        );
    }
}
