//! Structural validation of a parsed data model.
//!
//! Only what generation needs is checked here: names that can become
//! identifiers, relations that resolve, option sets that have values and
//! roles that exist. Domain-level correctness is the data model owner's job.

use indexmap::IndexSet;
use miette::SourceSpan;

use crate::{DataModel, Entity, FieldType, Result, SourceContext};

/// Words that cannot be used as entity or field names because the generated
/// TypeScript would not compile.
pub(crate) const RESERVED_WORDS: &[&str] = &[
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "null", "return", "super", "switch", "this", "throw",
    "true", "try", "typeof", "var", "void", "while", "with", "implements", "interface", "let",
    "package", "private", "protected", "public", "static", "yield", "await",
];

/// Check if a name is a reserved TypeScript word
pub(crate) fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS.contains(&name)
}

/// Validation context that carries source information and the current path
/// through the data model, used for error messages and spans.
#[derive(Debug, Clone)]
pub(crate) struct ParseContext<'a> {
    source: &'a SourceContext,
    path: Vec<&'a str>,
}

impl<'a> ParseContext<'a> {
    pub fn new(source: &'a SourceContext) -> Self {
        Self {
            source,
            path: Vec::new(),
        }
    }

    /// Push a path segment and return a new context.
    pub fn push(&self, segment: &'a str) -> Self {
        let mut path = self.path.clone();
        path.push(segment);
        Self {
            source: self.source,
            path,
        }
    }

    /// Current path as a dot-separated string.
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Context description for error messages, e.g. "field in 'Task'".
    pub fn context_for(&self, kind: &str) -> String {
        if self.path.is_empty() {
            kind.to_string()
        } else {
            format!("{} in '{}'", kind, self.path_string())
        }
    }

    pub fn find_span(&self, name: &str) -> Option<SourceSpan> {
        find_name_span(self.source.src(), name)
    }

    /// Validate that a name can become a generated identifier.
    pub fn validate_name(&self, name: &str, kind: &str) -> Result<()> {
        if is_reserved_word(name) {
            return Err(self.source.reserved_word_error(
                name,
                self.context_for(kind),
                self.find_span(name),
            ));
        }
        if let Some(reason) = validate_identifier(name) {
            return Err(self.source.invalid_identifier_error(
                name,
                self.context_for(kind),
                reason,
                self.find_span(name),
            ));
        }
        Ok(())
    }
}

/// Find the span of a name in the TOML source.
///
/// Searches for patterns like `.name]`, `.name.` or `.name =`, then falls back
/// to the first occurrence anywhere.
pub(crate) fn find_name_span(src: &str, name: &str) -> Option<SourceSpan> {
    let patterns = [
        format!(".{}]", name),
        format!(".{}.", name),
        format!(".{} ", name),
        format!(".{}=", name),
    ];

    for pattern in &patterns {
        if let Some(pos) = src.find(pattern) {
            return Some(SourceSpan::from((pos + 1, name.len())));
        }
    }

    src.find(name)
        .map(|pos| SourceSpan::from((pos, name.len())))
}

/// Returns None if `name` is a valid identifier, Some(reason) otherwise.
pub(crate) fn validate_identifier(name: &str) -> Option<&'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Some("name cannot be empty"),
        Some(c) if c.is_ascii_alphabetic() => {}
        Some(_) => return Some("name must start with a letter"),
    }
    if chars.any(|c| !(c.is_ascii_alphanumeric() || c == '_')) {
        return Some("name must contain only letters, numbers, and underscores");
    }
    None
}

/// Plugin ids are dashed lowercase words, e.g. `db-mysql`.
pub(crate) fn validate_plugin_id(id: &str) -> Option<&'static str> {
    if id.is_empty() {
        return Some("plugin id cannot be empty");
    }
    if !id.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Some("plugin id must start with a lowercase letter");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Some("plugin id may only contain lowercase letters, digits, and dashes");
    }
    if id.ends_with('-') || id.contains("--") {
        return Some("plugin id cannot end with or repeat dashes");
    }
    None
}

/// Validate a whole data model.
pub(crate) fn validate_model(model: &DataModel, source: &SourceContext) -> Result<()> {
    let root = ParseContext::new(source);
    let roles: IndexSet<&str> = model.auth.roles.iter().map(String::as_str).collect();

    let entities = root.push("entities");
    for (name, entity) in &model.entities {
        entities.validate_name(name, "entity")?;
        validate_entity(model, entity, &entities.push(name), &roles)?;
    }

    if let Some(broker) = &model.message_broker {
        let mut seen = IndexSet::new();
        for topic in &broker.topics {
            if topic.trim().is_empty() {
                return Err(source.validation_error(
                    "message broker topics cannot be empty",
                    find_name_span(source.src(), "topics"),
                ));
            }
            if !seen.insert(topic.as_str()) {
                return Err(source.validation_error(
                    format!("duplicate message broker topic '{}'", topic),
                    find_name_span(source.src(), topic),
                ));
            }
        }
    }

    for id in model.plugins.keys() {
        if let Some(reason) = validate_plugin_id(id) {
            return Err(source.invalid_identifier_error(
                id,
                "plugin",
                reason,
                find_name_span(source.src(), id),
            ));
        }
    }

    Ok(())
}

fn validate_entity(
    model: &DataModel,
    entity: &Entity,
    ctx: &ParseContext<'_>,
    roles: &IndexSet<&str>,
) -> Result<()> {
    let source = ctx.source;
    let mut id_fields = 0;

    for (field_name, field) in &entity.fields {
        ctx.validate_name(field_name, "field")?;
        let location = format!("{}.{}", entity.name, field_name);

        if field_name == "id" && field.ty != FieldType::Id {
            return Err(source.validation_error(
                format!("field '{}' is reserved for the id type", location),
                ctx.find_span(field_name),
            ));
        }

        match field.ty {
            FieldType::Id => id_fields += 1,
            FieldType::Option if field.options.is_empty() => {
                return Err(source.validation_error(
                    format!("option field '{}' must list its options", location),
                    ctx.find_span(field_name),
                ));
            }
            FieldType::Lookup => match &field.target {
                None => {
                    return Err(source.validation_error(
                        format!("lookup field '{}' needs a target entity", location),
                        ctx.find_span(field_name),
                    ));
                }
                Some(target) if model.entity(target).is_none() => {
                    return Err(source.unknown_target_error(
                        &entity.name,
                        field_name,
                        target,
                        find_name_span(source.src(), target),
                    ));
                }
                Some(_) => {}
            },
            _ => {}
        }

        if field.ty != FieldType::Lookup && field.target.is_some() {
            return Err(source.validation_error(
                format!("only lookup fields take a target ('{}')", location),
                ctx.find_span(field_name),
            ));
        }
    }

    if id_fields > 1 {
        return Err(source.validation_error(
            format!("entity '{}' declares more than one id field", entity.name),
            ctx.find_span(&entity.name),
        ));
    }

    for (action, granted) in entity.permissions.actions() {
        for role in granted {
            if !roles.contains(role.as_str()) {
                return Err(source.unknown_role_error(
                    role,
                    &entity.name,
                    action,
                    find_name_span(source.src(), role),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert!(validate_identifier("title").is_none());
        assert!(validate_identifier("assignedTo").is_none());
        assert!(validate_identifier("Task").is_none());
        assert!(validate_identifier("field_2").is_none());
    }

    #[test]
    fn test_invalid_identifiers() {
        assert!(validate_identifier("").is_some());
        assert!(validate_identifier("2fast").is_some());
        assert!(validate_identifier("_private").is_some());
        assert!(validate_identifier("my-field").is_some());
        assert!(validate_identifier("has space").is_some());
    }

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("class"));
        assert!(is_reserved_word("delete"));
        assert!(!is_reserved_word("Task"));
    }

    #[test]
    fn test_plugin_ids() {
        assert!(validate_plugin_id("db-mysql").is_none());
        assert!(validate_plugin_id("grpc").is_none());
        assert!(validate_plugin_id("Grpc").is_some());
        assert!(validate_plugin_id("db--mysql").is_some());
        assert!(validate_plugin_id("db-").is_some());
    }

    #[test]
    fn test_find_name_span() {
        let src = "[entities.Task]\nplural = \"Tasks\"\n";
        let span = find_name_span(src, "Task").unwrap();
        assert_eq!(span.offset(), 10);
        assert_eq!(span.len(), 4);
    }

    #[test]
    fn test_context_for() {
        let source = SourceContext::new("", "keel.toml");
        let ctx = ParseContext::new(&source);
        assert_eq!(ctx.context_for("entity"), "entity");
        assert_eq!(
            ctx.push("entities").push("Task").context_for("field"),
            "field in 'entities.Task'"
        );
    }
}
