//! Parsing and validation of complete data models.

use keel_schema::{Database, Error, FieldType, parse_file, parse_str};

const TASKS: &str = r#"
[app]
name = "task-manager"
version = "1.2.0"
description = "Tracks tasks"

[server]
database = "mysql"
port = 4000

[auth]
roles = ["admin", "user"]

[entities.User]
description = "Someone who does work"

[entities.User.fields.username]
type = "text"
required = true
unique = true

[entities.Task]
plural = "Tasks"

[entities.Task.fields.title]
type = "text"
searchable = true

[entities.Task.fields.status]
type = "option"
options = ["New", "Pending", "Ongoing", "Done"]

[entities.Task.fields.assignedTo]
type = "lookup"
target = "User"

[entities.Task.permissions]
create = ["admin"]
read = ["admin", "user"]

[message_broker]
topics = ["task.created", "task.done"]

[plugins.graphql-only]

[plugins.db-mysql]
enabled = false

[plugins.dotenv]
vars = { SENTRY_DSN = "https://example.invalid" }
"#;

#[test]
fn test_parse_full_model() {
    let model = parse_str(TASKS).expect("model should parse");

    assert_eq!(model.app.name, "task-manager");
    assert_eq!(model.app.version, "1.2.0");
    assert_eq!(model.server.database, Database::Mysql);
    assert_eq!(model.server.port, 4000);

    let names: Vec<_> = model.entities.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["User", "Task"]);

    let task = model.entity("Task").unwrap();
    assert_eq!(task.name, "Task");
    let fields: Vec<_> = task.fields.keys().map(String::as_str).collect();
    assert_eq!(fields, vec!["id", "title", "status", "assignedTo"]);
    assert_eq!(task.fields["status"].ty, FieldType::Option);

    let relations: Vec<_> = task.relations().map(|(name, _)| name).collect();
    assert_eq!(relations, vec!["assignedTo"]);

    let broker = model.message_broker.as_ref().unwrap();
    assert_eq!(broker.name, "kafka");
    assert_eq!(broker.topics.len(), 2);

    let enabled: Vec<_> = model.enabled_plugins().map(|(id, _)| id).collect();
    assert_eq!(enabled, vec!["graphql-only", "dotenv"]);
    let dotenv = &model.plugins["dotenv"];
    assert!(dotenv.get_table("vars").unwrap().contains_key("SENTRY_DSN"));
}

#[test]
fn test_defaults() {
    let model = parse_str(
        r#"
        [app]
        name = "minimal"
        "#,
    )
    .unwrap();

    assert_eq!(model.app.version, "0.1.0");
    assert_eq!(model.server.database, Database::Postgres);
    assert_eq!(model.server.port, 3000);
    assert!(model.entities.is_empty());
    assert!(model.message_broker.is_none());
}

#[test]
fn test_explicit_id_field_is_kept() {
    let model = parse_str(
        r#"
        [app]
        name = "ids"

        [entities.Order.fields.orderId]
        type = "id"
        "#,
    )
    .unwrap();

    let order = model.entity("Order").unwrap();
    assert_eq!(order.id_field().map(|(name, _)| name), Some("orderId"));
    assert_eq!(order.fields.len(), 1);
}

#[test]
fn test_unknown_relation_target() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [entities.Task.fields.owner]
        type = "lookup"
        target = "Person"
        "#,
    )
    .unwrap_err();

    match *err {
        Error::UnknownRelationTarget { target, field, .. } => {
            assert_eq!(target, "Person");
            assert_eq!(field, "owner");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_undeclared_role() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [auth]
        roles = ["admin"]

        [entities.Task.permissions]
        read = ["guest"]
        "#,
    )
    .unwrap_err();

    assert!(matches!(*err, Error::UnknownRole { ref role, .. } if role == "guest"));
}

#[test]
fn test_option_field_needs_options() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [entities.Task.fields.status]
        type = "option"
        "#,
    )
    .unwrap_err();

    assert!(err.to_string().contains("must list its options"));
}

#[test]
fn test_reserved_field_name() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [entities.Task.fields.class]
        type = "text"
        "#,
    )
    .unwrap_err();

    assert!(matches!(*err, Error::ReservedWord { ref name, .. } if name == "class"));
}

#[test]
fn test_invalid_entity_name() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [entities.task-list]
        "#,
    )
    .unwrap_err();

    assert!(matches!(*err, Error::InvalidIdentifier { .. }));
}

#[test]
fn test_unknown_key_is_a_parse_error() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"
        colour = "blue"
        "#,
    )
    .unwrap_err();

    assert!(matches!(*err, Error::Parse { .. }));
}

#[test]
fn test_duplicate_topics() {
    let err = parse_str(
        r#"
        [app]
        name = "broken"

        [message_broker]
        topics = ["a", "a"]
        "#,
    )
    .unwrap_err();

    assert!(err.to_string().contains("duplicate message broker topic"));
}

#[test]
fn test_missing_file() {
    let err = parse_file("definitely/not/here/keel.toml").unwrap_err();
    assert!(matches!(*err, Error::Io { .. }));
}
