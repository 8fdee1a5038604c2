//! The standard event catalog.
//!
//! The catalog is append-only: new events are added at the end of
//! [`standard`] and existing names never change, so plugins written against
//! an older [`CATALOG_VERSION`] keep working.

use crate::{EventRegistry, error::RegistryError};

/// Bumped whenever events are appended.
pub const CATALOG_VERSION: u32 = 1;

pub const CREATE_SERVER: &str = "create-server";
pub const CREATE_SERVER_PACKAGE_JSON: &str = "create-server-package-json";
pub const CREATE_SERVER_DOT_ENV: &str = "create-server-dot-env";
pub const CREATE_SERVER_DOCKER_COMPOSE: &str = "create-server-docker-compose";
pub const CREATE_SERVER_DOCKER_COMPOSE_DB: &str = "create-server-docker-compose-db";
pub const CREATE_SERVER_AUTH: &str = "create-server-auth";
pub const CREATE_PRISMA_SCHEMA: &str = "create-prisma-schema";
pub const CREATE_ENTITY_SERVICE: &str = "create-entity-service";
pub const CREATE_ENTITY_SERVICE_BASE: &str = "create-entity-service-base";
pub const CREATE_ENTITY_CONTROLLER: &str = "create-entity-controller";
pub const CREATE_ENTITY_CONTROLLER_BASE: &str = "create-entity-controller-base";
pub const CREATE_ENTITY_RESOLVER: &str = "create-entity-resolver";
pub const CREATE_ENTITY_RESOLVER_BASE: &str = "create-entity-resolver-base";
pub const CREATE_MESSAGE_BROKER: &str = "create-message-broker";
pub const CREATE_MESSAGE_BROKER_TOPICS_ENUM: &str = "create-message-broker-topics-enum";
pub const CREATE_MESSAGE_BROKER_CLIENT_OPTIONS_FACTORY: &str =
    "create-message-broker-client-options-factory";
pub const CREATE_MESSAGE_BROKER_NESTJS_MODULE: &str = "create-message-broker-nestjs-module";
pub const CREATE_MESSAGE_BROKER_SERVICE: &str = "create-message-broker-service";
pub const CREATE_MESSAGE_BROKER_SERVICE_BASE: &str = "create-message-broker-service-base";

/// `(event, parent)` pairs in registration order.
const EVENTS: &[(&str, Option<&str>)] = &[
    (CREATE_SERVER, None),
    (CREATE_SERVER_PACKAGE_JSON, Some(CREATE_SERVER)),
    (CREATE_SERVER_DOT_ENV, Some(CREATE_SERVER)),
    (CREATE_SERVER_DOCKER_COMPOSE, Some(CREATE_SERVER)),
    (CREATE_SERVER_DOCKER_COMPOSE_DB, Some(CREATE_SERVER_DOCKER_COMPOSE)),
    (CREATE_SERVER_AUTH, Some(CREATE_SERVER)),
    (CREATE_PRISMA_SCHEMA, Some(CREATE_SERVER)),
    (CREATE_ENTITY_SERVICE, Some(CREATE_SERVER)),
    (CREATE_ENTITY_SERVICE_BASE, Some(CREATE_ENTITY_SERVICE)),
    (CREATE_ENTITY_CONTROLLER, Some(CREATE_SERVER)),
    (CREATE_ENTITY_CONTROLLER_BASE, Some(CREATE_ENTITY_CONTROLLER)),
    (CREATE_ENTITY_RESOLVER, Some(CREATE_SERVER)),
    (CREATE_ENTITY_RESOLVER_BASE, Some(CREATE_ENTITY_RESOLVER)),
    (CREATE_MESSAGE_BROKER, Some(CREATE_SERVER)),
    (CREATE_MESSAGE_BROKER_TOPICS_ENUM, Some(CREATE_MESSAGE_BROKER)),
    (
        CREATE_MESSAGE_BROKER_CLIENT_OPTIONS_FACTORY,
        Some(CREATE_MESSAGE_BROKER),
    ),
    (CREATE_MESSAGE_BROKER_NESTJS_MODULE, Some(CREATE_MESSAGE_BROKER)),
    (CREATE_MESSAGE_BROKER_SERVICE, Some(CREATE_MESSAGE_BROKER)),
    (
        CREATE_MESSAGE_BROKER_SERVICE_BASE,
        Some(CREATE_MESSAGE_BROKER_SERVICE),
    ),
];

/// Every event name, in registration order.
pub fn event_names() -> impl Iterator<Item = &'static str> {
    EVENTS.iter().map(|(id, _)| *id)
}

/// Build the standard registry.
pub fn standard() -> Result<EventRegistry, RegistryError> {
    let mut registry = EventRegistry::new();
    for (id, parent) in EVENTS {
        match parent {
            Some(parent) => registry.child(*id, *parent)?,
            None => registry.root(*id)?,
        };
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_builds() {
        let registry = standard().unwrap();
        assert_eq!(registry.len(), EVENTS.len());
        assert_eq!(registry.roots(), vec![CREATE_SERVER]);
    }

    // Append-only: existing entries must keep their position.
    #[test]
    fn test_registration_order_is_stable() {
        let names: Vec<_> = event_names().collect();
        assert_eq!(
            &names[..7],
            &[
                "create-server",
                "create-server-package-json",
                "create-server-dot-env",
                "create-server-docker-compose",
                "create-server-docker-compose-db",
                "create-server-auth",
                "create-prisma-schema",
            ]
        );
        assert_eq!(names.len(), 19);
    }

    #[test]
    fn test_catalog_tree() {
        let registry = standard().unwrap();
        insta::assert_snapshot!(registry.tree().to_string(), @r"
        create-server
        ├─ create-server-package-json
        ├─ create-server-dot-env
        ├─ create-server-docker-compose
        │  └─ create-server-docker-compose-db
        ├─ create-server-auth
        ├─ create-prisma-schema
        ├─ create-entity-service
        │  └─ create-entity-service-base
        ├─ create-entity-controller
        │  └─ create-entity-controller-base
        ├─ create-entity-resolver
        │  └─ create-entity-resolver-base
        └─ create-message-broker
           ├─ create-message-broker-topics-enum
           ├─ create-message-broker-client-options-factory
           ├─ create-message-broker-nestjs-module
           └─ create-message-broker-service
              └─ create-message-broker-service-base
        ");
    }
}
