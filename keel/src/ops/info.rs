//! Info operation - data model summary.

use std::path::Path;

use keel_schema::{AuthProvider, DataModel};

use crate::reports::{BrokerInfo, EntityInfo, InfoReport};

pub fn info(model: &DataModel, schema_path: &Path) -> InfoReport {
    let entities = model
        .entities
        .values()
        .map(|entity| EntityInfo {
            name: entity.name.clone(),
            fields: entity.fields.len(),
            relations: entity
                .relations()
                .map(|(field, f)| {
                    let target = f.target.as_deref().unwrap_or("?");
                    if f.many {
                        format!("{field} -> {target}[]")
                    } else {
                        format!("{field} -> {target}")
                    }
                })
                .collect(),
        })
        .collect();

    InfoReport {
        name: model.app.name.clone(),
        description: model.app.description.clone(),
        version: model.app.version.clone(),
        schema_path: std::fs::canonicalize(schema_path)
            .unwrap_or_else(|_| schema_path.to_path_buf()),
        database: model.server.database.to_string(),
        port: model.server.port,
        auth_provider: match model.auth.provider {
            AuthProvider::Jwt => "jwt",
            AuthProvider::Basic => "basic",
        }
        .to_string(),
        roles: model.auth.roles.clone(),
        entities,
        broker: model.message_broker.as_ref().map(|b| BrokerInfo {
            name: b.name.clone(),
            topics: b.topics.clone(),
        }),
        plugins: model.enabled_plugins().map(|(id, _)| id.to_string()).collect(),
    }
}
