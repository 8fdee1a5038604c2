//! Info command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from data model info.
#[derive(Debug)]
pub struct InfoReport {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
    pub schema_path: PathBuf,
    pub database: String,
    pub port: u16,
    pub auth_provider: String,
    pub roles: Vec<String>,
    pub entities: Vec<EntityInfo>,
    pub broker: Option<BrokerInfo>,
    pub plugins: Vec<String>,
}

#[derive(Debug)]
pub struct EntityInfo {
    pub name: String,
    pub fields: usize,
    /// Lookup targets, `field -> Target`
    pub relations: Vec<String>,
}

#[derive(Debug)]
pub struct BrokerInfo {
    pub name: String,
    pub topics: Vec<String>,
}

impl Report for InfoReport {
    fn render(&self, out: &mut dyn Output) {
        out.preformatted(&format!("{} v{}", self.name, self.version));
        if let Some(desc) = &self.description {
            out.preformatted(desc);
        }
        out.newline();

        out.key_value("Schema", &self.schema_path.display().to_string());
        out.key_value("Database", &self.database);
        out.key_value("Port", &self.port.to_string());
        out.key_value("Auth", &self.auth_provider);
        if !self.roles.is_empty() {
            out.key_value_indented("roles", &self.roles.join(", "));
        }
        out.newline();

        out.section(&format!("Entities ({})", self.entities.len()));
        for entity in &self.entities {
            out.list_item(&format!(
                "{} ({} field{})",
                entity.name,
                entity.fields,
                if entity.fields == 1 { "" } else { "s" }
            ));
            for relation in &entity.relations {
                out.preformatted(&format!("      {}", relation));
            }
        }

        if let Some(broker) = &self.broker {
            out.newline();
            out.section(&format!("Message broker ({})", broker.name));
            for topic in &broker.topics {
                out.list_item(topic);
            }
        }

        if !self.plugins.is_empty() {
            out.newline();
            out.section("Plugins");
            for plugin in &self.plugins {
                out.list_item(plugin);
            }
        }
    }
}
