//! Data model types deserialized from `keel.toml`.

use indexmap::IndexMap;
use keel_core::pluralize;
use serde::{Deserialize, Serialize};

/// Root of a resolved data model.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DataModel {
    /// Application metadata
    pub app: AppConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication and the roles permissions may reference
    #[serde(default)]
    pub auth: AuthConfig,

    /// Entities in declaration order
    #[serde(default)]
    pub entities: IndexMap<String, Entity>,

    /// Optional message broker
    #[serde(default)]
    pub message_broker: Option<MessageBroker>,

    /// Enabled plugins in declaration order
    #[serde(default)]
    pub plugins: IndexMap<String, PluginConfig>,
}

impl DataModel {
    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.get(name)
    }

    /// Plugins whose `enabled` flag is set, in declaration order.
    pub fn enabled_plugins(&self) -> impl Iterator<Item = (&str, &PluginConfig)> {
        self.plugins
            .iter()
            .filter(|(_, cfg)| cfg.enabled)
            .map(|(id, cfg)| (id.as_str(), cfg))
    }

    /// Fill derived data after parsing: entity names from their table keys
    /// and an implicit `id` field for entities that don't declare one.
    pub(crate) fn resolve(&mut self) {
        for (name, entity) in self.entities.iter_mut() {
            entity.name = name.clone();
            if entity.id_field().is_none() && !entity.fields.contains_key("id") {
                entity.fields.shift_insert(0, "id".to_string(), Field::id());
            }
        }
    }
}

/// Application metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application name, used for package names and service identifiers
    pub name: String,

    /// Version string
    #[serde(default = "default_version")]
    pub version: String,

    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

/// Server settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub database: Database,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database: Database::default(),
            port: default_port(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

/// Supported databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    #[default]
    Postgres,
    Mysql,
}

impl Database {
    /// Prisma datasource provider name.
    pub fn prisma_provider(&self) -> &'static str {
        match self {
            Database::Postgres => "postgresql",
            Database::Mysql => "mysql",
        }
    }

    /// Default TCP port of the database server.
    pub fn default_port(&self) -> u16 {
        match self {
            Database::Postgres => 5432,
            Database::Mysql => 3306,
        }
    }

    /// Container image used for local development.
    pub fn image(&self) -> &'static str {
        match self {
            Database::Postgres => "postgres:15",
            Database::Mysql => "mysql:8",
        }
    }
}

impl std::fmt::Display for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Database::Postgres => write!(f, "postgres"),
            Database::Mysql => write!(f, "mysql"),
        }
    }
}

/// Authentication settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    #[serde(default)]
    pub provider: AuthProvider,

    /// Roles that permissions may grant
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Authentication strategy of the generated server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Jwt,
    Basic,
}

/// An entity (one table/model in the generated service).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    /// Entity name, filled from the table key
    #[serde(skip_deserializing)]
    pub name: String,

    /// Plural display name (derived when absent)
    #[serde(default)]
    pub plural: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub fields: IndexMap<String, Field>,

    #[serde(default)]
    pub permissions: Permissions,
}

impl Entity {
    /// The plural name, either declared or derived from the entity name.
    pub fn plural_name(&self) -> String {
        self.plural
            .clone()
            .unwrap_or_else(|| pluralize(&self.name))
    }

    /// The name and definition of the id field, if any.
    pub fn id_field(&self) -> Option<(&str, &Field)> {
        self.fields
            .iter()
            .find(|(_, f)| f.ty == FieldType::Id)
            .map(|(name, f)| (name.as_str(), f))
    }

    /// Lookup fields with their targets.
    pub fn relations(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields
            .iter()
            .filter(|(_, f)| f.ty == FieldType::Lookup)
            .map(|(name, f)| (name.as_str(), f))
    }
}

/// A field of an entity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Field {
    #[serde(rename = "type")]
    pub ty: FieldType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub unique: bool,

    #[serde(default)]
    pub searchable: bool,

    #[serde(default)]
    pub description: Option<String>,

    /// Allowed values of an `option` field
    #[serde(default)]
    pub options: Vec<String>,

    /// Target entity of a `lookup` field
    #[serde(default)]
    pub target: Option<String>,

    /// Whether a `lookup` points at many records
    #[serde(default)]
    pub many: bool,
}

impl Field {
    fn id() -> Self {
        Self {
            ty: FieldType::Id,
            required: true,
            unique: true,
            searchable: false,
            description: None,
            options: Vec::new(),
            target: None,
            many: false,
        }
    }
}

/// Field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Id,
    Text,
    Int,
    Float,
    Bool,
    DateTime,
    Json,
    Option,
    Lookup,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Id => "id",
            FieldType::Text => "text",
            FieldType::Int => "int",
            FieldType::Float => "float",
            FieldType::Bool => "bool",
            FieldType::DateTime => "datetime",
            FieldType::Json => "json",
            FieldType::Option => "option",
            FieldType::Lookup => "lookup",
        }
    }
}

/// Role grants per CRUD action.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Permissions {
    #[serde(default)]
    pub create: Vec<String>,
    #[serde(default)]
    pub read: Vec<String>,
    #[serde(default)]
    pub update: Vec<String>,
    #[serde(default)]
    pub delete: Vec<String>,
}

impl Permissions {
    /// True if no action grants any role.
    pub fn is_empty(&self) -> bool {
        self.actions().all(|(_, roles)| roles.is_empty())
    }

    /// Actions with their granted roles, in CRUD order.
    pub fn actions(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("create", self.create.as_slice()),
            ("read", self.read.as_slice()),
            ("update", self.update.as_slice()),
            ("delete", self.delete.as_slice()),
        ]
        .into_iter()
    }
}

/// Message broker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MessageBroker {
    /// Broker service name
    #[serde(default = "default_broker_name")]
    pub name: String,

    /// Topics the generated service can publish to
    #[serde(default)]
    pub topics: Vec<String>,
}

fn default_broker_name() -> String {
    "kafka".to_string()
}

/// Per-plugin configuration table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PluginConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Every other key of the table, handed to the plugin as is
    #[serde(flatten)]
    pub settings: toml::Table,
}

fn default_enabled() -> bool {
    true
}

impl PluginConfig {
    /// A string setting.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.settings.get(key).and_then(|v| v.as_str())
    }

    /// A nested table setting.
    pub fn get_table(&self, key: &str) -> Option<&toml::Table> {
        self.settings.get(key).and_then(|v| v.as_table())
    }
}
