use indexmap::IndexMap;
use keel_core::toml_value_to_string;
use keel_pipeline::{Hooks, Plugin, catalog, error::SubscribeError, handler_fn};
use keel_schema::PluginConfig;

use super::update_payload;
use crate::{
    error::{CodegenError, Result},
    inputs::DotEnvInput,
};

/// Adds variables to the generated `.env`.
///
/// ```toml
/// [plugins.dotenv.vars]
/// JWT_EXPIRATION = "10d"
/// ```
#[derive(Debug, Clone, Default)]
pub struct DotEnv {
    vars: IndexMap<String, String>,
}

impl DotEnv {
    pub fn new(vars: IndexMap<String, String>) -> Self {
        Self { vars }
    }

    pub fn from_config(config: &PluginConfig) -> Result<Self> {
        let Some(value) = config.settings.get("vars") else {
            return Ok(Self::default());
        };
        let table = value
            .as_table()
            .ok_or_else(|| CodegenError::InvalidPluginConfig {
                plugin: "dotenv".to_string(),
                message: "`vars` must be a table".to_string(),
            })?;

        let mut vars = IndexMap::new();
        for (key, value) in table {
            if value.is_table() || value.is_array() {
                return Err(CodegenError::InvalidPluginConfig {
                    plugin: "dotenv".to_string(),
                    message: format!("`vars.{key}` must be a string, number or boolean"),
                });
            }
            vars.insert(key.clone(), toml_value_to_string(value));
        }
        Ok(Self { vars })
    }

    pub fn vars(&self) -> &IndexMap<String, String> {
        &self.vars
    }
}

impl Plugin for DotEnv {
    fn name(&self) -> &str {
        "dotenv"
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> std::result::Result<(), SubscribeError> {
        let vars = self.vars.clone();
        hooks.before(
            catalog::CREATE_SERVER_DOT_ENV,
            handler_fn(move |ctx| {
                update_payload(ctx, catalog::CREATE_SERVER_DOT_ENV, |env: &mut DotEnvInput| {
                    env.vars
                        .extend(vars.iter().map(|(k, v)| (k.clone(), v.clone())));
                })
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config() {
        let config: PluginConfig = toml::from_str(
            r#"
            [vars]
            JWT_EXPIRATION = "10d"
            BCRYPT_SALT = 10
            "#,
        )
        .unwrap();
        let plugin = DotEnv::from_config(&config).unwrap();
        let vars: Vec<_> = plugin
            .vars()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        assert_eq!(vars, vec!["JWT_EXPIRATION=10d", "BCRYPT_SALT=10"]);
    }

    #[test]
    fn test_rejects_nested_values() {
        let config: PluginConfig = toml::from_str("vars = { A = [1, 2] }").unwrap();
        let err = DotEnv::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("`vars.A` must be"));
    }
}
