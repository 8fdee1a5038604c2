use keel_pipeline::{Hooks, Plugin, catalog, error::SubscribeError, handler_fn};

use super::update_payload;
use crate::{
    inputs::{ComposeInput, DatabaseInput, DotEnvInput, PrismaInput},
    producers::server::render_compose_db,
};

/// Switches the generated server from PostgreSQL to MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct DbMysql;

impl Plugin for DbMysql {
    fn name(&self) -> &str {
        "db-mysql"
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> Result<(), SubscribeError> {
        hooks.before(
            catalog::CREATE_SERVER_DOCKER_COMPOSE,
            handler_fn(|ctx| {
                update_payload(ctx, catalog::CREATE_SERVER_DOCKER_COMPOSE, |c: &mut ComposeInput| {
                    c.database = mysql(&c.database);
                })
            }),
        )?;

        hooks.replace(
            catalog::CREATE_SERVER_DOCKER_COMPOSE_DB,
            handler_fn(|ctx| {
                let mut compose: ComposeInput =
                    ctx.inherited_payload_as(catalog::CREATE_SERVER_DOCKER_COMPOSE_DB)?;
                compose.database = mysql(&compose.database);
                ctx.emit("docker-compose.db.yml", render_compose_db(&compose))?;
                Ok(())
            }),
        )?;

        hooks.before(
            catalog::CREATE_PRISMA_SCHEMA,
            handler_fn(|ctx| {
                update_payload(ctx, catalog::CREATE_PRISMA_SCHEMA, |p: &mut PrismaInput| {
                    p.provider = "mysql".to_string();
                })
            }),
        )?;

        hooks.before(
            catalog::CREATE_SERVER_DOT_ENV,
            handler_fn(|ctx| {
                let compose: ComposeInput = ctx.payload_as(catalog::CREATE_SERVER_DOCKER_COMPOSE)?;
                let db = mysql(&compose.database);
                update_payload(ctx, catalog::CREATE_SERVER_DOT_ENV, |env: &mut DotEnvInput| {
                    env.vars.insert("DB_URL".into(), db.url("localhost"));
                    env.vars.insert("DB_PORT".into(), db.port.to_string());
                })
            }),
        )?;

        Ok(())
    }
}

/// The MySQL equivalent of `db`, keeping its credentials and name.
fn mysql(db: &DatabaseInput) -> DatabaseInput {
    let defaults = DatabaseInput::for_kind("mysql", &db.name);
    DatabaseInput {
        user: db.user.clone(),
        password: db.password.clone(),
        name: db.name.clone(),
        ..defaults
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_keeps_credentials() {
        let mut pg = DatabaseInput::for_kind("postgres", "tasks");
        pg.password = "secret".into();
        let db = mysql(&pg);
        assert_eq!(db.kind, "mysql");
        assert_eq!(db.port, 3306);
        assert_eq!(db.url("db"), "mysql://admin:secret@db:3306/tasks");
    }
}
