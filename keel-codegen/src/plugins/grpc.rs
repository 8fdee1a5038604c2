use keel_pipeline::{Hooks, Plugin, catalog, error::SubscribeError, handler_fn};
use keel_schema::{FieldType, PluginConfig};

use super::update_payload;
use crate::{
    CodeBuilder,
    error::{CodegenError, Result},
    inputs::{DotEnvInput, EntitiesInput, EntityInput, FieldInput, PackageJsonInput, ServerInput},
};

const DEFAULT_URL_ENV: &str = "GRPC_CLIENT_URL_PATH";
const DEFAULT_URL: &str = "localhost:9090";

/// Exposes every entity over gRPC: a client options module and one `.proto`
/// per entity.
///
/// ```toml
/// [plugins.grpc]
/// url_env = "GRPC_URL"
/// ```
#[derive(Debug, Clone)]
pub struct Grpc {
    url_env: String,
}

impl Default for Grpc {
    fn default() -> Self {
        Self {
            url_env: DEFAULT_URL_ENV.to_string(),
        }
    }
}

impl Grpc {
    pub fn from_config(config: &PluginConfig) -> Result<Self> {
        match config.settings.get("url_env") {
            None => Ok(Self::default()),
            Some(value) => {
                let url_env = value
                    .as_str()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| CodegenError::InvalidPluginConfig {
                        plugin: "grpc".to_string(),
                        message: "`url_env` must be a non-empty string".to_string(),
                    })?;
                Ok(Self {
                    url_env: url_env.to_string(),
                })
            }
        }
    }

    pub fn url_env(&self) -> &str {
        &self.url_env
    }
}

impl Plugin for Grpc {
    fn name(&self) -> &str {
        "grpc"
    }

    fn subscribe(&self, hooks: &mut Hooks<'_>) -> std::result::Result<(), SubscribeError> {
        let url_env = self.url_env.clone();
        hooks.after(
            catalog::CREATE_SERVER,
            handler_fn(move |ctx| {
                let server: ServerInput = ctx.payload_as(catalog::CREATE_SERVER)?;
                ctx.emit(
                    "src/grpc.client.options.ts",
                    render_client_options(&server.entities, &url_env),
                )?;
                Ok(())
            }),
        )?;

        hooks.after(
            catalog::CREATE_ENTITY_CONTROLLER,
            handler_fn(|ctx| {
                let input: EntitiesInput =
                    ctx.inherited_payload_as(catalog::CREATE_ENTITY_CONTROLLER)?;
                for entity in &input.entities {
                    ctx.emit(
                        format!("{}/{}/{}.proto", input.src_dir, entity.file, entity.file),
                        render_proto(entity),
                    )?;
                }
                Ok(())
            }),
        )?;

        let url_env = self.url_env.clone();
        hooks.before(
            catalog::CREATE_SERVER_DOT_ENV,
            handler_fn(move |ctx| {
                update_payload(ctx, catalog::CREATE_SERVER_DOT_ENV, |env: &mut DotEnvInput| {
                    env.vars
                        .entry(url_env.clone())
                        .or_insert_with(|| DEFAULT_URL.to_string());
                })
            }),
        )?;

        hooks.before(
            catalog::CREATE_SERVER_PACKAGE_JSON,
            handler_fn(|ctx| {
                update_payload(
                    ctx,
                    catalog::CREATE_SERVER_PACKAGE_JSON,
                    |pkg: &mut PackageJsonInput| {
                        for (name, version) in [
                            ("@grpc/grpc-js", "^1.9.0"),
                            ("@grpc/proto-loader", "^0.7.10"),
                            ("@nestjs/microservices", "^10.2.0"),
                        ] {
                            pkg.dependencies
                                .entry(name.to_string())
                                .or_insert_with(|| version.to_string());
                        }
                    },
                )
            }),
        )?;

        Ok(())
    }
}

fn render_client_options(entities: &[EntityInput], url_env: &str) -> String {
    let packages = entities
        .iter()
        .map(|e| format!("\"{}\"", e.file))
        .collect::<Vec<_>>()
        .join(", ");
    let protos: Vec<String> = entities
        .iter()
        .map(|e| format!("\"src/{}/{}.proto\",", e.file, e.file))
        .collect();

    CodeBuilder::typescript()
        .import(&["ClientOptions", "Transport"], "@nestjs/microservices")
        .import(&["ConfigService"], "@nestjs/config")
        .blank()
        .line("const configService: ConfigService = new ConfigService();")
        .blank()
        .block_with_close("export const grpcClientOptions: ClientOptions = {", "};", |b| {
            b.line("transport: Transport.GRPC,").block_with_close("options: {", "},", |b| {
                b.line(&format!("package: [{packages}],"))
                    .block_with_close("protoPath: [", "],", |b| b.lines(&protos))
                    .line(&format!("url: configService.get<string>(\"{url_env}\"),"))
            })
        })
        .build()
}

fn proto_type(field: &FieldInput) -> &'static str {
    match field.kind {
        FieldType::Int => "int32",
        FieldType::Float => "double",
        FieldType::Bool => "bool",
        _ => "string",
    }
}

/// The message fields of an entity: scalars plus foreign keys, in
/// declaration order.
fn proto_fields(entity: &EntityInput) -> Vec<(String, &'static str)> {
    entity
        .fields
        .iter()
        .filter_map(|field| match field.kind {
            FieldType::Lookup => field.foreign_key().map(|fk| (fk, "string")),
            _ => Some((field.name.clone(), proto_type(field))),
        })
        .collect()
}

fn render_proto(entity: &EntityInput) -> String {
    let name = &entity.name;
    let fields = proto_fields(entity);
    let id = entity.id_name();

    let message = |b: CodeBuilder, header: &str, fields: &[(String, &'static str)]| {
        b.braces(&format!("message {header}"), |b| {
            b.each(fields.iter().enumerate(), |b, (i, (field, ty))| {
                b.line(&format!("{ty} {field} = {};", i + 1))
            })
        })
    };

    let b = CodeBuilder::proto()
        .line("syntax = \"proto3\";")
        .blank()
        .line(&format!("package {};", entity.file))
        .blank()
        .braces(&format!("service {name}Service"), |b| {
            b.line(&format!("rpc create{name} ({name}CreateInput) returns ({name}) {{}}"))
                .line(&format!(
                    "rpc {} ({name}FindManyParams) returns (stream {name}) {{}}",
                    entity.plural_camel()
                ))
                .line(&format!(
                    "rpc {} ({name}WhereUniqueInput) returns ({name}) {{}}",
                    entity.file
                ))
                .line(&format!("rpc update{name} ({name}UpdateInput) returns ({name}) {{}}"))
                .line(&format!(
                    "rpc delete{name} ({name}WhereUniqueInput) returns ({name}) {{}}"
                ))
        })
        .blank();

    let inputs: Vec<(String, &'static str)> = fields
        .iter()
        .filter(|(field, _)| field != id)
        .cloned()
        .collect();
    let mut update = vec![(id.to_string(), "string")];
    update.extend(inputs.iter().cloned());

    let b = message(b, name, &fields).blank();
    let b = message(b, &format!("{name}CreateInput"), &inputs).blank();
    let b = message(b, &format!("{name}UpdateInput"), &update).blank();
    let b = message(
        b,
        &format!("{name}WhereUniqueInput"),
        &[(id.to_string(), "string")],
    )
    .blank();
    message(
        b,
        &format!("{name}FindManyParams"),
        &[("skip".to_string(), "int32"), ("take".to_string(), "int32")],
    )
    .build()
}
