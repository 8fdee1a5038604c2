//! Server scaffolding: entry point, package manifest, environment,
//! compose files and role grants.

use eyre::Result;
use keel_pipeline::{ExecutionContext, catalog};
use serde_json::{Map, Value, json};

use super::input;
use crate::{
    CodeBuilder,
    inputs::{ComposeInput, DotEnvInput, PackageJsonInput, ServerInput},
};

pub(super) fn server(ctx: &mut ExecutionContext) -> Result<()> {
    let server: ServerInput = input(ctx)?;

    let main = CodeBuilder::typescript()
        .import(&["Logger", "ValidationPipe"], "@nestjs/common")
        .import(&["NestFactory"], "@nestjs/core")
        .import(&["AppModule"], "./app.module")
        .blank()
        .line("const { PORT = 3000 } = process.env;")
        .blank()
        .braces("async function main()", |b| {
            b.line("const app = await NestFactory.create(AppModule, { cors: true });")
                .line("app.setGlobalPrefix(\"api\");")
                .line("app.useGlobalPipes(new ValidationPipe({ transform: true }));")
                .line("await app.listen(PORT);")
                .line(&format!(
                    "Logger.log(`{} listening on port ${{PORT}}`);",
                    server.name
                ))
                .line("return app;")
        })
        .blank()
        .line("module.exports = main();")
        .build();
    ctx.emit("src/main.ts", main)?;

    let app_module = CodeBuilder::typescript()
        .import(&["Module"], "@nestjs/common")
        .import(&["PrismaService"], "./prisma/prisma.service")
        .blank()
        .line("@Module({")
        .indent()
        .line("providers: [PrismaService],")
        .line("exports: [PrismaService],")
        .dedent()
        .line("})")
        .line("export class AppModule {}")
        .build();
    ctx.emit("src/app.module.ts", app_module)?;

    let prisma = CodeBuilder::typescript()
        .import(&["Injectable", "OnModuleInit", "INestApplication"], "@nestjs/common")
        .import(&["PrismaClient"], "@prisma/client")
        .blank()
        .line("@Injectable()")
        .braces(
            "export class PrismaService extends PrismaClient implements OnModuleInit",
            |b| {
                b.braces("async onModuleInit()", |b| b.line("await this.$connect();"))
                    .blank()
                    .braces("async enableShutdownHooks(app: INestApplication)", |b| {
                        b.line("process.on(\"beforeExit\", async () => {")
                            .indent()
                            .line("await app.close();")
                            .dedent()
                            .line("});")
                    })
            },
        )
        .build();
    ctx.emit("src/prisma/prisma.service.ts", prisma)?;
    Ok(())
}

pub(super) fn package_json(ctx: &mut ExecutionContext) -> Result<()> {
    let server: ServerInput = ctx.payload_as(catalog::CREATE_SERVER)?;
    let package: PackageJsonInput = input(ctx)?;

    let to_object = |map: &indexmap::IndexMap<String, String>| {
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect::<Map<_, _>>()
    };

    let mut manifest = json!({
        "name": server.name,
        "version": server.version,
        "private": true,
    });
    if let Some(description) = &server.description {
        manifest["description"] = json!(description);
    }
    manifest["scripts"] = Value::Object(to_object(&package.scripts));
    manifest["dependencies"] = Value::Object(to_object(&package.dependencies));
    manifest["devDependencies"] = Value::Object(to_object(&package.dev_dependencies));

    let mut content = serde_json::to_string_pretty(&manifest)?;
    content.push('\n');
    ctx.emit("package.json", content)?;
    Ok(())
}

pub(super) fn dot_env(ctx: &mut ExecutionContext) -> Result<()> {
    let env: DotEnvInput = input(ctx)?;
    let content = CodeBuilder::new(Default::default())
        .lines(env.vars.iter().map(|(key, value)| format!("{key}={value}")))
        .build();
    ctx.emit(".env", content)?;
    Ok(())
}

pub(super) fn docker_compose(ctx: &mut ExecutionContext) -> Result<()> {
    let compose: ComposeInput = input(ctx)?;
    let db = &compose.database;

    let content = CodeBuilder::yaml()
        .line("version: \"3\"")
        .block("services:", |b| {
            b.block(&format!("{}:", compose.service), |b| {
                b.line("build:")
                    .indent()
                    .line("context: .")
                    .dedent()
                    .line("ports:")
                    .line(&format!("  - ${{PORT}}:{}", compose.port))
                    .line("env_file: .env")
                    .line("environment:")
                    .line(&format!("  DB_URL: {}", db.url("db")))
                    .line("depends_on:")
                    .line("  - migrate")
                    .line("restart: on-failure")
            })
            .block("migrate:", |b| {
                b.line("build:")
                    .indent()
                    .line("context: .")
                    .dedent()
                    .line("command: npm run db:init")
                    .line("env_file: .env")
                    .line("depends_on:")
                    .line("  - db")
            })
        })
        .build();
    ctx.emit("docker-compose.yml", content)?;
    Ok(())
}

pub(super) fn docker_compose_db(ctx: &mut ExecutionContext) -> Result<()> {
    let compose: ComposeInput = input(ctx)?;
    ctx.emit("docker-compose.db.yml", render_compose_db(&compose))?;
    Ok(())
}

/// `docker-compose.db.yml` for the database in `compose`.
pub(crate) fn render_compose_db(compose: &ComposeInput) -> String {
    let db = &compose.database;

    let (prefix, data_dir) = match db.kind.as_str() {
        "mysql" => ("MYSQL", "/var/lib/mysql"),
        _ => ("POSTGRES", "/var/lib/postgresql/data"),
    };
    let volume = db.kind.as_str();

    CodeBuilder::yaml()
        .line("version: \"3\"")
        .block("services:", |b| {
            b.block("db:", |b| {
                b.line(&format!("image: {}", db.image))
                    .line("ports:")
                    .line(&format!("  - ${{DB_PORT}}:{}", db.port))
                    .line("environment:")
                    .line(&format!("  {prefix}_USER: {}", db.user))
                    .line(&format!("  {prefix}_PASSWORD: {}", db.password))
                    .line(&format!(
                        "  {prefix}_{}: {}",
                        if prefix == "MYSQL" { "DATABASE" } else { "DB" },
                        db.name
                    ))
                    .line("volumes:")
                    .line(&format!("  - {volume}:{data_dir}"))
            })
        })
        .block("volumes:", |b| b.line(&format!("{volume}: ~")))
        .build()
}

pub(super) fn auth_roles(ctx: &mut ExecutionContext) -> Result<()> {
    let server: ServerInput = input(ctx)?;
    let auth = &server.auth;

    let roles = auth
        .roles
        .iter()
        .map(|r| format!("\"{r}\""))
        .collect::<Vec<_>>()
        .join(", ");

    let content = CodeBuilder::typescript()
        .line(&format!("export const AUTH_PROVIDER = \"{}\";", auth.provider))
        .blank()
        .line(&format!("export const ROLES = [{roles}] as const;"))
        .blank()
        .line("export type Role = (typeof ROLES)[number];")
        .blank()
        .block_with_close("export const GRANTS = [", "];", |b| {
            b.each(&auth.grants, |b, grant| {
                b.line(&format!(
                    "{{ role: \"{}\", resource: \"{}\", action: \"{}:any\", attributes: \"*\" }},",
                    grant.role, grant.resource, grant.action
                ))
            })
        })
        .build();
    ctx.emit("src/auth/roles.ts", content)?;
    Ok(())
}
