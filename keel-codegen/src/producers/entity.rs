//! Per-entity services, REST controllers and GraphQL resolvers.
//!
//! Every file pair follows the same split: `<entity>.<kind>.ts` is a thin
//! subclass meant to be edited by hand, `base/<entity>.<kind>.base.ts` holds
//! the generated implementation.

use eyre::Result;
use keel_core::to_pascal_case;
use keel_pipeline::ExecutionContext;

use super::input;
use crate::{
    CodeBuilder,
    inputs::{EntitiesInput, EntityInput},
};

fn path(input: &EntitiesInput, entity: &EntityInput, kind: &str) -> String {
    format!("{}/{}/{}.{kind}.ts", input.src_dir, entity.file, entity.file)
}

fn base_path(input: &EntitiesInput, entity: &EntityInput, kind: &str) -> String {
    format!(
        "{}/{}/base/{}.{kind}.base.ts",
        input.src_dir, entity.file, entity.file
    )
}

/// The editable subclass of a generated base class.
fn subclass(entity: &EntityInput, kind: &str, decorator: &str, ctor: &[(&str, &str)]) -> String {
    let class = format!("{}{}", entity.name, to_pascal_case(kind));
    let params = ctor
        .iter()
        .map(|(name, ty)| format!("protected readonly {name}: {ty}"))
        .collect::<Vec<_>>()
        .join(", ");
    let args = ctor
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ");

    CodeBuilder::typescript()
        .line(&decorator_import(decorator))
        .each(ctor, |b, (_, ty)| b.line(&ctor_import(entity, ty)))
        .import(
            &[&format!("{class}Base")],
            &format!("./base/{}.{kind}.base", entity.file),
        )
        .blank()
        .line(decorator)
        .braces(&format!("export class {class} extends {class}Base"), |b| {
            b.braces(&format!("constructor({params})"), |b| {
                b.line(&format!("super({args});"))
            })
        })
        .build()
}

fn decorator_import(decorator: &str) -> String {
    if decorator.starts_with("@graphql") {
        "import * as graphql from \"@nestjs/graphql\";".to_string()
    } else if decorator.starts_with("@common") {
        "import * as common from \"@nestjs/common\";".to_string()
    } else {
        "import { Injectable } from \"@nestjs/common\";".to_string()
    }
}

fn ctor_import(entity: &EntityInput, ty: &str) -> String {
    if ty == "PrismaService" {
        "import { PrismaService } from \"../prisma/prisma.service\";".to_string()
    } else {
        format!(
            "import {{ {ty} }} from \"./{}.service\";",
            entity.file
        )
    }
}

pub(super) fn service(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        let content = subclass(
            entity,
            "service",
            "@Injectable()",
            &[("prisma", "PrismaService")],
        );
        ctx.emit(path(&input, entity, "service"), content)?;
    }
    Ok(())
}

pub(super) fn service_base(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        ctx.emit(
            base_path(&input, entity, "service"),
            render_service_base(entity),
        )?;
    }
    Ok(())
}

pub(crate) fn render_service_base(entity: &EntityInput) -> String {
    let name = &entity.name;
    let delegate = &entity.file;
    let plural = entity.plural_camel();
    let id = entity.id_name();

    let mut prisma_types = vec!["Prisma", name.as_str()];
    for target in entity.relations().filter_map(|f| f.target.as_deref()) {
        if !prisma_types.contains(&target) {
            prisma_types.push(target);
        }
    }

    CodeBuilder::typescript()
        .import(&["PrismaService"], "../../prisma/prisma.service")
        .import(&prisma_types, "@prisma/client")
        .blank()
        .braces(&format!("export class {name}ServiceBase"), |b| {
            b.line("constructor(protected readonly prisma: PrismaService) {}")
                .blank()
                .braces(
                    &format!(
                        "async count(args: Omit<Prisma.{name}CountArgs, \"select\">): Promise<number>"
                    ),
                    |b| b.line(&format!("return this.prisma.{delegate}.count(args);")),
                )
                .blank()
                .braces(
                    &format!("async {plural}(args: Prisma.{name}FindManyArgs): Promise<{name}[]>"),
                    |b| b.line(&format!("return this.prisma.{delegate}.findMany(args);")),
                )
                .blank()
                .braces(
                    &format!(
                        "async {delegate}(args: Prisma.{name}FindUniqueArgs): Promise<{name} | null>"
                    ),
                    |b| b.line(&format!("return this.prisma.{delegate}.findUnique(args);")),
                )
                .each(
                    [("create", "create"), ("update", "update"), ("delete", "delete")],
                    |b, (verb, method)| {
                        b.blank().braces(
                            &format!(
                                "async {verb}{name}(args: Prisma.{name}{}Args): Promise<{name}>",
                                to_pascal_case(verb)
                            ),
                            |b| b.line(&format!("return this.prisma.{delegate}.{method}(args);")),
                        )
                    },
                )
                .each(entity.relations(), |b, field| {
                    let target = field.target.as_deref().unwrap_or("unknown");
                    let getter = format!("get{}", to_pascal_case(&field.name));
                    let ret = if field.many {
                        format!("Promise<{target}[]>")
                    } else {
                        format!("Promise<{target} | null>")
                    };
                    b.blank().braces(
                        &format!("async {getter}(parentId: string): {ret}"),
                        |b| {
                            b.line(&format!("return this.prisma.{delegate}"))
                                .indent()
                                .line(&format!(".findUnique({{ where: {{ {id}: parentId }} }})"))
                                .line(&format!(".{}();", field.name))
                                .dedent()
                        },
                    )
                })
        })
        .build()
}

pub(super) fn controller(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        let service = format!("{}Service", entity.name);
        let content = subclass(
            entity,
            "controller",
            &format!("@common.Controller(\"{}\")", entity.plural_camel()),
            &[("service", service.as_str())],
        );
        ctx.emit(path(&input, entity, "controller"), content)?;
    }
    Ok(())
}

pub(super) fn controller_base(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        ctx.emit(
            base_path(&input, entity, "controller"),
            render_controller_base(entity),
        )?;
    }
    Ok(())
}

pub(crate) fn render_controller_base(entity: &EntityInput) -> String {
    let name = &entity.name;
    let file = &entity.file;
    let plural = entity.plural_camel();
    let id = entity.id_name();

    let route = |b: CodeBuilder, verb: &str, path: &str, action: &str, sig: &str, body: &str| {
        b.blank()
            .line(&format!("@common.{verb}({path})"))
            .line(&format!(
                "@nestAccessControl.UseRoles({{ resource: \"{name}\", action: \"{action}\", possession: \"any\" }})"
            ))
            .braces(&format!("async {sig}"), |b| b.line(body))
    };

    CodeBuilder::typescript()
        .import_all("common", "@nestjs/common")
        .import_all("nestAccessControl", "nest-access-control")
        .import(&["Prisma", name.as_str()], "@prisma/client")
        .import(&[&format!("{name}Service")], &format!("../{file}.service"))
        .blank()
        .braces(&format!("export class {name}ControllerBase"), |b| {
            let b = b.line(&format!(
                "constructor(protected readonly service: {name}Service) {{}}"
            ));
            let b = route(
                b,
                "Post",
                "",
                "create",
                &format!(
                    "createOne(@common.Body() data: Prisma.{name}CreateInput): Promise<{name}>"
                ),
                "return this.service.create{name}({ data });",
            );
            let b = route(
                b,
                "Get",
                "",
                "read",
                &format!("findMany(): Promise<{name}[]>"),
                &format!("return this.service.{plural}({{}});"),
            );
            let b = route(
                b,
                "Get",
                &format!("\"/:{id}\""),
                "read",
                &format!(
                    "findOne(@common.Param(\"{id}\") {id}: string): Promise<{name} | null>"
                ),
                &format!("return this.service.{file}({{ where: {{ {id} }} }});"),
            );
            let b = route(
                b,
                "Patch",
                &format!("\"/:{id}\""),
                "update",
                &format!(
                    "updateOne(@common.Param(\"{id}\") {id}: string, @common.Body() data: Prisma.{name}UpdateInput): Promise<{name}>"
                ),
                &format!("return this.service.update{name}({{ where: {{ {id} }}, data }});"),
            );
            route(
                b,
                "Delete",
                &format!("\"/:{id}\""),
                "delete",
                &format!("deleteOne(@common.Param(\"{id}\") {id}: string): Promise<{name}>"),
                &format!("return this.service.delete{name}({{ where: {{ {id} }} }});"),
            )
        })
        .build()
}

pub(super) fn resolver(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        let service = format!("{}Service", entity.name);
        let content = subclass(
            entity,
            "resolver",
            &format!("@graphql.Resolver(() => \"{}\")", entity.name),
            &[("service", service.as_str())],
        );
        ctx.emit(path(&input, entity, "resolver"), content)?;
    }
    Ok(())
}

pub(super) fn resolver_base(ctx: &mut ExecutionContext) -> Result<()> {
    let input: EntitiesInput = input(ctx)?;
    for entity in &input.entities {
        ctx.emit(
            base_path(&input, entity, "resolver"),
            render_resolver_base(entity),
        )?;
    }
    Ok(())
}

pub(crate) fn render_resolver_base(entity: &EntityInput) -> String {
    let name = &entity.name;
    let file = &entity.file;
    let plural = entity.plural_camel();
    let id = entity.id_name();

    CodeBuilder::typescript()
        .import_all("graphql", "@nestjs/graphql")
        .import(&["Prisma", name.as_str()], "@prisma/client")
        .import(&[&format!("{name}Service")], &format!("../{file}.service"))
        .blank()
        .line(&format!("@graphql.Resolver(() => \"{name}\")"))
        .braces(&format!("export class {name}ResolverBase"), |b| {
            b.line(&format!(
                "constructor(protected readonly service: {name}Service) {{}}"
            ))
            .blank()
            .line(&format!("@graphql.Query(() => [\"{name}\"])"))
            .braces(
                &format!(
                    "async {plural}(@graphql.Args() args: Prisma.{name}FindManyArgs): Promise<{name}[]>"
                ),
                |b| b.line(&format!("return this.service.{plural}(args);")),
            )
            .blank()
            .line(&format!("@graphql.Query(() => \"{name}\", {{ nullable: true }})"))
            .braces(
                &format!(
                    "async {file}(@graphql.Args(\"{id}\") {id}: string): Promise<{name} | null>"
                ),
                |b| b.line(&format!("return this.service.{file}({{ where: {{ {id} }} }});")),
            )
            .each(["create", "update", "delete"], |b, verb| {
                let (args, call) = match verb {
                    "create" => (
                        format!("@graphql.Args(\"data\") data: Prisma.{name}CreateInput"),
                        "{ data }".to_string(),
                    ),
                    "update" => (
                        format!(
                            "@graphql.Args(\"{id}\") {id}: string, @graphql.Args(\"data\") data: Prisma.{name}UpdateInput"
                        ),
                        format!("{{ where: {{ {id} }}, data }}"),
                    ),
                    _ => (
                        format!("@graphql.Args(\"{id}\") {id}: string"),
                        format!("{{ where: {{ {id} }} }}"),
                    ),
                };
                b.blank()
                    .line(&format!("@graphql.Mutation(() => \"{name}\")"))
                    .braces(
                        &format!("async {verb}{name}({args}): Promise<{name}>"),
                        |b| b.line(&format!("return this.service.{verb}{name}({call});")),
                    )
            })
        })
        .build()
}
