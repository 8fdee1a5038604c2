//! `prisma/schema.prisma`.

use eyre::Result;
use keel_pipeline::ExecutionContext;
use keel_schema::FieldType;

use super::input;
use crate::{
    CodeBuilder,
    inputs::{EntityInput, FieldInput, PrismaInput},
};

pub(super) fn schema(ctx: &mut ExecutionContext) -> Result<()> {
    let prisma: PrismaInput = input(ctx)?;
    ctx.emit("prisma/schema.prisma", render(&prisma))?;
    Ok(())
}

pub(crate) fn render(prisma: &PrismaInput) -> String {
    let enums: Vec<&FieldInput> = prisma
        .entities
        .iter()
        .flat_map(|e| e.fields.iter())
        .filter(|f| f.kind == FieldType::Option)
        .collect();

    CodeBuilder::prisma()
        .braces("datasource db", |b| {
            b.line(&format!("provider = \"{}\"", prisma.provider))
                .line(&format!("url      = env(\"{}\")", prisma.url_env))
        })
        .blank()
        .braces("generator client", |b| b.line("provider = \"prisma-client-js\""))
        .each(&prisma.entities, |b, entity| {
            b.blank()
                .braces(&format!("model {}", entity.name), |b| model_body(b, entity))
        })
        .each(enums, |b, field| {
            let name = field.enum_name.as_deref().unwrap_or("Enum");
            b.blank()
                .braces(&format!("enum {name}"), |b| b.lines(&field.options))
        })
        .build()
}

fn model_body(b: CodeBuilder, entity: &EntityInput) -> CodeBuilder {
    b.each(&entity.fields, |b, field| {
        let b = b.line(&column(field));
        match field.foreign_key() {
            Some(fk) => b.line(&format!("{fk} String?")),
            None => b,
        }
    })
    .line("createdAt DateTime @default(now())")
    .line("updatedAt DateTime @updatedAt")
}

fn column(field: &FieldInput) -> String {
    let optional = if field.required { "" } else { "?" };
    let unique = if field.unique { " @unique" } else { "" };

    match field.kind {
        FieldType::Id => format!("{} String @id @default(cuid())", field.name),
        FieldType::Lookup => {
            let target = field.target.as_deref().unwrap_or("Unknown");
            match field.foreign_key() {
                Some(fk) => format!(
                    "{} {target}? @relation(fields: [{fk}], references: [id])",
                    field.name
                ),
                None => format!("{} {target}[]", field.name),
            }
        }
        FieldType::Option => format!(
            "{} {}{optional}",
            field.name,
            field.enum_name.as_deref().unwrap_or("String")
        ),
        kind => {
            let ty = match kind {
                FieldType::Int => "Int",
                FieldType::Float => "Float",
                FieldType::Bool => "Boolean",
                FieldType::DateTime => "DateTime",
                FieldType::Json => "Json",
                _ => "String",
            };
            format!("{} {ty}{optional}{unique}", field.name)
        }
    }
}
