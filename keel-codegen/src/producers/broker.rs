//! Message broker client: topics, client options, Nest module and the
//! producer service.
//!
//! The broker payload is `null` when the model configures no broker, in
//! which case none of these producers emit anything.

use eyre::Result;
use keel_core::{to_camel_case, to_constant_case};
use keel_pipeline::ExecutionContext;

use super::input;
use crate::{CodeBuilder, inputs::BrokerInput};

fn broker(ctx: &ExecutionContext) -> Result<Option<BrokerInput>> {
    input(ctx)
}

fn file_stem(broker: &BrokerInput) -> String {
    to_camel_case(&broker.name)
}

pub(super) fn topics_enum(ctx: &mut ExecutionContext) -> Result<()> {
    let Some(broker) = broker(ctx)? else {
        return Ok(());
    };
    ctx.emit(format!("{}/topics.ts", broker.dir()), render_topics(&broker))?;
    Ok(())
}

pub(crate) fn render_topics(broker: &BrokerInput) -> String {
    CodeBuilder::typescript()
        .braces(&format!("export enum {}Topics", broker.class_prefix()), |b| {
            b.each(&broker.topics, |b, topic| {
                b.line(&format!("{} = \"{}\",", topic.member, topic.name))
            })
        })
        .build()
}

pub(super) fn client_options_factory(ctx: &mut ExecutionContext) -> Result<()> {
    let Some(broker) = broker(ctx)? else {
        return Ok(());
    };
    let prefix = broker.class_prefix();
    let env = to_constant_case(&broker.name);

    let content = CodeBuilder::typescript()
        .import(&["ConfigService"], "@nestjs/config")
        .import(&[&format!("{prefix}Options")], "@nestjs/microservices")
        .blank()
        .braces(
            &format!(
                "export const generate{prefix}ClientOptions = (configService: ConfigService): {prefix}Options =>"
            ),
            |b| {
                b.line(&format!(
                    "const brokers = configService.get<string>(\"{env}_BROKERS\")?.split(\",\");"
                ))
                .line(&format!(
                    "const groupId = configService.get<string>(\"{env}_GROUP_ID\");"
                ))
                .blank()
                .braces("if (!brokers || brokers.length === 0)", |b| {
                    b.line(&format!(
                        "throw new Error(\"{env}_BROKERS environment variable must be defined\");"
                    ))
                })
                .blank()
                .braces("return", |b| {
                    b.braces("options:", |b| {
                        b.line("client: { brokers },")
                            .line("consumer: groupId ? { groupId } : undefined,")
                    })
                })
            },
        )
        .build();
    ctx.emit(
        format!("{}/generate{prefix}ClientOptions.ts", broker.dir()),
        content,
    )?;
    Ok(())
}

pub(super) fn nestjs_module(ctx: &mut ExecutionContext) -> Result<()> {
    let Some(broker) = broker(ctx)? else {
        return Ok(());
    };
    let prefix = broker.class_prefix();
    let stem = file_stem(&broker);
    let token = to_constant_case(&broker.name);

    let content = CodeBuilder::typescript()
        .import(&["Global", "Module"], "@nestjs/common")
        .import(&["ClientsModule"], "@nestjs/microservices")
        .import(&["ConfigService"], "@nestjs/config")
        .import(
            &[&format!("generate{prefix}ClientOptions")],
            &format!("./generate{prefix}ClientOptions"),
        )
        .import(
            &[&format!("{prefix}ProducerService")],
            &format!("./{stem}.producer.service"),
        )
        .blank()
        .line("@Global()")
        .line("@Module({")
        .indent()
        .line("imports: [")
        .indent()
        .line("ClientsModule.registerAsync([")
        .indent()
        .line("{")
        .indent()
        .line(&format!("name: \"{token}_MODULE\","))
        .line("inject: [ConfigService],")
        .line(&format!("useFactory: generate{prefix}ClientOptions,"))
        .dedent()
        .line("},")
        .dedent()
        .line("]),")
        .dedent()
        .line("],")
        .line(&format!("providers: [{prefix}ProducerService],"))
        .line(&format!("exports: [{prefix}ProducerService],"))
        .dedent()
        .line("})")
        .line(&format!("export class {prefix}Module {{}}"))
        .build();
    ctx.emit(format!("{}/{stem}.module.ts", broker.dir()), content)?;
    Ok(())
}

pub(super) fn service(ctx: &mut ExecutionContext) -> Result<()> {
    let Some(broker) = broker(ctx)? else {
        return Ok(());
    };
    let prefix = broker.class_prefix();
    let stem = file_stem(&broker);
    let token = to_constant_case(&broker.name);

    let content = CodeBuilder::typescript()
        .import(&["Inject", "Injectable"], "@nestjs/common")
        .import(&["ClientKafka"], "@nestjs/microservices")
        .import(
            &[&format!("{prefix}ProducerServiceBase")],
            &format!("./base/{stem}.producer.service.base"),
        )
        .blank()
        .line("@Injectable()")
        .braces(
            &format!("export class {prefix}ProducerService extends {prefix}ProducerServiceBase"),
            |b| {
                b.braces(
                    &format!(
                        "constructor(@Inject(\"{token}_MODULE\") protected client: ClientKafka)"
                    ),
                    |b| b.line("super(client);"),
                )
            },
        )
        .build();
    ctx.emit(format!("{}/{stem}.producer.service.ts", broker.dir()), content)?;
    Ok(())
}

pub(super) fn service_base(ctx: &mut ExecutionContext) -> Result<()> {
    let Some(broker) = broker(ctx)? else {
        return Ok(());
    };
    let stem = file_stem(&broker);
    ctx.emit(
        format!("{}/base/{stem}.producer.service.base.ts", broker.dir()),
        render_service_base(&broker),
    )?;
    Ok(())
}

pub(crate) fn render_service_base(broker: &BrokerInput) -> String {
    let prefix = broker.class_prefix();

    CodeBuilder::typescript()
        .import(&["ClientKafka"], "@nestjs/microservices")
        .import(&[&format!("{prefix}Topics")], "../topics")
        .blank()
        .braces(&format!("export class {prefix}ProducerServiceBase"), |b| {
            b.line("constructor(protected client: ClientKafka) {}")
                .blank()
                .braces(
                    &format!(
                        "async emitMessage(topic: {prefix}Topics, message: unknown): Promise<void>"
                    ),
                    |b| {
                        b.line("return new Promise((resolve, reject) => {")
                            .indent()
                            .line("this.client.emit(topic, JSON.stringify(message)).subscribe({")
                            .indent()
                            .line("error: reject,")
                            .line("complete: resolve,")
                            .dedent()
                            .line("});")
                            .dedent()
                            .line("});")
                    },
                )
                .blank()
                .braces("async onModuleInit()", |b| b.line("await this.client.connect();"))
        })
        .build()
}
