//! Generate operation - run the generator and write its artifacts.

use std::path::Path;

use eyre::{Context, Result};
use keel_codegen::Generator;
use keel_core::{ArtifactWriter, Overwrite};
use keel_pipeline::SnapshotPlugin;
use keel_schema::DataModel;
use tracing::{debug, info};

use crate::reports::{GenerateReport, GenerationResult, PreviewFile, WrittenResult};

/// Directory below the output directory that receives event snapshots.
pub const DEBUG_DIR: &str = ".keel/debug";

/// Options for the generate operation.
pub struct GenerateOptions<'a> {
    pub output_dir: &'a Path,
    /// Preview without writing files.
    pub dry_run: bool,
    /// Write event snapshots to [`DEBUG_DIR`]. Ignored on dry runs.
    pub visualize: bool,
    /// Keep files that already exist.
    pub no_overwrite: bool,
    /// Write artifacts even when some hooks failed.
    pub allow_partial: bool,
}

pub async fn generate(model: &DataModel, opts: GenerateOptions<'_>) -> Result<GenerateReport> {
    let warnings: Vec<String> = keel_schema::lint(model)
        .into_iter()
        .filter(|d| d.severity.is_warning())
        .map(|d| match d.location {
            Some(loc) => format!("{} (at {loc})", d.message),
            None => d.message,
        })
        .collect();

    let visualize = opts.visualize && !opts.dry_run;
    let snapshots = SnapshotPlugin::new();
    let mut generator = Generator::new(model);
    if visualize {
        generator = generator.snapshot(snapshots.clone());
    }
    let outcome = generator.generate().await.wrap_err("Generation failed")?;
    let report = &outcome.report;

    let failures: Vec<String> = report.failures.iter().map(|f| f.to_string()).collect();
    let clean = report.is_clean();

    let debug_dir = if visualize {
        let dir = opts.output_dir.join(DEBUG_DIR);
        let count = snapshots
            .write_to_dir(&dir)
            .wrap_err("Failed to write event snapshots")?;
        debug!(count, dir = %dir.display(), "wrote event snapshots");
        Some(dir)
    } else {
        None
    };

    let result = if opts.dry_run {
        GenerationResult::Preview(
            outcome
                .artifacts
                .files()
                .map(|(path, content)| PreviewFile {
                    path: path.to_string(),
                    content: content.to_string(),
                })
                .collect(),
        )
    } else if !clean && !opts.allow_partial {
        GenerationResult::Withheld {
            artifacts: outcome.artifacts.len(),
        }
    } else {
        let overwrite = if opts.no_overwrite {
            Overwrite::IfMissing
        } else {
            Overwrite::Always
        };
        let stats = ArtifactWriter::new(opts.output_dir)
            .overwrite(overwrite)
            .write_all(outcome.artifacts.files())
            .wrap_err_with(|| format!("Failed to write to {}", opts.output_dir.display()))?;
        info!(
            written = stats.written,
            skipped = stats.skipped,
            total = stats.total(),
            "artifacts written"
        );
        GenerationResult::Written(WrittenResult {
            output_dir: opts.output_dir.to_path_buf(),
            written: stats.written_paths,
            kept: stats.skipped_paths,
        })
    };

    Ok(GenerateReport {
        app_name: model.app.name.clone(),
        app_version: model.app.version.clone(),
        warnings,
        failures,
        cancelled: report.cancelled,
        result,
        debug_dir,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> DataModel {
        keel_schema::parse_str(
            r#"
            [app]
            name = "tasks"

            [entities.Task]
            description = "A unit of work"

            [entities.Task.fields.title]
            type = "text"
            "#,
        )
        .unwrap()
    }

    fn opts(dir: &Path) -> GenerateOptions<'_> {
        GenerateOptions {
            output_dir: dir,
            dry_run: false,
            visualize: false,
            no_overwrite: false,
            allow_partial: false,
        }
    }

    #[tokio::test]
    async fn test_writes_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = generate(&model(), opts(dir.path())).await.unwrap();
        assert!(report.is_clean());

        let GenerationResult::Written(written) = report.result else {
            panic!("expected written result");
        };
        assert!(written.written.contains(&"src/task/task.service.ts".to_string()));
        assert!(dir.path().join("src/task/base/task.service.base.ts").is_file());
        assert!(dir.path().join("prisma/schema.prisma").is_file());
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let report = generate(
            &model(),
            GenerateOptions {
                dry_run: true,
                ..opts(dir.path())
            },
        )
        .await
        .unwrap();

        assert!(matches!(report.result, GenerationResult::Preview(ref files) if !files.is_empty()));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_no_overwrite_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "PORT=1\n").unwrap();

        let report = generate(
            &model(),
            GenerateOptions {
                no_overwrite: true,
                ..opts(dir.path())
            },
        )
        .await
        .unwrap();

        let GenerationResult::Written(written) = report.result else {
            panic!("expected written result");
        };
        assert_eq!(written.kept, vec![".env".to_string()]);
        assert_eq!(std::fs::read_to_string(dir.path().join(".env")).unwrap(), "PORT=1\n");
    }

    #[tokio::test]
    async fn test_visualize_writes_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let report = generate(
            &model(),
            GenerateOptions {
                visualize: true,
                ..opts(dir.path())
            },
        )
        .await
        .unwrap();

        let debug_dir = report.debug_dir.unwrap();
        assert!(debug_dir.join("00-create-server.json").is_file());
    }

    #[tokio::test]
    async fn test_dry_run_skips_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let report = generate(
            &model(),
            GenerateOptions {
                visualize: true,
                dry_run: true,
                ..opts(dir.path())
            },
        )
        .await
        .unwrap();

        assert!(report.debug_dir.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
