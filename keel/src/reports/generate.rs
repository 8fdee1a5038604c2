//! Generate command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from a generation run.
#[derive(Debug)]
pub struct GenerateReport {
    pub app_name: String,
    pub app_version: String,
    /// Lint warnings from the data model.
    pub warnings: Vec<String>,
    /// Hook and producer failures, one line each.
    pub failures: Vec<String>,
    /// Whether the run stopped on cancellation.
    pub cancelled: bool,
    pub result: GenerationResult,
    /// Where event snapshots were written, if visualization was enabled.
    pub debug_dir: Option<PathBuf>,
}

impl GenerateReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

#[derive(Debug)]
pub enum GenerationResult {
    Written(WrittenResult),
    /// Dry-run preview.
    Preview(Vec<PreviewFile>),
    /// Nothing was written because the run had failures.
    Withheld { artifacts: usize },
}

#[derive(Debug)]
pub struct WrittenResult {
    pub output_dir: PathBuf,
    pub written: Vec<String>,
    /// Existing files kept because of `--no-overwrite`.
    pub kept: Vec<String>,
}

#[derive(Debug)]
pub struct PreviewFile {
    pub path: String,
    pub content: String,
}

impl Report for GenerateReport {
    fn render(&self, out: &mut dyn Output) {
        if let Some(debug_dir) = &self.debug_dir {
            out.key_value("Event snapshots written to", &debug_dir.display().to_string());
            out.newline();
        }

        for warning in &self.warnings {
            out.warning(warning);
        }
        for failure in &self.failures {
            out.error(failure);
        }
        if self.cancelled {
            out.error("generation was cancelled");
        }

        match &self.result {
            GenerationResult::Preview(files) => {
                for file in files {
                    out.divider(&file.path);
                    out.preformatted(&file.content);
                }
                out.divider("Summary");
                out.preformatted(&format!("{} files would be generated", files.len()));
            }
            GenerationResult::Written(written) => {
                out.preformatted(&format!("{} v{}", self.app_name, self.app_version));
                out.newline();
                out.section(&format!("Generated in {}", written.output_dir.display()));
                for path in &written.written {
                    out.added_item(path);
                }
                for path in &written.kept {
                    out.kept_item(path);
                }
            }
            GenerationResult::Withheld { artifacts } => {
                out.newline();
                out.preformatted(&format!(
                    "{artifacts} files were not written; pass --allow-partial to write them anyway"
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::BufferOutput;

    #[test]
    fn test_render_written() {
        let report = GenerateReport {
            app_name: "tasks".into(),
            app_version: "0.1.0".into(),
            warnings: vec!["entity 'Task' has no description".into()],
            failures: Vec::new(),
            cancelled: false,
            result: GenerationResult::Written(WrittenResult {
                output_dir: PathBuf::from("out"),
                written: vec!["src/main.ts".into()],
                kept: vec![".env".into()],
            }),
            debug_dir: None,
        };

        let mut out = BufferOutput::default();
        report.render(&mut out);
        insta::assert_snapshot!(out.lines.join("\n"), @r"
        warning: entity 'Task' has no description
        tasks v0.1.0

        Generated in out:
          + src/main.ts
          = .env
        ");
    }
}
