//! Writing generated artifacts to disk.
//!
//! The generation pipeline never touches the filesystem; it hands back logical
//! paths and contents. [`ArtifactWriter`] is the collaborator that turns them
//! into files below an output directory.
//!
//! # Example
//!
//! ```ignore
//! let writer = ArtifactWriter::new("out").overwrite(Overwrite::IfMissing);
//! let stats = writer.write_all(outcome.artifacts.files())?;
//! println!("{} written, {} kept", stats.written, stats.skipped);
//! ```

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// How to handle existing files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Overwrite {
    /// Always overwrite (generated code)
    #[default]
    Always,
    /// Only create if file doesn't exist
    IfMissing,
}

/// Result of a write operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written
    Written,
    /// File was skipped (already exists)
    Skipped,
}

/// Errors raised while writing artifacts.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("artifact path '{path}' must be relative and stay inside the output directory")]
    UnsafePath { path: String },

    #[error("failed to write '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Statistics from a write operation.
#[derive(Debug, Default)]
pub struct WriteStats {
    /// Number of files written.
    pub written: usize,
    /// Number of files skipped (already existed).
    pub skipped: usize,
    /// Paths of written files.
    pub written_paths: Vec<String>,
    /// Paths of skipped files.
    pub skipped_paths: Vec<String>,
}

impl WriteStats {
    /// Total number of files processed.
    pub fn total(&self) -> usize {
        self.written + self.skipped
    }
}

/// Writes logical artifact paths below a base directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    base: PathBuf,
    overwrite: Overwrite,
}

impl ArtifactWriter {
    /// Create a writer rooted at `base` that always overwrites.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            overwrite: Overwrite::Always,
        }
    }

    /// Set the overwrite behavior.
    pub fn overwrite(mut self, overwrite: Overwrite) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// The output directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Resolve a logical path to a location inside the output directory.
    pub fn resolve(&self, logical: &str) -> Result<PathBuf, WriteError> {
        let relative = Path::new(logical);
        let safe = !logical.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe {
            return Err(WriteError::UnsafePath {
                path: logical.to_string(),
            });
        }
        Ok(self.base.join(relative))
    }

    /// Write a single artifact.
    pub fn write(&self, logical: &str, content: &str) -> Result<WriteResult, WriteError> {
        let path = self.resolve(logical)?;
        if self.overwrite == Overwrite::IfMissing && path.exists() {
            debug!(path = logical, "keeping existing file");
            return Ok(WriteResult::Skipped);
        }
        write_file(&path, content)?;
        Ok(WriteResult::Written)
    }

    /// Write every artifact, in the order given.
    ///
    /// All paths are checked before anything is written, so an unsafe path
    /// leaves the output directory untouched.
    pub fn write_all<'a>(
        &self,
        files: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<WriteStats, WriteError> {
        let files: Vec<_> = files.into_iter().collect();
        for (path, _) in &files {
            self.resolve(path)?;
        }

        let mut stats = WriteStats::default();
        for (path, content) in files {
            match self.write(path, content)? {
                WriteResult::Written => {
                    stats.written += 1;
                    stats.written_paths.push(path.to_string());
                }
                WriteResult::Skipped => {
                    stats.skipped += 1;
                    stats.skipped_paths.push(path.to_string());
                }
            }
        }
        Ok(stats)
    }
}

fn write_file(path: &Path, content: &str) -> Result<(), WriteError> {
    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, content).map_err(io_err)
}
