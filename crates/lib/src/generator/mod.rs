//! Build-script generators.
//!
//! A [`Generator`] turns a [`GraphModel`] into the files of one build-tool
//! dialect. Rendering is pure: every file is produced in memory, and only when
//! all of them rendered without error are they written, each one skipped if
//! its content is unchanged on disk.

mod context;
mod fastbuild;
mod make;
mod ninja;
mod plan;

pub use context::{
  DEFAULT_ARCHIVER, DEFAULT_CONFIGURATIONS, GenerationContext, LANGUAGES, configuration_flags, default_compiler,
};
pub use fastbuild::FastbuildGenerator;
pub use make::MakeGenerator;
pub use ninja::NinjaGenerator;
pub use plan::{BuiltTarget, LinkItem, ObjectFile, TargetPlan, plan_targets, source_language, traversal};

use std::io;
use std::path::PathBuf;

use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::graph::{GraphModel, TargetKind};
use crate::progress::Progress;
use crate::util::fs::write_if_changed;

#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("unknown generator '{name}' (available: {})", .available.join(", "))]
  UnknownGenerator { name: String, available: Vec<String> },

  #[error("generator '{generator}' cannot emit {kind} target '{target}'")]
  UnsupportedTargetKind {
    generator: String,
    target: String,
    kind: TargetKind,
  },

  #[error("generator '{generator}' would define '{name}' twice")]
  NameClash { generator: String, name: String },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
  /// Path relative to the build directory.
  pub path: PathBuf,
  pub content: String,
}

impl GeneratedFile {
  pub fn new(path: impl Into<PathBuf>, content: String) -> Self {
    Self {
      path: path.into(),
      content,
    }
  }
}

/// Outcome of a generation run. Paths are relative to the build directory,
/// in render order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
  pub written: Vec<PathBuf>,
  pub unchanged: Vec<PathBuf>,
}

impl GenerationReport {
  pub fn total(&self) -> usize {
    self.written.len() + self.unchanged.len()
  }
}

pub trait Generator: Send + Sync {
  /// Stable name, also recorded in the cache.
  fn name(&self) -> &'static str;

  /// Render every output file. Must not touch the filesystem.
  fn render(&self, graph: &GraphModel, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, GenerateError>;

  /// Render, then write every changed file below `ctx.build_dir`.
  fn generate(
    &self,
    graph: &GraphModel,
    ctx: &GenerationContext,
    progress: &Progress,
  ) -> Result<GenerationReport, GenerateError> {
    let files = self.render(graph, ctx)?;

    let outcomes: Vec<Result<bool, GenerateError>> = files
      .par_iter()
      .map(|file| {
        let path = ctx.build_dir.join(&file.path);
        write_if_changed(&path, file.content.as_bytes()).map_err(|source| GenerateError::Write { path, source })
      })
      .collect();

    let total = files.len();
    let mut report = GenerationReport::default();
    for (index, (file, outcome)) in files.into_iter().zip(outcomes).enumerate() {
      let written = outcome?;
      let status = if written { "wrote" } else { "unchanged" };
      debug!(path = %file.path.display(), status, "generated file");
      progress.report(
        &format!("{} {}", status, file.path.display()),
        (index + 1) as f32 / total as f32,
      );
      if written {
        report.written.push(file.path);
      } else {
        report.unchanged.push(file.path);
      }
    }

    info!(
      generator = self.name(),
      written = report.written.len(),
      unchanged = report.unchanged.len(),
      "generation complete"
    );
    Ok(report)
  }
}

/// Stable names of every generator.
pub fn available() -> Vec<&'static str> {
  vec![MakeGenerator.name(), NinjaGenerator.name(), FastbuildGenerator.name()]
}

/// Select a generator by name or alias, ignoring case.
pub fn create(name: &str) -> Result<Box<dyn Generator>, GenerateError> {
  let generator: Box<dyn Generator> = match name.trim().to_ascii_lowercase().as_str() {
    "make" | "unix makefiles" | "makefiles" => Box::new(MakeGenerator),
    "ninja" => Box::new(NinjaGenerator),
    "fastbuild" | "fbuild" => Box::new(FastbuildGenerator),
    _ => {
      return Err(GenerateError::UnknownGenerator {
        name: name.to_string(),
        available: available().into_iter().map(str::to_string).collect(),
      });
    }
  };
  Ok(generator)
}
