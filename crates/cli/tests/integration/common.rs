//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// A shared library and an executable linking it.
pub const DEMO_PROJECTS: &str = r#"[
  {
    "name": "Demo",
    "languages": ["C", "CXX"],
    "targets": [
      { "name": "core", "kind": "SHARED_LIBRARY", "sources": ["a.c"] },
      { "name": "app", "kind": "EXECUTABLE", "sources": ["main.c"], "dependencies": ["core"] }
    ]
  }
]"#;

/// Isolated source and build directories.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A source tree whose `projects.json` holds `projects`.
  pub fn with_projects(projects: &str) -> Self {
    let env = Self::empty();
    env.write_file("src/projects.json", projects);
    env
  }

  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    Self { temp }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  pub fn source_path(&self) -> PathBuf {
    self.temp.path().join("src")
  }

  pub fn build_path(&self) -> PathBuf {
    self.temp.path().join("build")
  }

  pub fn read_build(&self, relative: &str) -> String {
    std::fs::read_to_string(self.build_path().join(relative)).unwrap()
  }

  /// The bgen binary with the environment cleared of settings that leak between tests.
  pub fn bgen_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("bgen");
    cmd.env_remove("BGEN_RESOURCE_ROOT").env_remove("RUST_LOG");
    cmd
  }

  /// `bgen configure <generator> <src> <build>` plus `extra` arguments.
  pub fn configure(&self, generator: &str, extra: &[&str]) -> Command {
    let mut cmd = self.bgen_cmd();
    cmd
      .arg("configure")
      .arg(generator)
      .arg(self.source_path())
      .arg(self.build_path())
      .args(extra);
    cmd
  }

  pub fn cache(&self, args: &[&str]) -> Command {
    let mut cmd = self.bgen_cmd();
    cmd.arg("cache").arg(args[0]).arg(self.build_path()).args(&args[1..]);
    cmd
  }
}

pub fn exists(build: &Path, relative: &str) -> bool {
  build.join(relative).exists()
}
