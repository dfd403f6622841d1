//! Shared helpers for library integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use buildgen_lib::decl::{ProjectDecl, TargetDecl};
use buildgen_lib::generator::GenerationReport;
use buildgen_lib::session::{ConfigurationSession, SessionOptions};
use tempfile::TempDir;

/// A temporary source tree and build directory.
pub struct Workspace {
  _temp: TempDir,
  pub source: PathBuf,
  pub build: PathBuf,
}

impl Workspace {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let source = temp.path().join("src");
    fs::create_dir(&source).unwrap();
    let build = temp.path().join("build");
    Self {
      _temp: temp,
      source,
      build,
    }
  }

  /// Initialize, register and generate in one fresh session.
  pub fn configure(&self, generator: &str, decls: &[ProjectDecl]) -> GenerationReport {
    configure_into(generator, &self.source, &self.build, decls)
  }

  pub fn read(&self, relative: &str) -> String {
    fs::read_to_string(self.build.join(relative)).unwrap()
  }
}

pub fn configure_into(generator: &str, source: &Path, build: &Path, decls: &[ProjectDecl]) -> GenerationReport {
  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize(generator, source, build).unwrap();
  session.register_projects(decls).unwrap();
  let report = session.generate().unwrap();
  session.close().unwrap();
  report
}

/// The two-target project used throughout: a shared `core` and an `app` using it.
pub fn demo() -> Vec<ProjectDecl> {
  vec![
    ProjectDecl::new("Demo", &["C", "CXX"])
      .with_target(TargetDecl::new("core", "SHARED_LIBRARY").with_sources(&["a.c"]))
      .with_target(
        TargetDecl::new("app", "EXECUTABLE")
          .with_sources(&["main.c"])
          .depends_on("core"),
      ),
  ]
}

/// A larger tree with every kind of target across two projects.
pub fn layered() -> Vec<ProjectDecl> {
  vec![
    ProjectDecl::new("Base", &["C"])
      .with_target(
        TargetDecl::new("headers", "INTERFACE_LIBRARY").with_property("INTERFACE_INCLUDE_DIRECTORIES", "include"),
      )
      .with_target(
        TargetDecl::new("z", "UNKNOWN_LIBRARY").with_property("IMPORTED_LOCATION", "/usr/lib/libz.so"),
      )
      .with_target(
        TargetDecl::new("util", "STATIC_LIBRARY")
          .with_sources(&["util/u.c", "util/u.h"])
          .depends_on("headers")
          .depends_on("z"),
      ),
    ProjectDecl::new("Apps", &["C", "CXX"])
      .with_target(
        TargetDecl::new("engine", "SHARED_LIBRARY")
          .with_sources(&["engine/e.cpp"])
          .with_property("SOVERSION", "1")
          .depends_on("util"),
      )
      .with_target(
        TargetDecl::new("tool", "EXECUTABLE")
          .with_sources(&["tool/main.c"])
          .depends_on("engine"),
      )
      .with_target(
        TargetDecl::new("bench", "EXECUTABLE")
          .with_sources(&["bench/b.cpp"])
          .with_property("EXCLUDE_FROM_ALL", "ON")
          .depends_on("engine"),
      ),
  ]
}
