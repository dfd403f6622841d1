//! End-to-end generation through a session.

use std::fs;
use std::path::PathBuf;

use buildgen_lib::decl::{ProjectDecl, TargetDecl};
use buildgen_lib::generator::available;
use buildgen_lib::session::{ConfigurationSession, ErrorClass, SessionOptions, SessionState};

use super::common::{Workspace, configure_into, demo, layered};

fn paths(items: &[&str]) -> Vec<PathBuf> {
  items.iter().map(PathBuf::from).collect()
}

mod outputs {
  use super::*;

  #[test]
  fn make_writes_root_and_fragments() {
    let ws = Workspace::new();
    let report = ws.configure("make", &demo());
    assert_eq!(
      report.written,
      paths(&["Makefile", "core.dir/build.make", "app.dir/build.make"])
    );
    assert!(ws.read("Makefile").contains("\nall: libcore.so app\n"));
  }

  #[test]
  fn ninja_writes_rules_and_build() {
    let ws = Workspace::new();
    let report = ws.configure("Ninja", &demo());
    assert_eq!(report.written, paths(&["rules.ninja", "build.ninja"]));
    assert!(ws.read("build.ninja").contains("build app: link_C app.dir/main.c.o | libcore.so\n"));
  }

  #[test]
  fn fastbuild_writes_one_bff() {
    let ws = Workspace::new();
    let report = ws.configure("fastbuild", &demo());
    assert_eq!(report.written, paths(&["fbuild.bff"]));

    let bff = ws.read("fbuild.bff");
    assert!(bff.contains("DLL('core-Debug')\n"));
    assert!(bff.contains("Executable('app-Release')\n"));
  }

  #[test]
  fn empty_declarations_still_generate() {
    let ws = Workspace::new();
    for name in available() {
      let build = ws.build.join(name);
      let report = configure_into(name, &ws.source, &build, &[]);
      assert!(!report.written.is_empty(), "{name} wrote nothing");
    }
  }
}

mod determinism {
  use super::*;

  #[test]
  fn identical_inputs_give_identical_bytes() {
    let ws = Workspace::new();
    for name in ["make", "ninja"] {
      let first = ws.build.join(format!("{name}-1"));
      let second = ws.build.join(format!("{name}-2"));
      let report = configure_into(name, &ws.source, &first, &layered());
      configure_into(name, &ws.source, &second, &layered());

      for path in &report.written {
        assert_eq!(
          fs::read(first.join(path)).unwrap(),
          fs::read(second.join(path)).unwrap(),
          "{name}: {} differs",
          path.display()
        );
      }
    }
  }

  #[test]
  fn regeneration_without_changes_writes_nothing() {
    let ws = Workspace::new();
    for name in available() {
      let build = ws.build.join(name);
      configure_into(name, &ws.source, &build, &layered());
      let again = configure_into(name, &ws.source, &build, &layered());
      assert!(again.written.is_empty(), "{name} rewrote {:?}", again.written);
    }
  }

  #[test]
  fn only_the_changed_fragment_is_rewritten() {
    let ws = Workspace::new();
    ws.configure("make", &demo());

    let mut changed = demo();
    changed[0].targets[1]
      .properties
      .insert("COMPILE_DEFINITIONS".to_string(), "APP_VERSION=2".to_string());
    let report = ws.configure("make", &changed);

    assert_eq!(report.written, paths(&["app.dir/build.make"]));
    assert_eq!(report.unchanged, paths(&["Makefile", "core.dir/build.make"]));
    assert!(ws.read("app.dir/build.make").contains("-DAPP_VERSION=2"));
  }
}

mod layered_tree {
  use super::*;

  #[test]
  fn ninja_link_lines_follow_the_closure() {
    let ws = Workspace::new();
    ws.configure("ninja", &layered());
    let build = ws.read("build.ninja");

    assert!(build.contains("build libutil.a: archive util.dir/util/u.c.o\n"));
    assert!(build.contains("build libengine.so: link_CXX engine.dir/engine/e.cpp.o | libutil.a\n"));
    assert!(build.contains("  LINK_FLAGS = -shared -Wl,-soname,libengine.so.1\n"));
    assert!(build.contains("  LINK_LIBRARIES = libutil.a /usr/lib/libz.so\n"));
    assert!(build.contains("build tool: link_CXX tool.dir/tool/main.c.o | libengine.so\n"));
    assert!(build.contains("build all: phony libutil.a libengine.so tool\n"));
    assert!(!build.contains("headers"));

    let rules = ws.read("rules.ninja");
    assert!(rules.contains("rule compile_CXX\n"));
    assert!(rules.contains("rule link_CXX\n"));
  }

  #[test]
  fn usage_requirements_reach_dependents() {
    let ws = Workspace::new();
    ws.configure("make", &layered());
    let engine = ws.read("engine.dir/build.make");
    let include = format!("-I{}", dunce::canonicalize(&ws.source).unwrap().join("include").display());
    assert!(engine.contains(&include), "missing {include} in:\n{engine}");
  }

  #[test]
  fn projects_appear_in_declaration_order() {
    let ws = Workspace::new();
    ws.configure("make", &layered());
    let root = ws.read("Makefile");
    let includes: Vec<&str> = root.lines().filter(|l| l.starts_with("include ")).collect();
    assert_eq!(
      includes,
      vec![
        "include util.dir/build.make",
        "include engine.dir/build.make",
        "include tool.dir/build.make",
        "include bench.dir/build.make",
      ]
    );
  }

  #[test]
  fn fastbuild_aliases_skip_excluded_targets() {
    let ws = Workspace::new();
    ws.configure("fastbuild", &layered());
    let bff = ws.read("fbuild.bff");

    assert!(bff.contains("Library('util-Release')\n"));
    assert!(bff.contains("Alias('bench')\n"));
    let per_config = bff.split("Alias('Debug')").nth(1).unwrap();
    let per_config = per_config.split("Alias('ALL_BUILD-Debug')").next().unwrap();
    assert!(per_config.contains("'tool-Debug'"));
    assert!(!per_config.contains("'bench-Debug'"));
  }
}

mod cache_settings {
  use super::*;
  use buildgen_lib::cache::CacheEntryKind;

  #[test]
  fn build_type_adds_configuration_flags() {
    let ws = Workspace::new();
    let mut session = ConfigurationSession::new(SessionOptions::default());
    session.initialize("make", &ws.source, &ws.build).unwrap();
    session
      .cache_mut()
      .add_entry("BG_BUILD_TYPE", "Release", "", CacheEntryKind::String).unwrap();
    session.register_projects(&demo()).unwrap();
    session.generate().unwrap();

    assert!(ws.read("app.dir/build.make").contains("$(CC) -O3 -DNDEBUG -c "));
  }

  #[test]
  fn configuration_types_drive_fastbuild() {
    let ws = Workspace::new();
    let mut session = ConfigurationSession::new(SessionOptions::default());
    session.initialize("fastbuild", &ws.source, &ws.build).unwrap();
    session
      .cache_mut()
      .add_entry("BG_CONFIGURATION_TYPES", "Debug;Profile", "", CacheEntryKind::String).unwrap();
    session.register_projects(&demo()).unwrap();
    session.generate().unwrap();

    let bff = ws.read("fbuild.bff");
    assert!(bff.contains("Alias('Profile')\n"));
    assert!(bff.contains("Executable('app-Profile')\n"));
    assert!(!bff.contains("Release"));
  }
}

mod failures {
  use super::*;

  #[test]
  fn unknown_library_without_location_writes_nothing() {
    let ws = Workspace::new();
    let decls = vec![
      ProjectDecl::new("P", &["C"])
        .with_target(TargetDecl::new("ghost", "UNKNOWN_LIBRARY"))
        .with_target(TargetDecl::new("app", "EXECUTABLE").with_sources(&["m.c"]).depends_on("ghost")),
    ];

    for name in available() {
      let build = ws.build.join(name);
      let mut session = ConfigurationSession::new(SessionOptions::default());
      session.initialize(name, &ws.source, &build).unwrap();
      session.register_projects(&decls).unwrap();

      let err = session.generate().unwrap_err();
      assert_eq!(err.class(), ErrorClass::UnsupportedTargetKind, "{name}");
      assert_eq!(session.state(), SessionState::Failed);
      assert_eq!(fs::read_dir(&build).unwrap().count(), 0, "{name} wrote files");
    }
  }

  #[test]
  fn fastbuild_rejects_module_libraries() {
    let ws = Workspace::new();
    let decls = vec![ProjectDecl::new("P", &["C"]).with_target(TargetDecl::new("plugin", "MODULE_LIBRARY").with_sources(&["p.c"]))];

    let mut session = ConfigurationSession::new(SessionOptions::default());
    session.initialize("fastbuild", &ws.source, &ws.build).unwrap();
    session.register_projects(&decls).unwrap();
    let err = session.generate().unwrap_err();
    assert_eq!(err.class().exit_code(), 8);

    // The other dialects handle them.
    configure_into("make", &ws.source, &ws.build.join("make"), &decls);
  }
}
