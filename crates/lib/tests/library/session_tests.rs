//! Session lifecycle across process-like boundaries.

use std::path::PathBuf;
use std::time::Duration;

use buildgen_lib::cache::ConfigCache;
use buildgen_lib::consts::{KEY_GENERATOR, KEY_HOME_DIRECTORY};
use buildgen_lib::decl::{ProjectDecl, TargetDecl};
use buildgen_lib::progress::Progress;
use buildgen_lib::session::{ConfigurationSession, ErrorClass, SessionOptions, SessionState};

use super::common::{Workspace, demo};

#[test]
fn reconfigure_from_cached_settings() {
  let ws = Workspace::new();
  ws.configure("ninja", &demo());

  let cache = ConfigCache::load(&ws.build).unwrap();
  let generator = cache.value(KEY_GENERATOR).unwrap().to_string();
  let home = PathBuf::from(cache.value(KEY_HOME_DIRECTORY).unwrap());
  assert_eq!(generator, "ninja");
  assert_eq!(home, dunce::canonicalize(&ws.source).unwrap());

  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize(&generator, &home, &ws.build).unwrap();
  session.register_projects(&demo()).unwrap();
  let report = session.generate().unwrap();
  assert!(report.written.is_empty());
  assert_eq!(report.unchanged.len(), 2);
}

#[test]
fn duplicate_targets_across_projects() {
  let ws = Workspace::new();
  let decls = vec![
    ProjectDecl::new("Alpha", &["C"]).with_target(TargetDecl::new("util", "STATIC_LIBRARY")),
    ProjectDecl::new("Beta", &["C"]).with_target(TargetDecl::new("util", "STATIC_LIBRARY")),
  ];

  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize("make", &ws.source, &ws.build).unwrap();
  let err = session.register_projects(&decls).unwrap_err();

  assert_eq!(err.class(), ErrorClass::DuplicateTarget);
  assert_eq!(err.to_string(), "duplicate target names: util (in Alpha), util (in Beta)");
  assert!(session.graph().is_none());
}

#[test]
fn target_names_cannot_leave_the_build_directory() {
  let ws = Workspace::new();
  let decls = vec![
    ProjectDecl::new("P", &["C"]).with_target(TargetDecl::new("../../escape", "STATIC_LIBRARY").with_sources(&["e.c"])),
  ];

  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize("make", &ws.source, &ws.build).unwrap();
  let err = session.register_projects(&decls).unwrap_err();

  assert_eq!(err.class(), ErrorClass::InvalidTargetName);
  assert_eq!(err.class().exit_code(), 12);
  assert!(session.graph().is_none());
  let parent = ws.build.parent().unwrap();
  assert!(!parent.join("escape.dir").exists());
  assert!(!parent.parent().unwrap().join("escape.dir").exists());
}

#[test]
fn cycles_map_to_their_exit_code() {
  let ws = Workspace::new();
  let decls = vec![
    ProjectDecl::new("P", &["C"])
      .with_target(TargetDecl::new("x", "STATIC_LIBRARY").depends_on("y"))
      .with_target(TargetDecl::new("y", "STATIC_LIBRARY").depends_on("x")),
  ];

  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize("ninja", &ws.source, &ws.build).unwrap();
  let err = session.register_projects(&decls).unwrap_err();
  assert_eq!(err.class().exit_code(), 6);
}

#[test]
fn generate_can_be_repeated() {
  let ws = Workspace::new();
  let mut session = ConfigurationSession::new(SessionOptions::default());
  session.initialize("make", &ws.source, &ws.build).unwrap();
  session.register_projects(&demo()).unwrap();

  let first = session.generate().unwrap();
  let second = session.generate().unwrap();
  assert_eq!(first.total(), second.total());
  assert!(second.written.is_empty());
  assert_eq!(session.state(), SessionState::Generated);
}

#[test]
fn failure_is_sticky() {
  let ws = Workspace::new();
  let mut session = ConfigurationSession::new(SessionOptions::default());
  let err = session.initialize("Xcode", &ws.source, &ws.build).unwrap_err();
  assert_eq!(err.class(), ErrorClass::UnknownGenerator);
  assert_eq!(session.state(), SessionState::Failed);

  for err in [
    session.register_projects(&demo()).unwrap_err(),
    session.generate().map(|_| ()).unwrap_err(),
    session.save_cache().unwrap_err(),
  ] {
    assert_eq!(err.class(), ErrorClass::InvalidSessionState);
  }
  assert_eq!(session.state(), SessionState::Failed);
  session.close().unwrap();
}

#[test]
fn missing_source_directory() {
  let ws = Workspace::new();
  let mut session = ConfigurationSession::new(SessionOptions::default());
  let err = session
    .initialize("make", &ws.source.join("nope"), &ws.build)
    .unwrap_err();
  assert_eq!(err.class().exit_code(), 2);
  assert!(!ws.build.exists());
}

#[test]
fn exhausted_timeout_stops_the_next_phase() {
  let ws = Workspace::new();
  let options = SessionOptions {
    timeout: Some(Duration::ZERO),
    ..SessionOptions::default()
  };
  let mut session = ConfigurationSession::new(options);
  let err = session.initialize("make", &ws.source, &ws.build).unwrap_err();
  assert_eq!(err.class(), ErrorClass::Timeout);
}

#[test]
fn progress_covers_every_phase() {
  let ws = Workspace::new();
  let (progress, rx) = Progress::channel();
  let options = SessionOptions {
    progress,
    ..SessionOptions::default()
  };

  let mut session = ConfigurationSession::new(options);
  session.initialize("ninja", &ws.source, &ws.build).unwrap();
  session.register_projects(&demo()).unwrap();
  session.generate().unwrap();
  session.close().unwrap();

  let messages: Vec<String> = rx.iter().map(|e| e.message).collect();
  assert_eq!(
    messages,
    vec![
      "loading cache",
      "cache loaded",
      "building graph",
      "graph built",
      "wrote rules.ninja",
      "wrote build.ninja",
    ]
  );
}
