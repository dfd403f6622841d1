use predicates::prelude::*;

use super::common::{DEMO_PROJECTS, TestEnv, exists};

#[test]
fn configure_make_writes_scripts_and_cache() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);

  env
    .configure("make", &[])
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated make files"))
    .stdout(predicate::str::contains("Written: 3"));

  let build = env.build_path();
  assert!(exists(&build, "Makefile"));
  assert!(exists(&build, "app.dir/build.make"));
  assert!(env.read_build("BuildCache.txt").contains("BG_GENERATOR:INTERNAL=make\n"));
}

#[test]
fn configure_records_projects_file() {
  let env = TestEnv::empty();
  env.write_file("decls/all.json", DEMO_PROJECTS);
  let projects = env.temp.path().join("decls/all.json");

  env
    .configure("ninja", &["--projects", projects.to_str().unwrap()])
    .assert()
    .success();

  let recorded = dunce::canonicalize(&projects).unwrap();
  assert!(
    env
      .read_build("BuildCache.txt")
      .contains(&format!("BG_PROJECTS_FILE:INTERNAL={}\n", recorded.display()))
  );
}

#[test]
fn definitions_reach_the_generated_files() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);

  env
    .configure("make", &["-D", "BG_C_COMPILER=clang", "-D", "BG_BUILD_TYPE:STRING=Release"])
    .assert()
    .success();

  assert!(env.read_build("Makefile").contains("CC = clang\n"));
  assert!(env.read_build("app.dir/build.make").contains("-O3 -DNDEBUG"));
  assert!(env.read_build("BuildCache.txt").contains("BG_C_COMPILER:PATH=clang\n"));
}

#[test]
fn malformed_definition_fails_before_writing() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);

  env
    .configure("make", &["-D", "NO_EQUALS_SIGN"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("expected KEY[:KIND]=VALUE"));
  assert!(!env.build_path().exists());
}

#[test]
fn unknown_generator_exit_code() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);

  env
    .configure("Xcode", &[])
    .assert()
    .code(7)
    .stderr(predicate::str::contains("unknown generator 'Xcode'"));
}

#[test]
fn cycle_exit_code() {
  let env = TestEnv::with_projects(
    r#"[{ "name": "P", "languages": ["C"], "targets": [
      { "name": "x", "kind": "STATIC_LIBRARY", "dependencies": ["y"] },
      { "name": "y", "kind": "STATIC_LIBRARY", "dependencies": ["x"] }
    ]}]"#,
  );

  env
    .configure("ninja", &[])
    .assert()
    .code(6)
    .stderr(predicate::str::contains("dependency cycle detected"));
  assert!(!exists(&env.build_path(), "build.ninja"));
}

#[test]
fn unknown_kind_exit_code() {
  let env = TestEnv::with_projects(r#"[{ "name": "P", "targets": [{ "name": "x", "kind": "OBJECT_LIBRARY" }] }]"#);
  env.configure("make", &[]).assert().code(5);
}

#[test]
fn invalid_target_name_exit_code() {
  let env = TestEnv::with_projects(
    r#"[{ "name": "P", "languages": ["C"], "targets": [
      { "name": "../escape", "kind": "STATIC_LIBRARY", "sources": ["e.c"] }
    ]}]"#,
  );
  env
    .configure("make", &[])
    .assert()
    .code(12)
    .stderr(predicate::str::contains("invalid target name '../escape'"));
  assert!(!exists(&env.build_path(), "Makefile"));
}

#[test]
fn fastbuild_module_library_exit_code() {
  let env = TestEnv::with_projects(
    r#"[{ "name": "P", "languages": ["C"], "targets": [
      { "name": "plugin", "kind": "MODULE_LIBRARY", "sources": ["p.c"] }
    ]}]"#,
  );
  env.configure("fastbuild", &[]).assert().code(8);
}

#[test]
fn missing_source_directory_exit_code() {
  let env = TestEnv::empty();
  let mut cmd = env.bgen_cmd();
  cmd
    .arg("configure")
    .arg("make")
    .arg(env.temp.path().join("missing"))
    .arg(env.build_path())
    .assert()
    .code(2)
    .stderr(predicate::str::contains("invalid source directory"));
}

#[test]
fn missing_declarations_is_generic_failure() {
  let env = TestEnv::empty();
  env
    .configure("make", &[])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("projects.json"));
}

#[test]
fn unknown_properties_warn() {
  let env = TestEnv::with_projects(
    r#"[{ "name": "P", "languages": ["C"], "targets": [
      { "name": "app", "kind": "EXECUTABLE", "sources": ["m.c"], "properties": { "FANCY_FLAG": "1" } }
    ]}]"#,
  );

  env
    .configure("make", &[])
    .assert()
    .success()
    .stderr(predicate::str::contains("unknown property 'FANCY_FLAG'"));
}

#[test]
fn resource_root_from_environment() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.write_file("resources/README", "");
  let resources = dunce::canonicalize(env.temp.path().join("resources")).unwrap();

  env
    .configure("make", &[])
    .env("BGEN_RESOURCE_ROOT", &resources)
    .assert()
    .success();
  assert!(
    env
      .read_build("BuildCache.txt")
      .contains(&format!("BG_RESOURCE_ROOT:INTERNAL={}\n", resources.display()))
  );
}
