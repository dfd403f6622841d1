use predicates::prelude::*;

use super::common::{DEMO_PROJECTS, TestEnv};

#[test]
fn generate_reuses_the_recorded_session() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.configure("ninja", &[]).assert().success();

  env
    .bgen_cmd()
    .arg("generate")
    .arg(env.build_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Generated ninja files"))
    .stdout(predicate::str::contains("Written: 0"))
    .stdout(predicate::str::contains("Unchanged: 2"));
}

#[test]
fn generate_picks_up_declaration_changes() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.configure("make", &[]).assert().success();

  env.write_file("src/projects.json", &DEMO_PROJECTS.replace("\"main.c\"", "\"main.c\", \"extra.c\""));
  env
    .bgen_cmd()
    .arg("generate")
    .arg(env.build_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Written: 1"));

  assert!(env.read_build("app.dir/build.make").contains("app.dir/extra.c.o"));
}

#[test]
fn generate_honours_cache_edits() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.configure("make", &[]).assert().success();
  env.cache(&["set", "BG_CXX_COMPILER=clang++"]).assert().success();

  env.bgen_cmd().arg("generate").arg(env.build_path()).assert().success();
  assert!(env.read_build("Makefile").contains("CXX = clang++\n"));
}

#[test]
fn generate_reports_broken_declarations() {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.configure("make", &[]).assert().success();

  env.write_file(
    "src/projects.json",
    r#"[{ "name": "A", "targets": [{ "name": "t", "kind": "EXECUTABLE" }] },
        { "name": "B", "targets": [{ "name": "t", "kind": "EXECUTABLE" }] }]"#,
  );
  env
    .bgen_cmd()
    .arg("generate")
    .arg(env.build_path())
    .assert()
    .code(4)
    .stderr(predicate::str::contains("duplicate target names: t (in A), t (in B)"));
}
