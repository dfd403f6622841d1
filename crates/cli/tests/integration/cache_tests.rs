use predicates::prelude::*;

use super::common::{DEMO_PROJECTS, TestEnv};

fn configured() -> TestEnv {
  let env = TestEnv::with_projects(DEMO_PROJECTS);
  env.configure("make", &[]).assert().success();
  env
}

#[test]
fn list_hides_internal_and_advanced_entries() {
  let env = configured();

  env
    .cache(&["list"])
    .assert()
    .success()
    .stdout(predicate::str::contains("BG_CONFIGURATION_TYPES:STRING=Debug;Release"))
    .stdout(predicate::str::contains("BG_GENERATOR").not())
    .stdout(predicate::str::contains("BG_C_COMPILER").not());

  env
    .cache(&["list", "--all"])
    .assert()
    .success()
    .stdout(predicate::str::contains("BG_GENERATOR:INTERNAL=make"))
    .stdout(predicate::str::contains("BG_C_COMPILER:PATH=cc"));
}

#[test]
fn list_json_is_valid() {
  let env = configured();
  let output = env.cache(&["list", "--all", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  let generator = entries
    .as_array()
    .unwrap()
    .iter()
    .find(|e| e["key"] == "BG_GENERATOR")
    .unwrap();
  assert_eq!(generator["value"], "make");
  assert_eq!(generator["kind"], "INTERNAL");
}

#[test]
fn set_get_unset() {
  let env = configured();

  env
    .cache(&["set", "WITH_TESTS:BOOL=ON"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Set WITH_TESTS:BOOL=ON"));
  env.cache(&["get", "WITH_TESTS"]).assert().success().stdout("ON\n");

  env.cache(&["unset", "WITH_TESTS"]).assert().success();
  env
    .cache(&["get", "WITH_TESTS"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("No cache entry 'WITH_TESTS'"));
}

#[test]
fn set_rejects_malformed_definitions() {
  let env = configured();
  env
    .cache(&["set", "JUST_A_KEY"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("invalid cache definition 'JUST_A_KEY'"));
}

#[test]
fn malformed_cache_is_an_io_failure() {
  let env = configured();
  env.write_file("build/BuildCache.txt", "# header\nthis line is garbage\n");

  env
    .cache(&["list"])
    .assert()
    .code(3)
    .stderr(predicate::str::contains(":2: this line is garbage"));
}

#[test]
fn set_rejects_values_spanning_lines() {
  let env = configured();
  env
    .cache(&["set", "BG_C_FLAGS:STRING=-Wall\n-O2"])
    .assert()
    .code(3)
    .stderr(predicate::str::contains("cannot store cache entry 'BG_C_FLAGS'"));

  env.cache(&["list"]).assert().success();
  env.cache(&["get", "BG_C_FLAGS"]).assert().success().stdout("\n");
}
