use anyhow::Result;
use serde::Serialize;

use buildgen_lib::consts::{APP_NAME, CACHE_FILENAME, RESOURCE_ROOT_ENV};
use buildgen_lib::generator;
use buildgen_lib::session::resource_root_from_env;

use crate::output::{OutputFormat, field, print_json};

#[derive(Serialize)]
struct Info {
  name: &'static str,
  version: &'static str,
  generators: Vec<&'static str>,
  cache_file: &'static str,
  resource_root: Option<String>,
}

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let info = Info {
    name: APP_NAME,
    version: env!("CARGO_PKG_VERSION"),
    generators: generator::available(),
    cache_file: CACHE_FILENAME,
    resource_root: resource_root_from_env().map(|p| p.display().to_string()),
  };

  if output.is_json() {
    return print_json(&info);
  }

  println!("{} {}", info.name, info.version);
  println!();
  field("Generators", &info.generators.join(", "));
  field("Cache file", info.cache_file);
  match &info.resource_root {
    Some(root) => field("Resource root", root),
    None => field("Resource root", &format!("(unset, see {})", RESOURCE_ROOT_ENV)),
  }
  Ok(())
}
