//! FASTBuild dialect: a single `fbuild.bff` covering every configuration.
//!
//! The file is laid out in fixed sections (helper variables, settings,
//! compilers, configurations, target definitions, aliases). Each target is
//! defined once per configuration under the name `<target>-<config>`, with
//! objects in `<config>/<target>.dir/` and artifacts in `<config>/`.

use std::collections::HashSet;

use tracing::warn;

use super::plan::{LinkItem, TargetPlan, plan_targets, traversal};
use super::{GenerateError, GeneratedFile, GenerationContext, Generator};
use crate::graph::{GraphModel, TargetKind};

const OUTPUT: &str = "fbuild.bff";

const INPUT_PLACEHOLDERS: &str = "$FB_INPUT_1_PLACEHOLDER$ -o $FB_INPUT_2_PLACEHOLDER$";

pub struct FastbuildGenerator;

impl Generator for FastbuildGenerator {
  fn name(&self) -> &'static str {
    "fastbuild"
  }

  fn render(&self, graph: &GraphModel, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, GenerateError> {
    for id in traversal(graph) {
      let target = graph.target(id);
      if target.kind == TargetKind::ModuleLibrary {
        return Err(GenerateError::UnsupportedTargetKind {
          generator: self.name().to_string(),
          target: target.name.clone(),
          kind: target.kind,
        });
      }
    }

    let mut per_config = Vec::with_capacity(ctx.configurations.len());
    for config in &ctx.configurations {
      per_config.push((config.as_str(), plan_targets(graph, ctx, self.name(), Some(config.as_str()))?));
    }

    let reserved = reserved_names(ctx, &per_config, self.name())?;

    let mut languages: Vec<String> = Vec::new();
    for (_, plans) in &per_config {
      for plan in plans {
        for language in plan.languages().into_iter().map(str::to_string).chain([plan.linker_language.clone()]) {
          if !languages.contains(&language) {
            languages.push(language);
          }
        }
      }
    }
    if languages.is_empty() {
      languages.push("C".to_string());
    }
    languages.sort();

    let mut bff = BffWriter::default();
    bff.section("Generated by buildgen (fastbuild). Do not edit.");
    write_helpers(&mut bff);
    write_settings(&mut bff, ctx);
    write_compilers(&mut bff, ctx, &languages);
    write_configurations(&mut bff, ctx);
    bff.section("Target Definitions");
    for (config, plans) in &per_config {
      for plan in plans {
        write_target(&mut bff, ctx, plan, config);
      }
    }
    write_aliases(&mut bff, ctx, &per_config, &reserved);

    Ok(vec![GeneratedFile::new(OUTPUT, bff.finish())])
  }
}

/// Every name the file defines besides the per-target aliases.
///
/// Configuration aliases, object lists and per-configuration definitions share
/// one namespace, so a clash among them is an error.
fn reserved_names(
  ctx: &GenerationContext,
  per_config: &[(&str, Vec<TargetPlan>)],
  generator: &str,
) -> Result<HashSet<String>, GenerateError> {
  let mut reserved = HashSet::new();
  let mut claim = |name: String| {
    if reserved.insert(name.clone()) {
      Ok(())
    } else {
      Err(GenerateError::NameClash {
        generator: generator.to_string(),
        name,
      })
    }
  };

  claim("All".to_string())?;
  for config in &ctx.configurations {
    claim(config.clone())?;
    claim(format!("ALL_BUILD-{}", config))?;
  }
  for (config, plans) in per_config {
    for plan in plans {
      claim(format!("{}-{}", plan.name, config))?;
      for language in plan.languages() {
        claim(format!("{}-{}-{}", plan.name, language, config))?;
      }
    }
  }
  Ok(reserved)
}

/// Quote `value` with `'`, escaping embedded quotes with `^`.
pub fn quote(value: &str) -> String {
  quote_with(value, "'")
}

pub fn quote_with(value: &str, quotation: &str) -> String {
  format!("{q}{}{q}", value.replace(quotation, &format!("^{}", quotation)), q = quotation)
}

/// Surround every item with `prefix` and `suffix`.
pub fn wrap(items: &[String], prefix: &str, suffix: &str) -> Vec<String> {
  items.iter().map(|item| format!("{}{}{}", prefix, item, suffix)).collect()
}

/// Escape `$` so the dialect does not expand it.
pub fn encode_literal(value: &str) -> String {
  value.replace('$', "^$")
}

fn quoted(items: &[String]) -> Vec<String> {
  items.iter().map(|item| quote(item)).collect()
}

#[derive(Default)]
struct BffWriter {
  out: String,
  closers: Vec<char>,
}

impl BffWriter {
  fn line(&mut self, text: &str) {
    for _ in 0..self.closers.len() {
      self.out.push('\t');
    }
    self.out.push_str(text);
    self.out.push('\n');
  }

  fn blank(&mut self) {
    self.out.push('\n');
  }

  fn comment(&mut self, text: &str) {
    self.line(&format!(";{}", text));
  }

  fn section(&mut self, title: &str) {
    if !self.out.is_empty() {
      self.blank();
    }
    self.line(&format!(";{}", "-".repeat(79)));
    self.comment(title);
    self.line(&format!(";{}", "-".repeat(79)));
  }

  fn variable(&mut self, key: &str, value: &str) {
    self.line(format!(".{} = {}", key, value).trim_end());
  }

  fn command(&mut self, command: &str, argument: Option<&str>) {
    match argument {
      Some(argument) => self.line(&format!("{}({})", command, argument)),
      None => self.line(command),
    }
  }

  fn push_scope(&mut self, open: char, close: char) {
    self.line(&open.to_string());
    self.closers.push(close);
  }

  fn pop_scope(&mut self) {
    if let Some(close) = self.closers.pop() {
      self.line(&close.to_string());
    }
  }

  fn array(&mut self, key: &str, values: &[String]) {
    self.variable(key, "");
    self.push_scope('{', '}');
    let last = values.len().saturating_sub(1);
    for (index, value) in values.iter().enumerate() {
      if index == last {
        self.line(value);
      } else {
        self.line(&format!("{},", value));
      }
    }
    self.pop_scope();
  }

  fn finish(self) -> String {
    self.out
  }
}

fn write_helpers(bff: &mut BffWriter) {
  bff.section("Helper variables");
  bff.variable("FB_INPUT_1_PLACEHOLDER", &quote("\"%1\""));
  bff.variable("FB_INPUT_2_PLACEHOLDER", &quote("\"%2\""));
}

fn write_settings(bff: &mut BffWriter, ctx: &GenerationContext) {
  bff.section("Settings");
  bff.command("Settings", None);
  bff.push_scope('{', '}');
  let cache = ctx.build_dir.join(".fbuild.cache");
  bff.variable("CachePath", &quote(&cache.display().to_string()));
  bff.pop_scope();
}

fn write_compilers(bff: &mut BffWriter, ctx: &GenerationContext, languages: &[String]) {
  bff.section("Compilers");
  for language in languages {
    let name = format!("Compiler_{}", language);
    bff.command("Compiler", Some(&quote(&name)));
    bff.push_scope('{', '}');
    bff.variable("Executable", &quote(ctx.compiler(language)));
    bff.pop_scope();
    bff.variable(&name, &quote(&name));
  }
  if let Some(first) = languages.first() {
    bff.variable("Compiler_dummy", &quote(&format!("Compiler_{}", first)));
  }
}

fn write_configurations(bff: &mut BffWriter, ctx: &GenerationContext) {
  bff.section("Configurations");
  bff.variable("ConfigBase", "");
  bff.push_scope('[', ']');
  if let Some(platform) = &ctx.platform {
    bff.variable("Platform", &quote(platform));
  }
  bff.pop_scope();

  for config in &ctx.configurations {
    bff.variable(&format!("config_{}", config), "");
    bff.push_scope('[', ']');
    bff.command("Using", Some(".ConfigBase"));
    bff.variable("ConfigName", &quote(config));
    bff.pop_scope();
  }

  bff.array("all_configs", &wrap(&ctx.configurations, ".config_", ""));
}

fn options(flags: &[String]) -> String {
  flags.iter().map(|f| encode_literal(f)).collect::<Vec<_>>().join(" ")
}

fn write_target(bff: &mut BffWriter, ctx: &GenerationContext, plan: &TargetPlan, config: &str) {
  let alias = format!("{}-{}", plan.name, config);
  let output = format!("{}/{}", config, plan.artifact);
  bff.blank();
  bff.comment(&format!("{} ({}) in project {}, {}", plan.name, plan.kind, plan.project, config));

  let mut object_lists = Vec::new();
  for language in plan.languages() {
    let list = format!("{}-{}-{}", plan.name, language, config);
    let flags = plan.compile_flags.get(language).map(|f| options(f)).unwrap_or_default();
    let sources: Vec<String> = plan
      .objects_of(language)
      .map(|o| o.source.display().to_string())
      .collect();

    bff.command("ObjectList", Some(&quote(&list)));
    bff.push_scope('{', '}');
    bff.command("Using", Some(&format!(".config_{}", config)));
    bff.variable("Compiler", &format!(".Compiler_{}", language));
    bff.variable(
      "CompilerOptions",
      &quote(format!("{} -c {}", flags, INPUT_PLACEHOLDERS).trim_start()),
    );
    bff.variable("CompilerOutputPath", &quote(&format!("{}/{}/", config, plan.object_dir)));
    bff.variable("CompilerOutputExtension", &quote(".o"));
    bff.array("CompilerInputFiles", &quoted(&sources));
    bff.pop_scope();
    object_lists.push(list);
  }

  let dependency_aliases = |names: Vec<&str>| -> Vec<String> {
    names.into_iter().map(|name| quote(&format!("{}-{}", name, config))).collect()
  };
  let prerequisites = dependency_aliases(plan.prerequisites.iter().map(|t| t.name.as_str()).collect());

  match plan.kind {
    TargetKind::StaticLibrary => {
      bff.command("Library", Some(&quote(&alias)));
      bff.push_scope('{', '}');
      bff.command("Using", Some(&format!(".config_{}", config)));
      bff.variable("Compiler", ".Compiler_dummy");
      bff.variable("CompilerOptions", &quote(&format!("-c {}", INPUT_PLACEHOLDERS)));
      bff.variable("CompilerOutputPath", &quote("/dummy/"));
      bff.variable("Librarian", &quote(&ctx.archiver));
      bff.variable("LibrarianOptions", &quote("rcs \"%2\" \"%1\""));
      bff.variable("LibrarianOutput", &quote(&output));
      bff.array("LibrarianAdditionalInputs", &quoted(&object_lists));
    }
    _ => {
      let command = match plan.kind {
        TargetKind::SharedLibrary => "DLL",
        _ => "Executable",
      };
      let mut libraries = quoted(&object_lists);
      libraries.extend(dependency_aliases(plan.linked_targets().map(|t| t.name.as_str()).collect()));

      let mut linker_options = options(&plan.link_flags);
      let imported: Vec<String> = plan
        .link_libraries
        .iter()
        .filter_map(|item| match item {
          LinkItem::Imported(path) => Some(encode_literal(path)),
          LinkItem::Built(_) => None,
        })
        .collect();
      linker_options = [linker_options, "-o \"%2\" \"%1\"".to_string(), imported.join(" ")]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

      bff.command(command, Some(&quote(&alias)));
      bff.push_scope('{', '}');
      bff.command("Using", Some(&format!(".config_{}", config)));
      bff.variable("Linker", &quote(ctx.compiler(&plan.linker_language)));
      bff.variable("LinkerOutput", &quote(&output));
      bff.variable("LinkerOptions", &quote(&linker_options));
      bff.array("Libraries", &libraries);
    }
  }
  if !prerequisites.is_empty() {
    bff.array("PreBuildDependencies", &prerequisites);
  }
  bff.pop_scope();
}

fn write_aliases(
  bff: &mut BffWriter,
  ctx: &GenerationContext,
  per_config: &[(&str, Vec<TargetPlan>)],
  reserved: &HashSet<String>,
) {
  bff.section("Aliases");

  bff.comment("Per config");
  for (config, plans) in per_config {
    let targets: Vec<String> = plans
      .iter()
      .filter(|p| p.in_all)
      .map(|p| quote(&format!("{}-{}", p.name, config)))
      .collect();
    bff.command("Alias", Some(&quote(config)));
    bff.push_scope('{', '}');
    bff.array("Targets", &targets);
    bff.pop_scope();

    bff.command("Alias", Some(&quote(&format!("ALL_BUILD-{}", config))));
    bff.push_scope('{', '}');
    bff.array("Targets", &[quote(config)]);
    bff.pop_scope();
  }

  bff.comment("Per targets");
  if let Some((_, plans)) = per_config.first() {
    for plan in plans {
      if reserved.contains(&plan.name) {
        warn!(name = %plan.name, "no per-target alias, the name is already defined");
        continue;
      }
      let targets: Vec<String> = ctx
        .configurations
        .iter()
        .map(|config| quote(&format!("{}-{}", plan.name, config)))
        .collect();
      bff.command("Alias", Some(&quote(&plan.name)));
      bff.push_scope('{', '}');
      bff.array("Targets", &targets);
      bff.pop_scope();
    }
  }

  bff.comment("All");
  bff.command("Alias", Some(&quote("All")));
  bff.push_scope('{', '}');
  bff.array("Targets", &quoted(&ctx.configurations));
  bff.pop_scope();
}
