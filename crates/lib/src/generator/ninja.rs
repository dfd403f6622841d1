//! Ninja dialect: `rules.ninja` holds the tool rules, `build.ninja` the edges.

use std::fmt::Write as _;

use super::plan::{TargetPlan, plan_targets};
use super::{GenerateError, GeneratedFile, GenerationContext, Generator};
use crate::graph::{GraphModel, TargetKind};

const HEADER: &str = "# Generated by buildgen (ninja). Do not edit.\n";

pub struct NinjaGenerator;

impl Generator for NinjaGenerator {
  fn name(&self) -> &'static str {
    "ninja"
  }

  fn render(&self, graph: &GraphModel, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, GenerateError> {
    let plans = plan_targets(graph, ctx, self.name(), ctx.build_type.as_deref())?;

    let mut languages: Vec<String> = Vec::new();
    for plan in &plans {
      for language in plan.languages().into_iter().map(str::to_string).chain([plan.linker_language.clone()]) {
        if !languages.contains(&language) {
          languages.push(language);
        }
      }
    }
    languages.sort();

    Ok(vec![
      GeneratedFile::new("rules.ninja", rules(&languages, ctx)),
      GeneratedFile::new("build.ninja", edges(&plans)),
    ])
  }
}

/// Escape a path for use in a build statement.
fn escape(path: &str) -> String {
  let mut out = String::with_capacity(path.len());
  for c in path.chars() {
    match c {
      '$' | ' ' | ':' => {
        out.push('$');
        out.push(c);
      }
      _ => out.push(c),
    }
  }
  out
}

fn join<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
  items.into_iter().map(escape).collect::<Vec<_>>().join(" ")
}

fn rules(languages: &[String], ctx: &GenerationContext) -> String {
  let mut out = String::from(HEADER);

  for language in languages {
    let compiler = ctx.compiler(language);
    let _ = writeln!(out);
    let _ = writeln!(out, "rule compile_{}", language);
    let _ = writeln!(out, "  command = {} $FLAGS -c $in -o $out", compiler);
    let _ = writeln!(out, "  description = Building {} object $out", language);
    let _ = writeln!(out);
    let _ = writeln!(out, "rule link_{}", language);
    let _ = writeln!(out, "  command = {} $LINK_FLAGS -o $out $in $LINK_LIBRARIES", compiler);
    let _ = writeln!(out, "  description = Linking {} $out", language);
  }

  let _ = writeln!(out);
  let _ = writeln!(out, "rule archive");
  let _ = writeln!(out, "  command = rm -f $out && {} rcs $out $in", ctx.archiver);
  let _ = writeln!(out, "  description = Archiving $out");

  out
}

fn edges(plans: &[TargetPlan]) -> String {
  let mut out = String::from(HEADER);
  let _ = writeln!(out);
  let _ = writeln!(out, "include rules.ninja");

  let mut project = None;
  for plan in plans {
    if project != Some(plan.project.as_str()) {
      project = Some(plan.project.as_str());
      let _ = writeln!(out);
      let _ = writeln!(out, "# Project {}", plan.project);
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "# Target {} ({})", plan.name, plan.kind);
    for object in &plan.objects {
      let _ = writeln!(
        out,
        "build {}: compile_{} {}",
        escape(&object.object),
        object.language,
        escape(&object.source.display().to_string())
      );
      if let Some(flags) = plan.compile_flags.get(object.language)
        && !flags.is_empty()
      {
        let _ = writeln!(out, "  FLAGS = {}", flags.join(" "));
      }
    }

    let rule = match plan.kind {
      TargetKind::StaticLibrary => "archive".to_string(),
      _ => format!("link_{}", plan.linker_language),
    };
    let mut statement = vec![format!("build {}:", escape(&plan.artifact)), rule];
    let inputs = join(plan.objects.iter().map(|o| o.object.as_str()));
    if !inputs.is_empty() {
      statement.push(inputs);
    }
    let implicit = join(plan.linked_targets().map(|t| t.artifact.as_str()));
    if !implicit.is_empty() {
      statement.push("|".to_string());
      statement.push(implicit);
    }
    let order_only = join(plan.prerequisites.iter().map(|t| t.artifact.as_str()));
    if !order_only.is_empty() {
      statement.push("||".to_string());
      statement.push(order_only);
    }
    let _ = writeln!(out, "{}", statement.join(" "));

    if plan.kind != TargetKind::StaticLibrary {
      if !plan.link_flags.is_empty() {
        let _ = writeln!(out, "  LINK_FLAGS = {}", plan.link_flags.join(" "));
      }
      if !plan.link_libraries.is_empty() {
        let libraries = plan.link_libraries.iter().map(|l| l.path()).collect::<Vec<_>>().join(" ");
        let _ = writeln!(out, "  LINK_LIBRARIES = {}", libraries);
      }
    }

    if !plan.alias_collides() {
      let _ = writeln!(out, "build {}: phony {}", escape(&plan.name), escape(&plan.artifact));
    }
  }

  let _ = writeln!(out);
  let defaults = join(plans.iter().filter(|p| p.in_all).map(|p| p.artifact.as_str()));
  if defaults.is_empty() {
    let _ = writeln!(out, "build all: phony");
  } else {
    let _ = writeln!(out, "build all: phony {}", defaults);
  }
  let _ = writeln!(out, "default all");

  out
}
