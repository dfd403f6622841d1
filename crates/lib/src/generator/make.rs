//! Makefile dialect: a root `Makefile` plus one `build.make` fragment per target.

use std::fmt::Write as _;

use super::plan::{TargetPlan, plan_targets};
use super::{GenerateError, GeneratedFile, GenerationContext, Generator};
use crate::graph::{GraphModel, TargetKind};

const HEADER: &str = "# Generated by buildgen (make). Do not edit.\n";

pub struct MakeGenerator;

impl Generator for MakeGenerator {
  fn name(&self) -> &'static str {
    "make"
  }

  fn render(&self, graph: &GraphModel, ctx: &GenerationContext) -> Result<Vec<GeneratedFile>, GenerateError> {
    let plans = plan_targets(graph, ctx, self.name(), ctx.build_type.as_deref())?;

    let mut files = Vec::with_capacity(plans.len() + 1);
    files.push(GeneratedFile::new("Makefile", root_makefile(&plans, ctx)));
    for plan in &plans {
      files.push(GeneratedFile::new(
        format!("{}/build.make", plan.object_dir),
        fragment(plan, ctx),
      ));
    }
    Ok(files)
  }
}

/// Make variable holding the tool for `language`, or the tool itself.
fn tool(language: &str, ctx: &GenerationContext) -> String {
  match language {
    "C" => "$(CC)".to_string(),
    "CXX" => "$(CXX)".to_string(),
    other => ctx.compiler(other).to_string(),
  }
}

fn command(parts: impl IntoIterator<Item = impl AsRef<str>>) -> String {
  parts
    .into_iter()
    .filter(|p| !p.as_ref().is_empty())
    .map(|p| p.as_ref().to_string())
    .collect::<Vec<_>>()
    .join(" ")
}

fn root_makefile(plans: &[TargetPlan], ctx: &GenerationContext) -> String {
  let mut out = String::from(HEADER);

  let _ = writeln!(out);
  let _ = writeln!(out, "CC = {}", ctx.compiler("C"));
  let _ = writeln!(out, "CXX = {}", ctx.compiler("CXX"));
  let _ = writeln!(out, "AR = {}", ctx.archiver);

  let aliases: Vec<&TargetPlan> = plans.iter().filter(|p| !p.alias_collides()).collect();

  let _ = writeln!(out);
  let phony = ["all", "clean"]
    .into_iter()
    .chain(aliases.iter().map(|p| p.name.as_str()));
  let _ = writeln!(out, ".PHONY: {}", command(phony));

  let _ = writeln!(out);
  let defaults = plans.iter().filter(|p| p.in_all).map(|p| p.artifact.as_str());
  let _ = writeln!(out, "{}", command(["all:".to_string(), command(defaults)]));

  if !aliases.is_empty() {
    let _ = writeln!(out);
    for plan in &aliases {
      let _ = writeln!(out, "{}: {}", plan.name, plan.artifact);
    }
  }

  let _ = writeln!(out);
  let _ = writeln!(out, "clean:");
  if !plans.is_empty() {
    let _ = writeln!(out, "\trm -f {}", command(plans.iter().map(|p| p.artifact.as_str())));
    let _ = writeln!(out, "\trm -rf {}", command(plans.iter().map(|p| p.object_dir.as_str())));
  }

  if !plans.is_empty() {
    let _ = writeln!(out);
    for plan in plans {
      let _ = writeln!(out, "include {}/build.make", plan.object_dir);
    }
  }

  out
}

fn fragment(plan: &TargetPlan, ctx: &GenerationContext) -> String {
  let mut out = String::from(HEADER);
  let _ = writeln!(out, "# Target {} ({}) in project {}", plan.name, plan.kind, plan.project);

  for object in &plan.objects {
    let source = object.source.display().to_string();
    let flags = plan.compile_flags.get(object.language).map(|f| f.join(" ")).unwrap_or_default();
    let _ = writeln!(out);
    let _ = writeln!(out, "{}: {}", object.object, source);
    let _ = writeln!(out, "\t@mkdir -p $(@D)");
    let _ = writeln!(
      out,
      "\t{}",
      command([tool(object.language, ctx), flags, "-c".to_string(), source, "-o".to_string(), object.object.clone()])
    );
  }

  let objects = command(plan.objects.iter().map(|o| o.object.as_str()));
  let linked = command(plan.linked_targets().map(|t| t.artifact.as_str()));
  let mut inputs = command([objects.as_str(), linked.as_str()]);
  if !plan.prerequisites.is_empty() {
    let order_only = command(plan.prerequisites.iter().map(|t| t.artifact.as_str()));
    inputs = command([inputs, "|".to_string(), order_only]);
  }

  let _ = writeln!(out);
  let _ = writeln!(out, "{}", command([format!("{}:", plan.artifact), inputs]));
  match plan.kind {
    TargetKind::StaticLibrary => {
      let _ = writeln!(out, "\t@rm -f {}", plan.artifact);
      let _ = writeln!(out, "\t{}", command(["$(AR) rcs", plan.artifact.as_str(), objects.as_str()]));
    }
    _ => {
      let libraries = command(plan.link_libraries.iter().map(|l| l.path()));
      let _ = writeln!(
        out,
        "\t{}",
        command([
          tool(&plan.linker_language, ctx),
          plan.link_flags.join(" "),
          "-o".to_string(),
          plan.artifact.clone(),
          objects,
          libraries,
        ])
      );
    }
  }

  out
}
