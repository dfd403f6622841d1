//! Terminal output for `bgen`.
//!
//! Every human-readable line is a [`Status`] marker followed by a message, or
//! an indented `label: value` field. `--format json` skips both and prints the
//! serialized value alone, so scripts never see markers or colors.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{AnsiColors, OwoColorize, Stream};

use buildgen_lib::generator::GenerationReport;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Outcome shown in front of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
  Done,
  Note,
  Warning,
  Failure,
}

impl Status {
  fn marker(self) -> &'static str {
    match self {
      Status::Done => "✓",
      Status::Note => "•",
      Status::Warning => "⚠",
      Status::Failure => "✗",
    }
  }

  fn color(self) -> AnsiColors {
    match self {
      Status::Done => AnsiColors::Green,
      Status::Note => AnsiColors::Blue,
      Status::Warning => AnsiColors::Yellow,
      Status::Failure => AnsiColors::Red,
    }
  }

  /// Warnings and failures go to stderr so piped stdout stays clean.
  fn stream(self) -> Stream {
    match self {
      Status::Done | Status::Note => Stream::Stdout,
      Status::Warning | Status::Failure => Stream::Stderr,
    }
  }
}

fn status_line(status: Status, message: &str) -> String {
  let marker = status
    .marker()
    .if_supports_color(status.stream(), |m| m.color(status.color()))
    .to_string();
  format!("{} {}", marker, message)
}

pub fn status(status: Status, message: &str) {
  let line = status_line(status, message);
  match status.stream() {
    Stream::Stderr => eprintln!("{}", line),
    _ => println!("{}", line),
  }
}

pub fn field(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

/// Elapsed time rounded to milliseconds, e.g. `1s 500ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
  let millis = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
  humantime::format_duration(Duration::from_millis(millis)).to_string()
}

/// Summary printed after a successful configure or generate.
pub fn generation_summary(generator: &str, build_dir: &Path, report: &GenerationReport, elapsed: Duration) {
  status(
    Status::Done,
    &format!("Generated {} files in {}", generator, build_dir.display()),
  );
  field("Written", &report.written.len().to_string());
  field("Unchanged", &report.unchanged.len().to_string());
  field("Duration", &format_elapsed(elapsed));
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
