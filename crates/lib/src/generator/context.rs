//! Toolchain and directory settings handed to every generator.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::cache::ConfigCache;
use crate::consts::{KEY_AR, KEY_BUILD_TYPE, KEY_CONFIGURATION_TYPES, KEY_GENERATOR_PLATFORM, compiler_key, flags_key};

/// Languages that generators know how to compile.
pub const LANGUAGES: [&str; 2] = ["C", "CXX"];

pub const DEFAULT_CONFIGURATIONS: &str = "Debug;Release";

pub const DEFAULT_ARCHIVER: &str = "ar";

/// Compiler used for `language` when the cache names none.
pub fn default_compiler(language: &str) -> &'static str {
  match language {
    "CXX" => "c++",
    _ => "cc",
  }
}

/// Flags implied by a configuration name.
pub fn configuration_flags(configuration: &str) -> &'static [&'static str] {
  match configuration {
    "Debug" => &["-g"],
    "Release" => &["-O3", "-DNDEBUG"],
    "RelWithDebInfo" => &["-O2", "-g", "-DNDEBUG"],
    "MinSizeRel" => &["-Os", "-DNDEBUG"],
    _ => &[],
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationContext {
  /// Absolute source directory; relative sources resolve against it.
  pub source_dir: PathBuf,
  /// Absolute build directory; every output path is relative to it.
  pub build_dir: PathBuf,
  pub platform: Option<String>,
  /// Single-configuration build type, if any.
  pub build_type: Option<String>,
  /// Configurations for multi-configuration dialects.
  pub configurations: Vec<String>,
  pub archiver: String,
  compilers: BTreeMap<String, String>,
  flags: BTreeMap<String, String>,
}

impl GenerationContext {
  /// A context with default toolchain settings.
  pub fn new(source_dir: &Path, build_dir: &Path) -> Self {
    Self {
      source_dir: source_dir.to_path_buf(),
      build_dir: build_dir.to_path_buf(),
      platform: None,
      build_type: None,
      configurations: split_list(DEFAULT_CONFIGURATIONS),
      archiver: DEFAULT_ARCHIVER.to_string(),
      compilers: BTreeMap::new(),
      flags: BTreeMap::new(),
    }
  }

  /// Read toolchain settings from the cache, falling back to defaults.
  pub fn from_cache(cache: &ConfigCache, source_dir: &Path, build_dir: &Path) -> Self {
    let mut ctx = Self::new(source_dir, build_dir);

    ctx.platform = non_empty(cache.value(KEY_GENERATOR_PLATFORM));
    ctx.build_type = non_empty(cache.value(KEY_BUILD_TYPE));
    if let Some(types) = non_empty(cache.value(KEY_CONFIGURATION_TYPES)) {
      let configurations = split_list(&types);
      if !configurations.is_empty() {
        ctx.configurations = configurations;
      }
    }
    if let Some(ar) = non_empty(cache.value(KEY_AR)) {
      ctx.archiver = ar;
    }

    for language in LANGUAGES {
      if let Some(compiler) = non_empty(cache.value(&compiler_key(language))) {
        ctx.compilers.insert(language.to_string(), compiler);
      }
      if let Some(flags) = non_empty(cache.value(&flags_key(language))) {
        ctx.flags.insert(language.to_string(), flags);
      }
    }

    ctx
  }

  pub fn with_compiler(mut self, language: &str, compiler: &str) -> Self {
    self.compilers.insert(language.to_string(), compiler.to_string());
    self
  }

  pub fn with_flags(mut self, language: &str, flags: &str) -> Self {
    self.flags.insert(language.to_string(), flags.to_string());
    self
  }

  pub fn compiler(&self, language: &str) -> &str {
    self
      .compilers
      .get(language)
      .map(String::as_str)
      .unwrap_or_else(|| default_compiler(language))
  }

  /// Base flags for `language`, split on whitespace.
  pub fn language_flags(&self, language: &str) -> Vec<String> {
    self
      .flags
      .get(language)
      .map(|f| f.split_whitespace().map(str::to_string).collect())
      .unwrap_or_default()
  }

  /// Resolve a source-relative path.
  pub fn source_path(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.source_dir.join(path)
    }
  }
}

fn non_empty(value: Option<&str>) -> Option<String> {
  value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

fn split_list(value: &str) -> Vec<String> {
  value
    .split(';')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
    .collect()
}
