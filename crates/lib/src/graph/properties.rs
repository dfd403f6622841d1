//! Known target properties per kind.
//!
//! The property bag stays open: anything outside these lists is kept but
//! reported as a [`PropertyWarning`](super::PropertyWarning).

use super::types::TargetKind;

const COMMON: &[&str] = &["FOLDER", "LABELS"];

const BUILDABLE: &[&str] = &[
  "OUTPUT_NAME",
  "COMPILE_DEFINITIONS",
  "COMPILE_OPTIONS",
  "INCLUDE_DIRECTORIES",
  "EXCLUDE_FROM_ALL",
  "LINKER_LANGUAGE",
  "PREFIX",
  "SUFFIX",
];

const USAGE: &[&str] = &["INTERFACE_COMPILE_DEFINITIONS", "INTERFACE_INCLUDE_DIRECTORIES"];

const LINKED: &[&str] = &["LINK_OPTIONS"];

const VERSIONED: &[&str] = &["VERSION", "SOVERSION"];

const IMPORTED: &[&str] = &["IMPORTED_LOCATION"];

/// Whether `property` is recognized for targets of `kind`.
pub fn is_known(kind: TargetKind, property: &str) -> bool {
  let groups: &[&[&str]] = match kind {
    TargetKind::Executable => &[COMMON, BUILDABLE, USAGE, LINKED],
    TargetKind::StaticLibrary => &[COMMON, BUILDABLE, USAGE],
    TargetKind::SharedLibrary => &[COMMON, BUILDABLE, USAGE, LINKED, VERSIONED],
    TargetKind::ModuleLibrary => &[COMMON, BUILDABLE, USAGE, LINKED],
    TargetKind::UnknownLibrary => &[COMMON, USAGE, IMPORTED],
    TargetKind::InterfaceLibrary => &[COMMON, USAGE],
  };

  groups.iter().any(|group| group.contains(&property))
}
