//! Well-known names shared across the engine.

pub const APP_NAME: &str = "buildgen";

/// Name of the persisted cache file inside the build directory.
pub const CACHE_FILENAME: &str = "BuildCache.txt";

/// Environment variable consulted for the resource root when none is passed explicitly.
pub const RESOURCE_ROOT_ENV: &str = "BGEN_RESOURCE_ROOT";

/// Default declarations file, relative to the source directory.
pub const DEFAULT_PROJECTS_FILENAME: &str = "projects.json";

/// Number of hex characters kept when a content hash is shortened for display.
pub const HASH_PREFIX_LEN: usize = 12;

// Cache keys seeded or consulted by the engine.
pub const KEY_GENERATOR: &str = "BG_GENERATOR";
pub const KEY_HOME_DIRECTORY: &str = "BG_HOME_DIRECTORY";
pub const KEY_GENERATOR_PLATFORM: &str = "BG_GENERATOR_PLATFORM";
pub const KEY_RESOURCE_ROOT: &str = "BG_RESOURCE_ROOT";
pub const KEY_PROJECTS_FILE: &str = "BG_PROJECTS_FILE";
pub const KEY_BUILD_TYPE: &str = "BG_BUILD_TYPE";
pub const KEY_CONFIGURATION_TYPES: &str = "BG_CONFIGURATION_TYPES";
pub const KEY_AR: &str = "BG_AR";

/// Cache key holding the compiler for `language`, e.g. `BG_CXX_COMPILER`.
pub fn compiler_key(language: &str) -> String {
  format!("BG_{}_COMPILER", language)
}

/// Cache key holding the base flags for `language`, e.g. `BG_C_FLAGS`.
pub fn flags_key(language: &str) -> String {
  format!("BG_{}_FLAGS", language)
}
