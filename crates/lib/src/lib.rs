//! buildgen-lib: configuration and build-script generation.
//!
//! The pieces, leaves first:
//! - [`cache`]: persistent `KEY:KIND=VALUE` configuration cache
//! - [`decl`]: project and target declarations handed over by a front end
//! - [`graph`]: validated build graph and its deterministic order
//! - [`generator`]: Makefile, Ninja and FASTBuild emitters
//! - [`session`]: the configure/generate state machine tying them together

pub mod cache;
pub mod consts;
pub mod decl;
pub mod generator;
pub mod graph;
pub mod progress;
pub mod session;
pub mod util;
