//! Shared utilities.
//!
//! Content hashing and atomic filesystem writes used by the cache and the
//! generators.

pub mod fs;
pub mod hash;

