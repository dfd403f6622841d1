//! Integration tests for buildgen-lib.

mod common;

mod generation_tests;
mod session_tests;
