mod common;

mod cache_tests;
mod configure_tests;
mod generate_tests;
