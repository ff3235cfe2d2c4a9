#![allow(dead_code)]

use std::error::Error;

pub use magicbuild_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// `&[&str]` -> `Vec<String>` for task arguments.
pub fn args(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}
