//! Shared helpers for the end-to-end tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use usdb::CompileOutput;

/// Path to a file under tests/fixtures/
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn load_fixture(name: &str) -> String {
    fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Every fixture with the given extension
pub fn fixtures_with_extension(ext: &str) -> Vec<PathBuf> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .expect("Failed to read fixtures directory")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(ext))
        .collect();
    paths.sort();
    paths
}

/// Assert that compilation succeeds and return the C code
pub fn assert_compiles(output: &CompileOutput) -> &str {
    assert!(
        output.success,
        "Expected compilation to succeed:\n{}",
        output
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    );
    output.c_code.as_deref().expect("successful compile has C code")
}

/// Assert that `needle` occurs in `haystack`, showing the haystack otherwise
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected to find {:?} in:\n{}",
        needle,
        haystack
    );
}
