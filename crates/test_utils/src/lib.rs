//! Fixture helpers shared by the integration tests of every crate.
//!
//! Fixtures are schema markup files under `test_data/` at the workspace root.

use once_cell::sync::Lazy;
use std::path::PathBuf;

pub(crate) static WORKSPACE_ROOT: Lazy<PathBuf> = Lazy::new(|| {
    let mut current = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    loop {
        if current.join("Cargo.toml").exists() {
            let cargo_toml = std::fs::read_to_string(current.join("Cargo.toml"))
                .expect("Failed to read Cargo.toml");
            if cargo_toml.contains("[workspace]") {
                return current;
            }
        }

        current = current
            .parent()
            .expect("Could not find workspace root")
            .to_path_buf();
    }
});

/// Extension of schema markup fixtures.
pub const FIXTURE_EXTENSION: &str = "md";

pub fn test_data_path() -> PathBuf {
    WORKSPACE_ROOT.join("test_data")
}

/// Absolute path of a fixture, given relative to `test_data/` (e.g. `current/shop.md`).
pub fn fixture_path(name: &str) -> PathBuf {
    test_data_path().join(name)
}

/// Read a fixture, panicking with its path when it cannot be read.
pub fn read_fixture(name: &str) -> String {
    let path = fixture_path(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture '{}': {}", path.display(), e))
}

/// File names of every markup fixture in a `test_data/` subdirectory, sorted.
pub fn list_fixtures(subdir: &str) -> Vec<String> {
    let dir_path = test_data_path().join(subdir);

    let mut fixtures: Vec<String> = std::fs::read_dir(&dir_path)
        .unwrap_or_else(|e| panic!("Failed to read directory '{}': {}", dir_path.display(), e))
        .filter_map(|entry| {
            entry.ok().and_then(|e| {
                let path = e.path();
                if path.extension()?.to_str()? == FIXTURE_EXTENSION {
                    path.file_name()?.to_str().map(String::from)
                } else {
                    None
                }
            })
        })
        .collect();
    fixtures.sort();
    fixtures
}
