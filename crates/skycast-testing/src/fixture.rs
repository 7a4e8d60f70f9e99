//! Contract fixture loader.
//!
//! Loads recorded upstream responses from `contracts/providers/`.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// Load a fixture file relative to the workspace root.
///
/// # Example
/// ```no_run
/// use skycast_testing::fixture::Fixture;
/// let val = Fixture::load("contracts/providers/weatherapi/current_london.json");
/// ```
pub struct Fixture;

impl Fixture {
    /// Parse the JSON fixture at `workspace_root/relative_path`.
    ///
    /// Panics if the file is missing or invalid JSON.
    pub fn load(relative_path: &str) -> Value {
        let contents = Self::text(relative_path);
        serde_json::from_str(&contents)
            .unwrap_or_else(|e| panic!("invalid JSON in fixture {relative_path}: {e}"))
    }

    /// Raw contents of the fixture at `workspace_root/relative_path`.
    pub fn text(relative_path: &str) -> String {
        let full_path = workspace_root().join(relative_path);
        std::fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("fixture not found at {}: {e}", full_path.display()))
    }
}

fn workspace_root() -> PathBuf {
    let here = Path::new(env!("CARGO_MANIFEST_DIR"));
    here.ancestors()
        .find(|dir| dir.join("contracts").is_dir())
        .unwrap_or(here)
        .to_path_buf()
}
