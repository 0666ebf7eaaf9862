//! [`TestProject`] temp directories for project scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary workspace holding a micropy home and a project directory.
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The micropy home (`<root>/home`).
    pub fn home(&self) -> PathBuf {
        self.root().join("home")
    }

    /// The installed-stubs directory inside the home.
    pub fn stubs_root(&self) -> PathBuf {
        self.home().join("stubs")
    }

    /// The project directory (`<root>/project`).
    pub fn project(&self) -> PathBuf {
        self.root().join("project")
    }

    /// A scratch directory for source packages (`<root>/sources`).
    pub fn sources(&self) -> PathBuf {
        let dir = self.root().join("sources");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Parse a JSON file relative to the project directory.
    pub fn read_json(&self, path: &str) -> serde_json::Value {
        let full_path = self.project().join(path);
        let text = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        serde_json::from_str(&text)
            .unwrap_or_else(|e| panic!("Invalid JSON in {}: {e}", full_path.display()))
    }

    /// Assert that `path` (relative to the project) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.project().join(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the project) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.project().join(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.project().join(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
