//! Line-based writer for INI-like files
//!
//! Only lines containing one of the writer's markers are managed. On an
//! existing file each managed line is swapped for the freshly rendered
//! line carrying the same marker; everything else is left as the user
//! wrote it.

use super::TemplateWriter;
use crate::Result;
use micropy_fs::{NormalizedPath, io};

#[derive(Debug, Clone)]
pub struct LineWriter {
    markers: Vec<&'static str>,
}

impl LineWriter {
    pub fn new(markers: &[&'static str]) -> Self {
        Self {
            markers: markers.to_vec(),
        }
    }

    pub fn markers(&self) -> &[&'static str] {
        &self.markers
    }

    /// Merge `rendered` into `existing`, replacing managed lines only.
    pub fn merge(&self, existing: &str, rendered: &str) -> String {
        let fresh: Vec<(&str, &str)> = self
            .markers
            .iter()
            .filter_map(|marker| {
                rendered
                    .lines()
                    .find(|line| line.contains(marker))
                    .map(|line| (*marker, line))
            })
            .collect();

        let mut out: Vec<&str> = Vec::new();
        for line in existing.lines() {
            let replacement = fresh
                .iter()
                .find(|(marker, _)| line.contains(marker))
                .map(|(_, line)| *line);
            out.push(replacement.unwrap_or(line));
        }

        let mut merged = out.join("\n");
        if existing.ends_with('\n') {
            merged.push('\n');
        }
        merged
    }
}

impl TemplateWriter for LineWriter {
    fn write(&self, path: &NormalizedPath, rendered: &str) -> Result<bool> {
        if !path.exists() {
            io::write_text(path, rendered)?;
            return Ok(true);
        }
        let existing = io::read_text(path)?;
        let merged = self.merge(&existing, rendered);
        if merged == existing {
            return Ok(false);
        }
        io::write_text(path, &merged)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn writer() -> LineWriter {
        LineWriter::new(&["Loaded Stubs:", "init-hook"])
    }

    #[test]
    fn test_merge_replaces_only_managed_lines() {
        let existing = "[MASTER]\n# Loaded Stubs: old\ninit-hook='old'\n\n# my note\ndisable = all\n";
        let rendered = "[MASTER]\n# Loaded Stubs: esp32\ninit-hook='new'\n";

        assert_eq!(
            writer().merge(existing, rendered),
            "[MASTER]\n# Loaded Stubs: esp32\ninit-hook='new'\n\n# my note\ndisable = all\n"
        );
    }

    #[test]
    fn test_removed_marker_stays_removed() {
        let existing = "[MASTER]\n# Loaded Stubs: old\n";
        let rendered = "[MASTER]\n# Loaded Stubs: esp32\ninit-hook='new'\n";
        assert_eq!(
            writer().merge(existing, rendered),
            "[MASTER]\n# Loaded Stubs: esp32\n"
        );
    }

    #[test]
    fn test_write_reports_unchanged() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path()).join(".pylintrc");
        let rendered = "# Loaded Stubs: esp32\ninit-hook='x'\n";

        assert!(writer().write(&path, rendered).unwrap());
        assert!(!writer().write(&path, rendered).unwrap());
        assert_eq!(fs::read_to_string(path.to_native()).unwrap(), rendered);
    }
}
