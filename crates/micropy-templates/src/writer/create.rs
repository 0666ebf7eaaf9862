//! Create-only writer for files the user owns after the first render

use super::TemplateWriter;
use crate::Result;
use micropy_fs::{NormalizedPath, io};

/// Writes the rendered file only if nothing exists at the path.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreateOnlyWriter;

impl TemplateWriter for CreateOnlyWriter {
    fn write(&self, path: &NormalizedPath, rendered: &str) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        io::write_text(path, rendered)?;
        Ok(true)
    }

    fn updates_existing(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let path = NormalizedPath::new(temp.path()).join("src/main.py");

        assert!(CreateOnlyWriter.write(&path, "# main.py\n").unwrap());
        fs::write(path.to_native(), "print('mine')\n").unwrap();
        assert!(!CreateOnlyWriter.write(&path, "# main.py\n").unwrap());

        assert_eq!(fs::read_to_string(path.to_native()).unwrap(), "print('mine')\n");
    }
}
