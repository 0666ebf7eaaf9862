//! JSON writer with deep merge
//!
//! Existing keys the template does not render are preserved; rendered
//! keys replace their previous values, recursing into nested objects.

use super::TemplateWriter;
use crate::Result;
use micropy_config::deep_merge;
use micropy_fs::{NormalizedPath, io};
use serde_json::{Value, json};

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMergeWriter;

impl JsonMergeWriter {
    fn load(path: &NormalizedPath) -> Result<Value> {
        if !path.exists() {
            return Ok(json!({}));
        }
        let content = io::read_text(path)?;
        if content.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl TemplateWriter for JsonMergeWriter {
    fn write(&self, path: &NormalizedPath, rendered: &str) -> Result<bool> {
        let incoming: Value = serde_json::from_str(rendered)?;
        let mut settings = Self::load(path)?;
        if !settings.is_object() {
            settings = json!({});
        }
        deep_merge(&mut settings, &incoming);
        let mut content = serde_json::to_string_pretty(&settings)?;
        content.push('\n');
        io::write_text(path, &content)?;
        Ok(true)
    }
}
