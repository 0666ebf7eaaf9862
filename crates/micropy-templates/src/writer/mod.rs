//! Writers that place rendered template output on disk
//!
//! - **JsonMergeWriter**: deep-merges the rendered object over the file
//! - **LineWriter**: replaces only lines carrying a managed marker
//! - **CreateOnlyWriter**: writes once, never touches an existing file

mod create;
mod json;
mod lines;

pub use create::CreateOnlyWriter;
pub use json::JsonMergeWriter;
pub use lines::LineWriter;

use crate::Result;
use micropy_fs::NormalizedPath;

/// How a rendered file is reconciled with what is already on disk.
pub trait TemplateWriter: std::fmt::Debug + Send + Sync {
    /// Write `rendered` to `path`.
    ///
    /// Returns `false` when the file was left untouched.
    fn write(&self, path: &NormalizedPath, rendered: &str) -> Result<bool>;

    /// Whether re-rendering on update may touch an existing file.
    fn updates_existing(&self) -> bool {
        true
    }
}
