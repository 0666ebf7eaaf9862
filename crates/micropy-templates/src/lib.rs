//! Project file templates for micropy
//!
//! A [`TemplateProvider`] renders a set of built-in templates (editor
//! settings, linter config, entry scripts, ignore files) from a
//! [`TemplateContext`]. How a rendered file meets an existing one is up to
//! the template's writer: JSON settings are deep-merged, `.pylintrc` has
//! its stub lines swapped in place, and the remaining files are written
//! once and then left to the user.

pub mod checks;
pub mod context;
pub mod error;
pub mod provider;
pub mod template;
pub mod writer;

pub use checks::{CheckMode, EnvironmentCheck, VsCodeExtensionCheck};
pub use context::TemplateContext;
pub use error::{Error, Result};
pub use provider::TemplateProvider;
pub use template::{BUILTIN_KEYS, Template, builtin};
