//! Project module graph for micropy
//!
//! A [`Project`] is a directory plus a set of [`ProjectModule`]s that
//! cooperate through the persisted manifest (`micropy.json`) and an
//! in-memory Context:
//!
//! - [`StubsModule`]: device stubs linked into `.micropy/`
//! - [`PackagesModule`]: runtime and development requirements, with
//!   interface stubs synthesized for fetched packages
//! - [`TemplatesModule`]: editor settings and project files rendered from
//!   the Context
//!
//! Modules expose named [`hooks`] that the project dispatches by name and
//! discriminating arguments.

pub mod error;
pub mod hooks;
pub mod module;
pub mod modules;
pub mod package;
pub mod project;
pub mod requirement;
pub mod stubgen;

pub use error::{Error, Result};
pub use hooks::{HookCall, HookRegistry, HookSpec};
pub use module::{ProjectModule, ProjectState};
pub use modules::{PackagesModule, StubsModule, TemplatesModule};
pub use package::{PackageFetcher, PypiFetcher};
pub use project::Project;
pub use requirement::Requirement;
