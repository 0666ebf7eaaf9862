//! Shared test fixtures for the micropy workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`archive`]: in-memory `.tar.gz` builders
//! - [`stubs`]: on-disk device, firmware and distribution stub packages
//! - [`repo`]: repository source documents
//! - [`project`]: [`TestProject`](project::TestProject) temp directories
//!   with assertion helpers

pub mod archive;
pub mod project;
pub mod repo;
pub mod stubs;
