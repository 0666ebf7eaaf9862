//! Stub subsystem for micropy
//!
//! - [`stub`]: the on-disk package model (device and firmware stubs)
//! - [`validate`]: JSON-schema classification of `info.json`
//! - [`dist`]: `info.json` synthesis for PyPI stub distributions
//! - [`repository`]: the searchable index of available packages
//! - [`locate`] and [`fetch`]: turning names, URLs and archives into
//!   local directories
//! - [`manager`]: the installed-stubs registry and per-project views

pub mod dist;
pub mod error;
pub mod fetch;
pub mod locate;
pub mod manager;
pub mod repository;
pub mod stub;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
pub use fetch::{NoProgress, Progress};
pub use manager::{StubManager, UNKNOWN_FIRMWARE};
pub use repository::{RepositoryEntry, StubRepository, StubsManifest};
pub use stub::{DeviceStub, FirmwareStub, Stub, StubKind};
pub use validate::StubValidator;
