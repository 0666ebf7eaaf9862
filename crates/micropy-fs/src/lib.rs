//! Filesystem primitives for micropy
//!
//! Provides normalized path handling, atomic writes, directory
//! copy/link helpers used by the stub manager, and the [`ServiceLog`]
//! handle every service receives at construction.

pub mod checksum;
pub mod constants;
pub mod error;
pub mod io;
pub mod log;
pub mod path;

pub use constants::MicropyPath;
pub use error::{Error, Result};
pub use log::ServiceLog;
pub use path::NormalizedPath;
