//! Configuration store for micropy
//!
//! A [`Config`] is a JSON tree addressed by `/`-separated key paths
//! (`stubs/esp32-micropython-1.11.0`, `sub/items/0`). Every mutation is
//! written through to its [`ConfigSource`] before the call returns.
//!
//! Two sources ship with the crate:
//!
//! - [`JsonSource`]: a pretty-printed JSON file, created lazily on the
//!   first mutation
//! - [`DictSource`]: an in-memory tree, used for the project Context and
//!   in tests

pub mod error;
pub mod source;
pub mod store;
pub mod tree;

pub use error::{Error, Result};
pub use source::{ConfigSource, DictSource, JsonSource};
pub use store::Config;
pub use tree::{KeyPath, deep_merge};
