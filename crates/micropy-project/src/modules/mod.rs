//! Built-in project modules

mod packages;
mod stubs;
mod templates;

pub use packages::PackagesModule;
pub use stubs::{STUBS_KEY, StubsModule};
pub use templates::{TOGGLE_KEYS, TemplatesModule};
