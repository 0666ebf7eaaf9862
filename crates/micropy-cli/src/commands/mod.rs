//! Command implementations for micropy-cli

pub mod init;
pub mod install;
pub mod stubs;

pub use init::run_init;
pub use install::run_install;
pub use stubs::{run_stubs_add, run_stubs_list, run_stubs_search};
