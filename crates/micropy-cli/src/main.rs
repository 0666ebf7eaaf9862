//! micropy CLI
//!
//! Creates MicroPython projects and manages the device stubs and packages
//! they reference.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands, StubsAction};
use context::Environment;
use error::Result;

fn main() {
    if let Err(e) = run() {
        tracing::debug!(kind = %e.kind(), "command failed");
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("{} {}", "warning:".yellow().bold(), e);
    }

    let Some(command) = cli.command else {
        println!("{} MicroPython project manager", "micropy".green().bold());
        println!();
        println!("Run {} for available commands.", "micropy --help".cyan());
        return Ok(());
    };

    let env = Environment::resolve(cli.home, cli.sources)?;
    execute_command(&env, command)
}

fn execute_command(env: &Environment, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init {
            path,
            name,
            stubs,
            templates,
        } => commands::run_init(env, &path, name.as_deref(), &stubs, &templates),
        Commands::Install {
            packages,
            editable,
            dev,
            path,
        } => {
            let cwd = std::env::current_dir()?;
            commands::run_install(env, &cwd, &packages, &editable, dev, path.as_deref())
        }
        Commands::Stubs { action } => match action {
            StubsAction::Add { location, force } => commands::run_stubs_add(env, &location, force),
            StubsAction::Search { query, versions } => {
                commands::run_stubs_search(env, &query, versions)
            }
            StubsAction::List => commands::run_stubs_list(env),
        },
    }
}
