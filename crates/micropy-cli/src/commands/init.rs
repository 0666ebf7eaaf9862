//! Init command implementation
//!
//! Creates a new project: manifest, stub links and rendered templates.

use std::path::Path;

use colored::Colorize;
use micropy_stubs::{DeviceStub, StubManager};
use micropy_templates::BUILTIN_KEYS;

use crate::context::Environment;
use crate::error::{CliError, Result};

/// Run the init command
pub fn run_init(
    env: &Environment,
    path: &Path,
    name: Option<&str>,
    stubs: &[String],
    templates: &[String],
) -> Result<()> {
    println!(
        "{} Creating project in {}...",
        "=>".blue().bold(),
        path.display().to_string().cyan()
    );

    let mut manager = env.stub_manager(false)?;
    let selected = select_stubs(&mut manager, stubs)?;
    if !selected.is_empty() {
        let names: Vec<&str> = selected.iter().map(|s| s.name()).collect();
        println!("   Stubs: {}", names.join(", ").yellow());
    }

    let mut project = if templates.is_empty() {
        env.project(path, name, manager, selected, BUILTIN_KEYS)?
    } else {
        println!("   Templates: {}", templates.join(", ").yellow());
        env.project(path, name, manager, selected, templates)?
    };
    if project.exists() {
        return Err(CliError::user(format!(
            "A project already exists in {}",
            path.display()
        )));
    }
    project.create()?;

    println!("{} Project {} created!", "OK".green().bold(), project.name().cyan());
    Ok(())
}

/// Installed stubs named by `requested`, installing any that are missing.
fn select_stubs(manager: &mut StubManager, requested: &[String]) -> Result<Vec<DeviceStub>> {
    let mut selected = Vec::with_capacity(requested.len());
    for location in requested {
        if let Some(stub) = manager.get(location) {
            selected.push(stub.clone());
            continue;
        }
        let added = manager
            .add(location, false)?
            .into_iter()
            .filter_map(|stub| stub.into_device());
        selected.extend(added);
    }
    Ok(selected)
}
