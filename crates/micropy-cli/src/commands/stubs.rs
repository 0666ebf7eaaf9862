//! Stubs command implementations

use std::collections::HashSet;

use colored::Colorize;
use micropy_stubs::Stub;

use crate::context::Environment;
use crate::error::{CliError, Result};

/// Install a stub package.
pub fn run_stubs_add(env: &Environment, location: &str, force: bool) -> Result<()> {
    println!("{} Adding stub {}...", "=>".blue().bold(), location.cyan());

    let mut manager = env.stub_manager(false)?;
    let installed = manager.add(location, force)?;
    for stub in &installed {
        let label = match stub {
            Stub::Firmware(_) => "firmware",
            Stub::Device(_) => "device",
        };
        println!("   {} {} ({})", "+".green(), stub.name(), label);
    }

    println!(
        "{} Installed {} stub package(s)",
        "OK".green().bold(),
        installed.len()
    );
    Ok(())
}

/// Search the configured repositories.
pub fn run_stubs_search(env: &Environment, query: &str, versions: bool) -> Result<()> {
    let manager = env.stub_manager(true)?;
    let results = manager.repository().search(query, versions);
    if results.is_empty() {
        return Err(CliError::user(format!("No stubs match '{query}'")));
    }

    let installed: HashSet<&str> = manager.devices().map(|d| d.name()).collect();
    println!(
        "{} Results for {}:",
        "=>".blue().bold(),
        query.cyan()
    );
    for entry in results {
        let name = entry.versioned_name();
        let marker = if installed.contains(name.as_str()) || installed.contains(entry.name()) {
            " (installed)".green().to_string()
        } else {
            String::new()
        };
        println!(
            "   {} {}{}",
            name,
            format!("[{}]", entry.repo_name()).dimmed(),
            marker
        );
    }
    Ok(())
}

/// List installed stubs grouped by firmware.
pub fn run_stubs_list(env: &Environment) -> Result<()> {
    let manager = env.stub_manager(false)?;
    println!(
        "{} Installed stubs in {}:",
        "=>".blue().bold(),
        env.home().display().to_string().cyan()
    );
    if manager.devices().next().is_none() {
        println!("   {}", "(none)".dimmed());
        return Ok(());
    }

    for (firmware, devices) in manager.iter_by_firmware() {
        println!("{}", firmware.bold());
        for device in devices {
            println!("   {} {}", device.name(), format!("v{}", device.stub_version()).dimmed());
        }
    }
    Ok(())
}
