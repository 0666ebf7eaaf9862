//! Install command implementation

use std::path::Path;

use colored::Colorize;

use crate::context::Environment;
use crate::error::Result;

/// Run the install command
///
/// With no packages, editables or requirements file, refreshes the
/// packages already listed in the manifest.
pub fn run_install(
    env: &Environment,
    root: &Path,
    packages: &[String],
    editable: &[String],
    dev: bool,
    requirements: Option<&Path>,
) -> Result<()> {
    let mut project = env.load_project(root)?;
    let kind = if dev { "development " } else { "" };

    if let Some(file) = requirements {
        println!(
            "{} Adding {}requirements from {}...",
            "=>".blue().bold(),
            kind,
            file.display().to_string().cyan()
        );
        let added = project.add_from_file(Some(file), dev)?;
        report(&added);
        return Ok(());
    }

    let specs: Vec<String> = packages
        .iter()
        .cloned()
        .chain(editable.iter().map(|path| format!("-e {path}")))
        .collect();

    if specs.is_empty() {
        println!("{} Installing project requirements...", "=>".blue().bold());
        project.update()?;
        println!("{} Requirements up to date", "OK".green().bold());
        return Ok(());
    }

    let mut added = Vec::new();
    for spec in &specs {
        println!("{} Adding {}{}...", "=>".blue().bold(), kind, spec.cyan());
        if project.add_package(spec, dev)? {
            added.push(spec.clone());
        } else {
            println!("   {} {} is already listed", "warning:".yellow().bold(), spec);
        }
    }
    report(&added);
    Ok(())
}

fn report(added: &[String]) {
    if added.is_empty() {
        println!("{} Nothing new to add", "OK".green().bold());
    } else {
        println!("{} Added {}", "OK".green().bold(), added.join(", ").yellow());
    }
}
