//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// micropy - MicroPython project manager
#[derive(Parser, Debug)]
#[command(name = "micropy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Root directory for installed stubs
    #[arg(long, global = true, env = "MICROPY_HOME")]
    pub home: Option<PathBuf>,

    /// Stub repository source documents (URLs or files)
    #[arg(long = "source", global = true, env = "MICROPY_SOURCES", value_delimiter = ',')]
    pub sources: Vec<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a new project
    ///
    /// Examples:
    ///   micropy init                          # Project in the current directory
    ///   micropy init blinky -s esp32-micropython-1.11.0
    ///   micropy init blinky -t vscode -t main # Only some templates
    Init {
        /// Project directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Stubs to add to the project
        #[arg(short, long = "stub")]
        stubs: Vec<String>,

        /// Templates to render (defaults to all)
        #[arg(short, long = "template")]
        templates: Vec<String>,
    },

    /// Add packages to the project, or install the ones it lists
    Install {
        /// Packages to add, e.g. `picoweb` or `picoweb==1.5.2`
        packages: Vec<String>,

        /// Local package directories to reference in place
        #[arg(short, long)]
        editable: Vec<String>,

        /// Add as development dependencies
        #[arg(short, long)]
        dev: bool,

        /// Add every requirement listed in this file
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Manage installed stubs
    Stubs {
        #[command(subcommand)]
        action: StubsAction,
    },
}

/// Stub subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum StubsAction {
    /// Install a stub by repository name, archive, URL or directory
    Add {
        /// What to install
        location: String,

        /// Replace an installed stub of the same name
        #[arg(short, long)]
        force: bool,
    },

    /// Search the stub repositories
    Search {
        /// Case-insensitive name fragment
        query: String,

        /// Show every version, not only the latest
        #[arg(long)]
        versions: bool,
    },

    /// List installed stubs grouped by firmware
    List,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("micropy").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_init_collects_repeated_flags() {
        let cli = parse(&["init", "blinky", "-s", "esp32", "-s", "esp8266", "-t", "vscode"]);
        assert_eq!(
            cli.command,
            Some(Commands::Init {
                path: PathBuf::from("blinky"),
                name: None,
                stubs: vec!["esp32".into(), "esp8266".into()],
                templates: vec!["vscode".into()],
            })
        );
    }

    #[test]
    fn test_install_accepts_editable_spec() {
        let cli = parse(&["install", "-e", "./lib/drivers"]);
        match cli.command {
            Some(Commands::Install {
                packages, editable, ..
            }) => {
                assert!(packages.is_empty());
                assert_eq!(editable, vec!["./lib/drivers"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_home_flag() {
        let cli = parse(&["stubs", "list", "--home", "/tmp/micropy"]);
        assert_eq!(cli.home, Some(PathBuf::from("/tmp/micropy")));
        assert_eq!(
            cli.command,
            Some(Commands::Stubs {
                action: StubsAction::List
            })
        );
    }

    #[test]
    fn test_sources_split_on_commas() {
        let cli = parse(&["--source", "a.json,b.json", "stubs", "search", "esp"]);
        assert_eq!(cli.sources, vec!["a.json", "b.json"]);
    }
}
