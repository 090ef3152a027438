//! Configuration management for the rs274 tools.
//!
//! Handles:
//! - Command-line argument parsing
//! - Flavor directory configuration
//! - Building the flavor registry the tools run with

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::debug;

use crate::flavor::{FlavorRegistry, BUILTIN_FLAVOR};

/// Command-line arguments of `rs274-annotate`
#[derive(Debug, Parser)]
#[command(name = "rs274-annotate")]
#[command(about = "Parse an RS-274 G-code file and annotate every word")]
#[command(version)]
pub struct Args {
    /// G-code file to read
    pub file: PathBuf,

    /// Explicitly specify the flavor to use
    #[arg(long, help = "Flavor to use (default: rs274ngc)")]
    pub flavor: Option<String>,

    /// Custom flavor directory to search for flavor files
    #[arg(long, help = "Directory containing flavor TOML files")]
    pub flavor_dir: Option<PathBuf>,

    #[arg(
        long,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    pub file: PathBuf,
    /// Flavor name explicitly set via command line
    pub cli_flavor: Option<String>,
    /// Flavor directories, in load order; later ones override earlier ones
    pub flavor_dirs: Vec<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let mut flavor_dirs = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            flavor_dirs.push(config_dir.join("rs274").join("flavors"));
        }

        if let Some(custom_dir) = args.flavor_dir {
            if !custom_dir.is_dir() {
                bail!("flavor directory {} does not exist", custom_dir.display());
            }
            flavor_dirs.push(custom_dir);
        }

        Ok(Config {
            file: args.file,
            cli_flavor: args.flavor,
            flavor_dirs,
            log_level: args.log_level,
        })
    }

    /// Flavor requested on the command line, or the embedded one
    pub fn get_effective_flavor(&self) -> &str {
        self.cli_flavor.as_deref().unwrap_or(BUILTIN_FLAVOR)
    }

    /// Registry with the embedded flavor, every flavor directory, and the
    /// effective flavor activated
    pub fn build_registry(&self) -> Result<FlavorRegistry> {
        let mut registry = FlavorRegistry::with_builtin();
        for dir in &self.flavor_dirs {
            let loaded = registry
                .load_directory(dir)
                .with_context(|| format!("failed to load flavors from {}", dir.display()))?;
            debug!("Loaded {} flavors from {}", loaded, dir.display());
        }

        let name = self.get_effective_flavor();
        if !registry.set_active_flavor(name) {
            bail!(
                "unknown flavor '{}', available: {}",
                name,
                registry.list_flavors().join(", ")
            );
        }
        Ok(registry)
    }
}
