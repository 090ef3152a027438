//! Flavor Registry
//!
//! In-memory registry of loaded flavors. The RS274/NGC flavor is embedded in
//! the binary; more can be loaded from directories of TOML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use super::tables::Flavor;
use crate::error::ConfigLoadError;

/// Name of the embedded flavor
pub const BUILTIN_FLAVOR: &str = "rs274ngc";

const BUILTIN_FLAVOR_TOML: &str = include_str!("../../resources/flavors/rs274ngc.toml");

/// The NIST RS274/NGC tables shipped with the crate
pub fn builtin_flavor() -> Result<Flavor, ConfigLoadError> {
    Flavor::from_toml(BUILTIN_FLAVOR_TOML)
}

#[derive(Debug, Clone, Default)]
pub struct FlavorRegistry {
    flavors: HashMap<String, Arc<Flavor>>,
    active_flavor: Option<String>,
}

impl FlavorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the embedded flavor, already active
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.add_builtin_flavor();
        registry.set_active_flavor(BUILTIN_FLAVOR);
        registry
    }

    pub fn add_builtin_flavor(&mut self) {
        match builtin_flavor() {
            Ok(flavor) => self.add_flavor(flavor),
            Err(e) => warn!("Failed to load embedded {} flavor: {}", BUILTIN_FLAVOR, e),
        }
    }

    /// Add a flavor, replacing any flavor of the same name
    pub fn add_flavor(&mut self, flavor: Flavor) {
        info!("Registered flavor '{}'", flavor.name);
        self.flavors.insert(flavor.name.clone(), Arc::new(flavor));
    }

    /// Set the active flavor
    pub fn set_active_flavor(&mut self, name: &str) -> bool {
        if self.flavors.contains_key(name) {
            self.active_flavor = Some(name.to_string());
            true
        } else {
            false
        }
    }

    /// Get the currently active flavor
    pub fn get_active_flavor(&self) -> Option<Arc<Flavor>> {
        self.active_flavor
            .as_ref()
            .and_then(|name| self.flavors.get(name))
            .cloned()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Flavor>> {
        self.flavors.get(name).cloned()
    }

    /// List all available flavors, sorted by name
    pub fn list_flavors(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.flavors.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Load every `*.toml` file of a directory.
    ///
    /// Files that fail to load are logged and skipped. A missing directory
    /// loads nothing. Returns the number of flavors added.
    pub fn load_directory(&mut self, dir: &Path) -> Result<usize, ConfigLoadError> {
        if !dir.is_dir() {
            debug!("Flavor directory {} does not exist", dir.display());
            return Ok(0);
        }
        let entries = fs::read_dir(dir).map_err(|source| ConfigLoadError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut loaded = 0;
        for path in paths {
            match Flavor::from_path(&path) {
                Ok(flavor) => {
                    self.add_flavor(flavor);
                    loaded += 1;
                }
                Err(e) => warn!("Skipping flavor file {}: {}", path.display(), e),
            }
        }
        Ok(loaded)
    }
}
