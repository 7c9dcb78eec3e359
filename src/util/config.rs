//! Configuration file support for Drydock.
//!
//! Drydock supports two configuration file locations:
//! - Global: `~/.config/drydock/config.toml` - User-wide defaults
//! - Project: `drydock/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. The `drydock/`
//! directory is the tool's private-state directory and is excluded from
//! source scanning.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Drydock configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discovery settings
    pub discovery: DiscoveryConfig,
}

/// Settings controlling dependency discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Package names excluded from both direct and transitive results.
    pub ignored_packages: Vec<String>,

    /// Add the drydock runtime support package to every result.
    pub implicit_runtime: bool,

    /// Probe for shiny applications that never call a package loader.
    pub implicit_frameworks: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            ignored_packages: Vec::new(),
            implicit_runtime: true,
            implicit_frameworks: true,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist
    /// or fails to parse.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Load the layered configuration for a project: global config first,
    /// then the project's `drydock/config.toml` merged on top.
    pub fn load_layered(project_root: &Path) -> Self {
        let mut config = match global_config_path() {
            Some(path) => Self::load_or_default(&path),
            None => Self::default(),
        };

        let project_path = project_config_path(project_root);
        if project_path.exists() {
            let project = Self::load_or_default(&project_path);
            config.merge(project);
        }

        config
    }

    /// Merge another config over this one. List fields are unioned, boolean
    /// toggles take the overriding value.
    pub fn merge(&mut self, other: Config) {
        for pkg in other.discovery.ignored_packages {
            if !self.discovery.ignored_packages.contains(&pkg) {
                self.discovery.ignored_packages.push(pkg);
            }
        }
        self.discovery.implicit_runtime = other.discovery.implicit_runtime;
        self.discovery.implicit_frameworks = other.discovery.implicit_frameworks;
    }

    /// The project-scoped set of package names to exclude from results.
    pub fn ignored_packages(&self) -> HashSet<String> {
        self.discovery.ignored_packages.iter().cloned().collect()
    }
}

/// Path to the project-level config file.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root
        .join(crate::core::project::PRIVATE_DIR)
        .join("config.toml")
}

/// Path to the global config file, if a home directory can be determined.
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "drydock")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}
