//! The package metadata index consulted during closure resolution.
//!
//! The resolver treats the index purely as a query service: given a package
//! name and a set of dependency fields, return the packages it declares.
//! [`LibraryIndex`] answers from installed R libraries on disk;
//! [`MemoryIndex`] is an in-memory implementation for embedding and tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::description::{DepField, Description};
use crate::core::project::MANIFEST_NAME;

/// Read-only lookup from package name to declared dependency fields.
pub trait PackageIndex {
    /// Package names declared in the given fields of `name`'s metadata,
    /// in declaration order, deduplicated. Unknown packages yield an empty
    /// list: they are leaves for the resolver, and reporting them missing
    /// is the installation layer's job.
    fn lookup(&self, name: &str, fields: &[DepField]) -> Vec<String>;

    /// Whether the package can be found at all.
    fn exists(&self, name: &str) -> bool;
}

/// An index over an ordered list of installed R library directories.
///
/// Each library directory contains one subdirectory per installed package,
/// holding that package's DESCRIPTION. Earlier paths shadow later ones,
/// matching R's `.libPaths()` semantics.
#[derive(Debug, Clone, Default)]
pub struct LibraryIndex {
    lib_paths: Vec<PathBuf>,
}

impl LibraryIndex {
    pub fn new(lib_paths: Vec<PathBuf>) -> Self {
        LibraryIndex { lib_paths }
    }

    /// Build an index from the `R_LIBS_USER` and `R_LIBS` environment
    /// variables, in that order.
    pub fn from_env() -> Self {
        let mut lib_paths = Vec::new();
        for var in ["R_LIBS_USER", "R_LIBS"] {
            if let Ok(value) = std::env::var(var) {
                for entry in std::env::split_paths(&value) {
                    if !entry.as_os_str().is_empty() {
                        lib_paths.push(entry);
                    }
                }
            }
        }
        LibraryIndex { lib_paths }
    }

    pub fn lib_paths(&self) -> &[PathBuf] {
        &self.lib_paths
    }

    /// Locate a package's installed directory across the search paths.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        self.lib_paths
            .iter()
            .map(|lib| lib.join(name))
            .find(|dir| dir.join(MANIFEST_NAME).is_file())
    }

    fn description(&self, name: &str) -> Option<Description> {
        self.find(name)
            .map(|dir| Description::load_or_empty(&dir.join(MANIFEST_NAME)))
    }
}

impl PackageIndex for LibraryIndex {
    fn lookup(&self, name: &str, fields: &[DepField]) -> Vec<String> {
        let Some(desc) = self.description(name) else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for field in fields {
            for dep in desc.dep_field(*field) {
                if seen.insert(dep.clone()) {
                    out.push(dep);
                }
            }
        }
        out
    }

    fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }
}

/// An in-memory package index.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    packages: HashMap<String, HashMap<DepField, Vec<String>>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package's declared dependencies for one field.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        field: DepField,
        deps: impl IntoIterator<Item = impl Into<String>>,
    ) {
        self.packages
            .entry(name.into())
            .or_default()
            .entry(field)
            .or_default()
            .extend(deps.into_iter().map(Into::into));
    }

    /// Register a package with no declared dependencies.
    pub fn insert_leaf(&mut self, name: impl Into<String>) {
        self.packages.entry(name.into()).or_default();
    }
}

impl PackageIndex for MemoryIndex {
    fn lookup(&self, name: &str, fields: &[DepField]) -> Vec<String> {
        let Some(pkg) = self.packages.get(name) else {
            return Vec::new();
        };
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for field in fields {
            for dep in pkg.get(field).into_iter().flatten() {
                if seen.insert(dep.clone()) {
                    out.push(dep.clone());
                }
            }
        }
        out
    }

    fn exists(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }
}

/// Write a package's DESCRIPTION into a library directory layout.
///
/// Test helper shared by resolver and ops tests.
#[cfg(test)]
pub fn install_fixture(lib: &Path, name: &str, imports: &[&str]) {
    let dir = lib.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let mut content = format!("Package: {name}\nVersion: 1.0.0\n");
    if !imports.is_empty() {
        content.push_str(&format!("Imports: {}\n", imports.join(", ")));
    }
    std::fs::write(dir.join(MANIFEST_NAME), content).unwrap();
}
