//! Project roots and their classification.
//!
//! A project is library-type if it carries a DESCRIPTION manifest whose
//! `Type` field is absent or `Package`; everything else (no manifest, or an
//! explicit non-package type such as `Type: Shiny`) is application-type.
//! The classification decides where the direct dependency set comes from:
//! the manifest's declared fields, or a full source scan.

use std::path::{Path, PathBuf};

use crate::core::description::Description;

/// Name of the manifest file at a project root.
pub const MANIFEST_NAME: &str = "DESCRIPTION";

/// Drydock's private-state subdirectory, excluded from source scanning.
pub const PRIVATE_DIR: &str = "drydock";

/// How a project's direct dependencies are gathered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectKind {
    /// An R package: direct dependencies come from the manifest.
    Library,
    /// An application or analysis directory: direct dependencies come from
    /// scanning every source artifact.
    Application,
}

/// A project root directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Project { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the project's DESCRIPTION manifest (which may not exist).
    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_NAME)
    }

    /// Read the manifest if present, empty-on-absence.
    pub fn description(&self) -> Description {
        Description::load_or_empty(&self.manifest_path())
    }

    /// Classify this project. Computed per discovery run; not persisted.
    pub fn kind(&self) -> ProjectKind {
        if !self.manifest_path().is_file() {
            return ProjectKind::Application;
        }
        match self.description().project_type() {
            None | Some("Package") => ProjectKind::Library,
            Some(_) => ProjectKind::Application,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_manifest_is_application() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(Project::new(tmp.path()).kind(), ProjectKind::Application);
    }

    #[test]
    fn test_manifest_without_type_is_library() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("DESCRIPTION"), "Package: mypkg\n").unwrap();
        assert_eq!(Project::new(tmp.path()).kind(), ProjectKind::Library);
    }

    #[test]
    fn test_package_type_is_library() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("DESCRIPTION"),
            "Package: mypkg\nType: Package\n",
        )
        .unwrap();
        assert_eq!(Project::new(tmp.path()).kind(), ProjectKind::Library);
    }

    #[test]
    fn test_shiny_type_is_application() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("DESCRIPTION"), "Type: Shiny\n").unwrap();
        assert_eq!(Project::new(tmp.path()).kind(), ProjectKind::Application);
    }
}
