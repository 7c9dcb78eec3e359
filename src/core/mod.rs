//! Core data structures for Drydock.
//!
//! This module contains the foundational types used throughout Drydock:
//! - DESCRIPTION manifests and their dependency fields
//! - Project roots and their library/application classification
//! - The package metadata index consulted during closure resolution

pub mod description;
pub mod index;
pub mod project;

pub use description::{DepField, Description};
pub use index::{LibraryIndex, MemoryIndex, PackageIndex};
pub use project::{Project, ProjectKind, MANIFEST_NAME, PRIVATE_DIR};
