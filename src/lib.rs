//! Drydock - static dependency discovery for reproducible R environments
//!
//! This crate provides the core library functionality for Drydock,
//! including source classification and extraction, R call-pattern analysis,
//! and transitive closure resolution over a package metadata index.

pub mod analysis;
pub mod core;
pub mod extract;
pub mod ops;
pub mod resolver;
pub mod util;

pub use crate::core::{
    description::Description,
    index::{LibraryIndex, MemoryIndex, PackageIndex},
    project::{Project, ProjectKind},
};

pub use ops::discover::{discover, DiscoverOptions, DiscoveryReport};
pub use util::config::Config;
pub use util::diagnostic::Diagnostic;
