//! High-level operations.
//!
//! This module contains the implementation of Drydock commands.

pub mod discover;
pub mod sources;

pub use discover::{discover, DiscoverOptions, DiscoveryReport};
pub use sources::{list_sources, SourceReport};
