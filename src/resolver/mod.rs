//! Transitive closure resolution over the package metadata index.

pub mod closure;

pub use closure::expand_closure;
