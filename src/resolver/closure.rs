//! Closure expansion of a direct dependency set.
//!
//! A breadth-first traversal over the graph whose edges run from a package
//! to each name in its dependency-bearing fields. Visitation order does
//! not affect the final set, and the visited-set membership check makes
//! cyclic dependency graphs terminate.

use std::collections::{BTreeSet, HashSet, VecDeque};

use crate::core::description::DepField;
use crate::core::index::PackageIndex;

/// Expand a direct dependency set into its full transitive closure.
///
/// Ignored names are excluded from the seed and never added during
/// expansion; everything else a package declares in `fields` is pulled in.
/// A package the index cannot find is a leaf, not an error - reporting it
/// missing belongs to the installation layer.
pub fn expand_closure(
    direct: &BTreeSet<String>,
    index: &dyn PackageIndex,
    fields: &[DepField],
    ignored: &HashSet<String>,
) -> BTreeSet<String> {
    let mut visited: BTreeSet<String> = direct
        .iter()
        .filter(|name| !ignored.contains(*name))
        .cloned()
        .collect();
    let mut queue: VecDeque<String> = visited.iter().cloned().collect();

    while let Some(package) = queue.pop_front() {
        for dep in index.lookup(&package, fields) {
            if ignored.contains(&dep) {
                continue;
            }
            if visited.insert(dep.clone()) {
                queue.push_back(dep);
            }
        }
    }

    visited
}
