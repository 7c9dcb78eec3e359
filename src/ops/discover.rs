//! Project dependency discovery.
//!
//! The top-level operation: classify the project, gather its direct
//! dependency set (manifest fields for a library, full source scan for an
//! application), expand it transitively against the package index, then
//! apply the implicit-dependency policy. The result is deduplicated and
//! ordinally sorted, so an unchanged project always discovers the same
//! list in the same order.

use std::collections::{BTreeSet, HashSet};

use anyhow::Result;
use regex::Regex;

use crate::core::description::DepField;
use crate::core::index::PackageIndex;
use crate::core::project::{Project, ProjectKind};
use crate::extract::{scan_dependencies, Tangler};
use crate::resolver::expand_closure;
use crate::util::diagnostic::Diagnostic;

/// The R-side runtime support package added to every environment.
const RUNTIME_PACKAGE: &str = "drydock";

/// The web framework detected by the implicit probes.
const FRAMEWORK_PACKAGE: &str = "shiny";

/// Options controlling a discovery run.
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    /// Expand the direct set transitively against the index.
    pub closure: bool,
    /// Add the drydock runtime support package to the result.
    pub implicit_runtime: bool,
    /// Probe for a shiny application that never calls a loader.
    pub implicit_frameworks: bool,
    /// Manifest fields considered dependency-bearing.
    pub fields: Vec<DepField>,
}

impl Default for DiscoverOptions {
    fn default() -> Self {
        DiscoverOptions {
            closure: true,
            implicit_runtime: true,
            implicit_frameworks: true,
            fields: DepField::required().to_vec(),
        }
    }
}

/// The outcome of a discovery run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Deduplicated package names in C-locale sort order.
    pub packages: Vec<String>,
    /// Recoverable problems encountered along the way.
    pub warnings: Vec<Diagnostic>,
    /// How the project was classified for this run.
    pub kind: Option<ProjectKind>,
}

/// Discover the full set of packages a project requires.
pub fn discover(
    project: &Project,
    index: &dyn PackageIndex,
    ignored: &HashSet<String>,
    tangler: Option<&dyn Tangler>,
    opts: &DiscoverOptions,
) -> Result<DiscoveryReport> {
    let kind = project.kind();
    tracing::debug!("classified {} as {:?}", project.root().display(), kind);

    let mut warnings = Vec::new();
    let direct: BTreeSet<String> = match kind {
        ProjectKind::Library => {
            // A package's own manifest fields are its direct set by
            // definition; the classification already proved the manifest
            // exists, so a read failure here is a hard error.
            let description = crate::core::description::Description::load(&project.manifest_path())?;
            description.required_packages().into_iter().collect()
        }
        ProjectKind::Application => {
            let extraction = scan_dependencies(project.root(), tangler);
            warnings.extend(extraction.warnings);
            extraction.packages
        }
    };

    let direct: BTreeSet<String> = direct
        .into_iter()
        .filter(|name| !ignored.contains(name))
        .collect();

    let mut packages = if opts.closure {
        expand_closure(&direct, index, &opts.fields, ignored)
    } else {
        direct
    };

    if opts.implicit_runtime && !ignored.contains(RUNTIME_PACKAGE) {
        packages.insert(RUNTIME_PACKAGE.to_string());
    }

    if opts.implicit_frameworks
        && !packages.contains(FRAMEWORK_PACKAGE)
        && !ignored.contains(FRAMEWORK_PACKAGE)
        && looks_like_framework_app(project)
    {
        packages.insert(FRAMEWORK_PACKAGE.to_string());
    }

    Ok(DiscoveryReport {
        packages: packages.into_iter().collect(),
        warnings,
        kind: Some(kind),
    })
}

/// Probe for implicit evidence of a shiny application: a matching manifest
/// `Type`, a `server.R` with a server-initialization call, or an `app.R`
/// with a single-file-app call. None of these require a loader call.
fn looks_like_framework_app(project: &Project) -> bool {
    if project
        .description()
        .project_type()
        .is_some_and(|t| t.eq_ignore_ascii_case("shiny"))
    {
        return true;
    }

    file_matches(project, "server.R", r"shinyServer\s*\(")
        || file_matches(project, "app.R", r"shinyApp\s*\(")
}

fn file_matches(project: &Project, name: &str, pattern: &str) -> bool {
    let path = project.root().join(name);
    let Ok(content) = std::fs::read_to_string(&path) else {
        return false;
    };
    Regex::new(pattern).unwrap().is_match(&content)
}
