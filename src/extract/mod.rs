//! Source classification and dependency extraction.
//!
//! Given a project root, enumerate candidate source artifacts and reduce
//! each to a set of directly used package names. Files are routed to a
//! format-specific extractor by extension; the directory scan only ever
//! enumerates recognized extensions, so the unsupported-format error is
//! reachable only through explicit single-file calls.
//!
//! Per-file problems (parse failures, tangle failures) are recoverable:
//! the file contributes an empty set plus a warning, and the scan goes on.

pub mod literate;
pub mod weave;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Result;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::analysis::code_dependencies;
use crate::core::project::PRIVATE_DIR;
use crate::util::diagnostic::{suggestions, Diagnostic, UnsupportedFormatError};
use crate::util::fs::read_to_string;

pub use literate::{ChunkTangler, Tangler};

/// Recognized source formats, keyed by file extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// `.R` - a plain script
    Script,
    /// `.Rmd` - R Markdown, narrative text with fenced code chunks
    Markdown,
    /// `.Rnw` - Sweave, narrative text with `<<>>=` chunks
    Weave,
    /// `.Rpres` - R Presentations, handled exactly like R Markdown
    Slides,
}

impl SourceFormat {
    /// Classify a path by extension, or `None` if unrecognized.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "r" => Some(SourceFormat::Script),
            "rmd" => Some(SourceFormat::Markdown),
            "rnw" => Some(SourceFormat::Weave),
            "rpres" => Some(SourceFormat::Slides),
            _ => None,
        }
    }
}

/// The outcome of extracting one file or one whole scan: the packages
/// found plus any recoverable warnings raised along the way.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub packages: BTreeSet<String>,
    pub warnings: Vec<Diagnostic>,
}

impl Extraction {
    /// Record a recoverable problem. The caller renders collected warnings
    /// to the user; the log line here is trace-level context only.
    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{}", diagnostic.message);
        self.warnings.push(diagnostic);
    }

    /// Union another extraction into this one.
    pub fn merge(&mut self, other: Extraction) {
        self.packages.extend(other.packages);
        self.warnings.extend(other.warnings);
    }
}

/// Extract the direct dependencies of a single source file.
///
/// An unrecognized extension is a hard failure here; the directory-scan
/// path filters those out before ever calling this.
pub fn file_dependencies(path: &Path, tangler: Option<&dyn Tangler>) -> Result<Extraction> {
    match SourceFormat::from_path(path) {
        None => Err(UnsupportedFormatError {
            path: path.to_path_buf(),
        }
        .into()),
        Some(SourceFormat::Script) => Ok(script_dependencies(path)),
        Some(SourceFormat::Markdown) | Some(SourceFormat::Slides) => {
            literate::markdown_dependencies(path, tangler)
        }
        Some(SourceFormat::Weave) => weave::weave_dependencies(path, tangler),
    }
}

/// Parse a plain script and collect its dependencies. A parse failure is
/// recoverable: the file contributes nothing, with a warning.
fn script_dependencies(path: &Path) -> Extraction {
    let mut extraction = Extraction::default();

    let content = match read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            extraction.warn(
                Diagnostic::warning(format!("could not read {}", path.display()))
                    .with_context(e.to_string())
                    .with_location(path),
            );
            return extraction;
        }
    };

    match code_dependencies(&content) {
        Ok(packages) => extraction.packages = packages,
        Err(e) => {
            extraction.warn(
                Diagnostic::warning(format!(
                    "dependencies in {} could not be determined",
                    path.display()
                ))
                .with_context(e.to_string())
                .with_suggestion(suggestions::UNPARSABLE_SOURCE)
                .with_location(path),
            );
        }
    }

    extraction
}

/// Enumerate every recognized source artifact under a project root, in a
/// fixed sorted order. Drydock's own private-state directory and hidden
/// directories are excluded.
pub fn project_source_files(root: &Path) -> Vec<PathBuf> {
    let private = root.join(PRIVATE_DIR);

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            !hidden && entry.path() != private
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| SourceFormat::from_path(path).is_some())
        .collect();

    // Sorted so results never depend on filesystem enumeration order
    files.sort();
    files
}

/// Scan a whole project tree and union every artifact's dependencies.
///
/// Per-file extraction is pure, so the fan-out runs in parallel; results
/// are merged in the sorted file order, keeping output deterministic.
pub fn scan_dependencies(root: &Path, tangler: Option<&dyn Tangler>) -> Extraction {
    let files = project_source_files(root);

    let per_file: Vec<Extraction> = files
        .par_iter()
        .map(|path| {
            file_dependencies(path, tangler).unwrap_or_else(|e| {
                let mut extraction = Extraction::default();
                extraction.warn(
                    Diagnostic::warning(format!("skipping {}", path.display()))
                        .with_context(e.to_string())
                        .with_location(path),
                );
                extraction
            })
        })
        .collect();

    let mut result = Extraction::default();
    for extraction in per_file {
        result.merge(extraction);
    }
    result
}
