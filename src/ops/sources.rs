//! Per-file dependency listing.
//!
//! A diagnostic view of the scan: which artifacts the classifier found and
//! what each one contributes directly, before any closure expansion.

use std::path::PathBuf;

use crate::core::project::Project;
use crate::extract::{file_dependencies, project_source_files, Tangler};
use crate::util::diagnostic::Diagnostic;
use crate::util::fs::relative_path;

/// Direct dependencies of one source artifact.
#[derive(Debug, Clone)]
pub struct SourceReport {
    /// Path relative to the project root.
    pub path: PathBuf,
    /// The file's direct dependencies, sorted.
    pub packages: Vec<String>,
    /// Recoverable problems raised while extracting this file.
    pub warnings: Vec<Diagnostic>,
}

/// List every source artifact with its direct dependency set.
pub fn list_sources(project: &Project, tangler: Option<&dyn Tangler>) -> Vec<SourceReport> {
    project_source_files(project.root())
        .into_iter()
        .map(|path| {
            let relative = relative_path(project.root(), &path);
            // Scan-enumerated files always have a recognized format
            match file_dependencies(&path, tangler) {
                Ok(extraction) => SourceReport {
                    path: relative,
                    packages: extraction.packages.into_iter().collect(),
                    warnings: extraction.warnings,
                },
                Err(e) => SourceReport {
                    path: relative,
                    packages: Vec::new(),
                    warnings: vec![Diagnostic::warning(format!("skipping {}", path.display()))
                        .with_context(e.to_string())
                        .with_location(&path)],
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_list_sources_reports_per_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("R")).unwrap();
        std::fs::write(tmp.path().join("R/model.R"), "library(glmnet)").unwrap();
        std::fs::write(tmp.path().join("plot.R"), "ggplot2::ggplot(d)").unwrap();

        let project = Project::new(tmp.path());
        let reports = list_sources(&project, None);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].path, PathBuf::from("R/model.R"));
        assert_eq!(reports[0].packages, vec!["glmnet"]);
        assert_eq!(reports[1].path, PathBuf::from("plot.R"));
        assert_eq!(reports[1].packages, vec!["ggplot2"]);
    }
}
