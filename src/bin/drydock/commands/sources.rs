//! `drydock sources` command

use anyhow::Result;

use crate::cli::SourcesArgs;
use drydock::core::project::Project;
use drydock::extract::ChunkTangler;
use drydock::ops::list_sources;
use drydock::util::diagnostic;

pub fn execute(args: SourcesArgs, color: bool) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let project = Project::new(&root);

    let tangler = ChunkTangler;
    let reports = list_sources(&project, Some(&tangler));

    if reports.is_empty() {
        println!("no source files found in {}", root.display());
        return Ok(());
    }

    for report in &reports {
        for warning in &report.warnings {
            diagnostic::emit(warning, color);
        }
        if report.packages.is_empty() {
            println!("{}: (none)", report.path.display());
        } else {
            println!("{}: {}", report.path.display(), report.packages.join(", "));
        }
    }

    Ok(())
}
