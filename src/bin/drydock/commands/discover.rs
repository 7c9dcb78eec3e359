//! `drydock discover` command

use anyhow::Result;

use crate::cli::{DiscoverArgs, OutputFormat};
use drydock::core::index::LibraryIndex;
use drydock::core::project::{Project, ProjectKind};
use drydock::extract::ChunkTangler;
use drydock::ops::{discover, DiscoverOptions};
use drydock::util::config::Config;
use drydock::util::diagnostic;

pub fn execute(args: DiscoverArgs, color: bool) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    let project = Project::new(&root);

    let config = Config::load_layered(&root);
    let mut ignored = config.ignored_packages();
    ignored.extend(args.ignore);

    let index = if args.lib_path.is_empty() {
        LibraryIndex::from_env()
    } else {
        LibraryIndex::new(args.lib_path)
    };

    let opts = DiscoverOptions {
        closure: !args.no_closure,
        implicit_runtime: config.discovery.implicit_runtime && !args.no_implicit,
        implicit_frameworks: config.discovery.implicit_frameworks && !args.no_implicit,
        ..Default::default()
    };

    let tangler = ChunkTangler;
    let report = discover(&project, &index, &ignored, Some(&tangler), &opts)?;

    for warning in &report.warnings {
        diagnostic::emit(warning, color);
    }

    match args.format {
        OutputFormat::Text => {
            for package in &report.packages {
                println!("{}", package);
            }
        }
        OutputFormat::Json => {
            let kind = report.kind.map(|k| match k {
                ProjectKind::Library => "library",
                ProjectKind::Application => "application",
            });
            let output = serde_json::json!({
                "kind": kind,
                "packages": report.packages,
                "warnings": report.warnings.iter().map(|w| w.message.clone()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
