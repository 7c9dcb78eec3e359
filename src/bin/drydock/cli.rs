//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Drydock - static dependency discovery for R projects
#[derive(Parser)]
#[command(name = "drydock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Discover the packages a project depends on
    Discover(DiscoverArgs),

    /// List each source file with its direct dependencies
    Sources(SourcesArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct DiscoverArgs {
    /// Project root (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Report only directly used packages, without transitive expansion
    #[arg(long)]
    pub no_closure: bool,

    /// Skip implicit packages (runtime support, framework probes)
    #[arg(long)]
    pub no_implicit: bool,

    /// Exclude a package from the result (repeatable)
    #[arg(long, value_name = "PACKAGE")]
    pub ignore: Vec<String>,

    /// Installed library directory to resolve metadata from (repeatable;
    /// defaults to R_LIBS_USER and R_LIBS)
    #[arg(long, value_name = "DIR")]
    pub lib_path: Vec<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One package name per line
    Text,
    /// A JSON report
    Json,
}

#[derive(Args)]
pub struct SourcesArgs {
    /// Project root (defaults to the current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
