//! User-friendly diagnostic messages.
//!
//! Discovery never aborts a whole scan because of one bad file: per-file
//! problems become warnings collected alongside the result, and only the
//! configuration-level failures below are hard errors.

use std::fmt;
use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when a source file fails to parse.
    pub const UNPARSABLE_SOURCE: &str =
        "help: Fix the syntax error or add the file's packages to drydock/config.toml";

    /// Suggestion when no literate tangler is available.
    pub const NO_TANGLER: &str =
        "help: Install a literate rendering engine so code chunks can be analyzed";

    /// Suggestion when a manifest is required but missing.
    pub const NO_MANIFEST: &str = "help: Add a DESCRIPTION file at the project root";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
            Severity::Help => write!(f, "help"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
                Severity::Note => "\x1b[1;36mnote\x1b[0m",
                Severity::Help => "\x1b[1;32mhelp\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
                Severity::Note => "note",
                Severity::Help => "help",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            for suggestion in &self.suggestions {
                output.push_str(&format!("  {}\n", suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// A single-file extraction was requested for a file whose extension is not
/// a recognized R source format.
///
/// The directory-scan path only enumerates recognized extensions, so this
/// can only be reached through an explicit per-file call.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("unsupported source format: {path}")]
#[diagnostic(
    code(drydock::extract::unsupported_format),
    help("Recognized extensions are .R, .Rmd, .Rnw and .Rpres (case-insensitive)")
)]
pub struct UnsupportedFormatError {
    pub path: PathBuf,
}

/// A DESCRIPTION manifest was explicitly required by the caller but does
/// not exist at the expected location.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("missing DESCRIPTION manifest: {path}")]
#[diagnostic(code(drydock::core::missing_manifest), help("{}", suggestions::NO_MANIFEST))]
pub struct MissingManifestError {
    pub path: PathBuf,
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
