//! Sweave (`.Rnw`) extraction.
//!
//! Sweave documents escape code differently from R Markdown: chunks open
//! with `<<options>>=` and close with a line starting `@`, and inline
//! expressions use `\Sexpr{...}`. The format-specific path runs first; if
//! the document carries no recognizable Sweave code at all (some `.Rnw`
//! files are authored with markdown-style chunks), extraction falls back
//! to the markdown handler on the same file.

use std::path::Path;

use anyhow::Result;
use regex::Regex;

use crate::analysis::code_dependencies;
use crate::extract::literate::{markdown_dependencies, Tangler};
use crate::extract::Extraction;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::read_to_string;

/// Extract dependencies from a Sweave document.
pub fn weave_dependencies(path: &Path, tangler: Option<&dyn Tangler>) -> Result<Extraction> {
    let content = read_to_string(path)?;

    let code = match extract_weave_code(&content) {
        Ok(code) => code,
        Err(reason) => {
            tracing::debug!(
                "weave extraction failed for {} ({reason}); falling back to markdown handling",
                path.display()
            );
            return markdown_dependencies(path, tangler);
        }
    };

    let mut extraction = Extraction::default();
    match code_dependencies(&code) {
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
    Ok(extraction)
}

/// Pull the executable code out of a Sweave document.
///
/// Fails (triggering the markdown fallback) when the document contains no
/// chunk delimiters and no `\Sexpr`, or when a chunk never closes.
fn extract_weave_code(content: &str) -> Result<String, String> {
    let open = Regex::new(r"^<<.*>>=\s*$").unwrap();
    let close = Regex::new(r"^@").unwrap();
    let inline = Regex::new(r"\\Sexpr\{([^}]*)\}").unwrap();

    let mut code = String::new();
    let mut found_any = false;
    let mut in_chunk = false;

    for line in content.lines() {
        if in_chunk {
            if close.is_match(line) {
                in_chunk = false;
            } else {
                code.push_str(line);
                code.push('\n');
            }
        } else if open.is_match(line) {
            in_chunk = true;
            found_any = true;
        } else {
            for cap in inline.captures_iter(line) {
                code.push_str(cap[1].trim());
                code.push('\n');
                found_any = true;
            }
        }
    }

    if in_chunk {
        return Err("unterminated code chunk".into());
    }
    if !found_any {
        return Err("no Sweave chunks found".into());
    }
    Ok(code)
}
