//! R Markdown and slide-document extraction.
//!
//! A literate document contributes dependencies from two places: its
//! front-matter header (runtime directives, companion formats, parameter
//! expressions) and its embedded code chunks. The header is handled with
//! pattern searches rather than structured YAML parsing; the code body is
//! tangled to a scratch file and analyzed like a plain script.

use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;

use crate::analysis::{code_dependencies, expression_dependencies, parse_expression};
use crate::extract::Extraction;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::fs::read_to_string;

/// The literate-rendering engine itself; any `.Rmd`/`.Rpres` needs it.
const RENDERER_PACKAGE: &str = "rmarkdown";

/// External capability that reduces a literate document to plain R code.
///
/// Implementations must be pure with respect to the source document and
/// write only to `output`; the caller owns the scratch file's lifetime so
/// cleanup is guaranteed whether or not tangling succeeds.
pub trait Tangler: Sync {
    fn tangle(&self, source: &Path, output: &Path) -> Result<()>;
}

/// Built-in tangler: extracts fenced ```` ```{r} ```` chunks and inline
/// `` `r expr` `` expressions, discarding narrative text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkTangler;

impl Tangler for ChunkTangler {
    fn tangle(&self, source: &Path, output: &Path) -> Result<()> {
        let content = read_to_string(source)?;
        let code = extract_fenced_chunks(&content);
        std::fs::write(output, code)
            .with_context(|| format!("failed to write tangled code: {}", output.display()))
    }
}

fn extract_fenced_chunks(content: &str) -> String {
    let open = Regex::new(r"^\s*```+\s*\{[rR][\s,}].*$").unwrap();
    let close = Regex::new(r"^\s*```+\s*$").unwrap();
    let inline = Regex::new(r"`r[ \t]+([^`]+)`").unwrap();

    let mut code = String::new();
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
        } else {
            // Inline expressions in narrative text still run
            for cap in inline.captures_iter(line) {
                code.push_str(cap[1].trim());
                code.push('\n');
            }
        }
    }

    code
}

/// Extract dependencies from an R Markdown (or `.Rpres`) document.
pub fn markdown_dependencies(path: &Path, tangler: Option<&dyn Tangler>) -> Result<Extraction> {
    let content = read_to_string(path)?;
    let mut extraction = Extraction::default();
    extraction.packages.insert(RENDERER_PACKAGE.to_string());

    let (header, body) = split_document(&content);
    if let Some(header) = header {
        header_dependencies(&header, path, &mut extraction);
    }

    // A header-only document has nothing to tangle
    if body.trim().is_empty() {
        return Ok(extraction);
    }

    let Some(tangler) = tangler else {
        extraction.warn(
            Diagnostic::warning(format!(
                "no literate rendering engine available; analyzing only the metadata of {}",
                path.display()
            ))
            .with_suggestion(suggestions::NO_TANGLER)
            .with_location(path),
        );
        return Ok(extraction);
    };

    tangle_and_analyze(path, tangler, &mut extraction);
    Ok(extraction)
}

/// Tangle the document to a uniquely named scratch file and analyze the
/// result. The scratch file is removed on drop, success or not.
fn tangle_and_analyze(path: &Path, tangler: &dyn Tangler, extraction: &mut Extraction) {
    let scratch = match tempfile::Builder::new()
        .prefix("drydock-tangle-")
        .suffix(".R")
        .tempfile()
    {
        Ok(scratch) => scratch,
        Err(e) => {
            extraction.warn(
                Diagnostic::warning(format!("could not create scratch file for {}", path.display()))
                    .with_context(e.to_string())
                    .with_location(path),
            );
            return;
        }
    };

    if let Err(e) = tangler.tangle(path, scratch.path()) {
        extraction.warn(
            Diagnostic::warning(format!("failed to tangle {}", path.display()))
                .with_context(e.to_string())
                .with_location(path),
        );
        return;
    }

    let code = match read_to_string(scratch.path()) {
        Ok(code) => code,
        Err(e) => {
            extraction.warn(
                Diagnostic::warning(format!(
                    "could not read tangled code for {}",
                    path.display()
                ))
                .with_context(e.to_string())
                .with_location(path),
            );
            return;
        }
    };
    match code_dependencies(&code) {
        Ok(packages) => extraction.packages.extend(packages),
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
}

/// Detect and return the front-matter block's raw text.
///
/// A header exists iff the first line is exactly `---` and a later line is
/// `---` or `...` (trailing whitespace ignored, anchored full-line match).
pub fn front_matter(content: &str) -> Option<String> {
    split_document(content).0
}

/// Split a document into its front-matter header (if any) and the body
/// text after it. An unterminated header is no header at all.
fn split_document(content: &str) -> (Option<String>, String) {
    let delim = Regex::new(r"^---\s*$").unwrap();
    let terminator = Regex::new(r"^(---|\.\.\.)\s*$").unwrap();

    let lines: Vec<&str> = content.lines().collect();
    if lines.first().is_some_and(|first| delim.is_match(first)) {
        if let Some(end) = lines[1..].iter().position(|line| terminator.is_match(line)) {
            let header = lines[1..=end].join("\n");
            let body = lines[end + 2..].join("\n");
            return (Some(header), body);
        }
    }
    (None, content.to_string())
}

fn header_dependencies(header: &str, path: &Path, extraction: &mut Extraction) {
    // Flags are pattern searches, not YAML parsing
    if Regex::new(r"runtime:\s*shiny").unwrap().is_match(header) {
        extraction.packages.insert("shiny".to_string());
    }
    if Regex::new(r"\bflexdashboard\b").unwrap().is_match(header) {
        extraction.packages.insert("flexdashboard".to_string());
    }

    let expressions = param_expressions(header);
    if expressions.is_empty() {
        return;
    }

    // Parameterized reports are knitted through an input UI
    extraction.packages.insert("shiny".to_string());

    for expression in expressions {
        match parse_expression(&expression) {
            Ok(expr) => extraction.packages.extend(expression_dependencies(&expr)),
            Err(e) => {
                extraction.warn(
                    Diagnostic::warning(format!(
                        "could not parse parameter expression `{expression}`"
                    ))
                    .with_context(e.to_string())
                    .with_location(path),
                );
            }
        }
    }
}

/// Collect `!r` parameter expressions from the header's `params:` block.
fn param_expressions(header: &str) -> Vec<String> {
    let expr = Regex::new(r"!r[ \t]+(.+)$").unwrap();

    let mut expressions = Vec::new();
    let mut in_params = false;
    for line in header.lines() {
        let indented = line.starts_with(' ') || line.starts_with('\t');
        if !indented {
            in_params = line.trim_end() == "params:";
            continue;
        }
        if in_params {
            if let Some(cap) = expr.captures(line) {
                expressions.push(cap[1].trim().to_string());
            }
        }
    }
    expressions
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_front_matter_detection() {
        assert_eq!(
            front_matter("---\ntitle: x\n---\nbody\n").as_deref(),
            Some("title: x")
        );
        assert_eq!(
            front_matter("---\ntitle: x\n...\n").as_deref(),
            Some("title: x")
        );
        // First line must be exactly the delimiter
        assert_eq!(front_matter("\n---\ntitle: x\n---\n"), None);
        assert_eq!(front_matter("----\ntitle: x\n---\n"), None);
        // Unterminated header is no header
        assert_eq!(front_matter("---\ntitle: x\n"), None);
        // Trailing whitespace on the delimiter line is fine
        assert!(front_matter("---  \ntitle: x\n--- \n").is_some());
    }

    #[test]
    fn test_renderer_always_contributed() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "doc.Rmd", "plain text only\n");
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(extraction.packages.contains("rmarkdown"));
    }

    #[test]
    fn test_runtime_shiny_flag() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "app.Rmd",
            "---\ntitle: demo\nruntime: shiny\n---\n",
        );
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(extraction.packages.contains("shiny"));
    }

    #[test]
    fn test_flexdashboard_reference() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "dash.Rmd",
            "---\noutput: flexdashboard::flex_dashboard\n---\n",
        );
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(extraction.packages.contains("flexdashboard"));
    }

    #[test]
    fn test_param_expressions_analyzed() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "report.Rmd",
            "---\ntitle: report\nparams:\n  start: !r lubridate::today()\n  broken: !r ((\n---\nbody\n",
        );
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(extraction.packages.contains("shiny"));
        assert!(extraction.packages.contains("lubridate"));
        // The broken parameter warns but doesn't block the good one
        assert_eq!(extraction.warnings.len(), 1);
    }

    #[test]
    fn test_params_without_expressions_add_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "report.Rmd",
            "---\nparams:\n  year: 2024\n---\n",
        );
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(!extraction.packages.contains("shiny"));
    }

    #[test]
    fn test_code_chunks_tangled() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "doc.Rmd",
            "---\ntitle: t\n---\n\nSome text.\n\n```{r setup}\nlibrary(dplyr)\n```\n\nInline `r scales::percent(0.5)` too.\n",
        );
        let extraction = markdown_dependencies(&path, Some(&ChunkTangler)).unwrap();
        assert!(extraction.packages.contains("dplyr"));
        assert!(extraction.packages.contains("scales"));
    }

    #[test]
    fn test_empty_document_skips_tangling() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "empty.Rmd", "  \n\t\n");
        let extraction = markdown_dependencies(&path, None).unwrap();
        let packages: Vec<_> = extraction.packages.iter().cloned().collect();
        assert_eq!(packages, vec!["rmarkdown"]);
        // No tangler needed, so no warning either
        assert!(extraction.warnings.is_empty());
    }

    /// Tangles successfully but leaves no readable output behind.
    struct VanishingTangler;

    impl Tangler for VanishingTangler {
        fn tangle(&self, _source: &Path, output: &Path) -> Result<()> {
            std::fs::remove_file(output)?;
            Ok(())
        }
    }

    #[test]
    fn test_unreadable_tangle_output_warns() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "doc.Rmd", "```{r}\nlibrary(dplyr)\n```\n");
        let extraction = markdown_dependencies(&path, Some(&VanishingTangler)).unwrap();
        assert!(!extraction.packages.contains("dplyr"));
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].message.contains("tangled code"));
    }

    #[test]
    fn test_header_only_document_skips_tangling() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, "meta.Rmd", "---\nruntime: shiny\n---\n");
        let extraction = markdown_dependencies(&path, None).unwrap();
        let packages: Vec<_> = extraction.packages.iter().cloned().collect();
        assert_eq!(packages, vec!["rmarkdown", "shiny"]);
        assert!(extraction.warnings.is_empty());
    }

    #[test]
    fn test_missing_tangler_degrades_with_warning() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            "doc.Rmd",
            "---\nruntime: shiny\n---\n```{r}\nlibrary(dplyr)\n```\n",
        );
        let extraction = markdown_dependencies(&path, None).unwrap();
        assert!(extraction.packages.contains("shiny"));
        assert!(!extraction.packages.contains("dplyr"));
        assert_eq!(extraction.warnings.len(), 1);
    }
}
