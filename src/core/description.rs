//! DESCRIPTION manifest parsing.
//!
//! R packages and some application projects declare metadata in a
//! `DESCRIPTION` file using the DCF (Debian Control File) format:
//! `Field: value` records where continuation lines are indented.
//!
//! Parsing is deliberately forgiving. A malformed manifest yields an empty
//! structure rather than an error; only an explicitly required manifest that
//! is missing altogether is a hard failure (see [`Description::load`]).

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;

use crate::util::diagnostic::MissingManifestError;

/// A dependency-bearing (or adjacent) field of a DESCRIPTION manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepField {
    Depends,
    Imports,
    LinkingTo,
    Suggests,
    Enhances,
}

impl DepField {
    /// The field name as it appears in a DESCRIPTION file.
    pub fn as_str(&self) -> &'static str {
        match self {
            DepField::Depends => "Depends",
            DepField::Imports => "Imports",
            DepField::LinkingTo => "LinkingTo",
            DepField::Suggests => "Suggests",
            DepField::Enhances => "Enhances",
        }
    }

    /// The fields that carry hard requirements: needed at build, load, or
    /// link time. `Suggests`/`Enhances` are optional extras and excluded.
    pub fn required() -> &'static [DepField] {
        &[DepField::Depends, DepField::Imports, DepField::LinkingTo]
    }
}

/// A parsed DESCRIPTION manifest.
#[derive(Debug, Clone, Default)]
pub struct Description {
    /// All fields, keyed by field name. Values have continuation lines
    /// joined with single spaces.
    fields: HashMap<String, String>,
}

impl Description {
    /// Load a manifest from a file path.
    ///
    /// A missing file is a hard failure; use [`Description::load_or_empty`]
    /// where absence is acceptable. Malformed content never fails.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| MissingManifestError {
            path: path.to_path_buf(),
        })?;
        Ok(Self::parse(&content))
    }

    /// Load a manifest, returning an empty structure if the file is absent
    /// or unreadable.
    pub fn load_or_empty(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse DCF content. Lines that fit no record shape are skipped.
    pub fn parse(content: &str) -> Self {
        let mut fields: HashMap<String, String> = HashMap::new();
        let mut current: Option<String> = None;

        for line in content.lines() {
            if line.starts_with(' ') || line.starts_with('\t') {
                // Continuation of the previous field
                if let Some(ref key) = current {
                    let entry = fields.entry(key.clone()).or_default();
                    if !entry.is_empty() {
                        entry.push(' ');
                    }
                    entry.push_str(line.trim());
                }
                continue;
            }

            match line.split_once(':') {
                Some((key, value)) if !key.trim().is_empty() => {
                    let key = key.trim().to_string();
                    fields.insert(key.clone(), value.trim().to_string());
                    current = Some(key);
                }
                _ => current = None,
            }
        }

        Description { fields }
    }

    /// True if no fields were parsed.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get a raw field value.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str())
    }

    /// The declared package name, if any.
    pub fn package(&self) -> Option<&str> {
        self.field("Package")
    }

    /// The declared project `Type`, if any.
    pub fn project_type(&self) -> Option<&str> {
        self.field("Type")
    }

    /// Package names declared in one dependency field.
    ///
    /// Entries are comma separated; version constraints in parentheses are
    /// stripped. The pseudo-package `R` is never a dependency.
    pub fn dep_field(&self, field: DepField) -> Vec<String> {
        let Some(value) = self.field(field.as_str()) else {
            return Vec::new();
        };
        parse_dep_entries(value)
    }

    /// The union of the required dependency fields (Depends, Imports,
    /// LinkingTo), in declaration order, deduplicated.
    pub fn required_packages(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for field in DepField::required() {
            for name in self.dep_field(*field) {
                if seen.insert(name.clone()) {
                    out.push(name);
                }
            }
        }
        out
    }
}

/// Split a dependency field value into bare package names.
fn parse_dep_entries(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| {
            // Drop the version constraint: "dplyr (>= 1.0.0)" -> "dplyr"
            let name = match entry.find('(') {
                Some(idx) => &entry[..idx],
                None => entry,
            };
            name.trim().to_string()
        })
        .filter(|name| !name.is_empty() && name != "R")
        .collect()
}
