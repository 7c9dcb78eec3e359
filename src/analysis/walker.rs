//! Call-pattern matching over R expression trees.
//!
//! A pre-order walk over every node collects the package names implied by
//! recognized call shapes: namespace accessors (`pkg::fn`), formal-class
//! machinery (`setClass` and friends imply `methods`), and package-loader
//! calls (`library`, `require`, ...). Loader arguments are bound against
//! the loader's formal parameter list with R's matching rules (exact name,
//! then unique partial name, then position), so `library(quietly = TRUE,
//! package = dplyr)` resolves correctly.
//!
//! Dynamic names are never guessed: `library(pkg, character.only = TRUE)`
//! with a variable `pkg` contributes nothing. That trade-off is deliberate;
//! a runtime-computed dependency cannot be discovered statically without
//! risking false positives.

use std::collections::{BTreeSet, HashMap};

use crate::analysis::ast::{Arg, Expr};
use crate::analysis::parser::{parse_program, ParseError};

/// Calls that declare S4 classes, generics or methods; any of them pulls
/// in the `methods` package.
const METHODS_CALLS: &[&str] = &[
    "setClass",
    "setGeneric",
    "setMethod",
    "setRefClass",
    "setValidity",
    "representation",
];

struct Loader {
    name: &'static str,
    formals: &'static [&'static str],
}

const LOADERS: &[Loader] = &[
    Loader {
        name: "library",
        formals: &[
            "package",
            "help",
            "pos",
            "lib.loc",
            "character.only",
            "logical.return",
            "warn.conflicts",
            "quietly",
            "verbose",
            "mask.ok",
            "exclude",
            "include.only",
            "attach.required",
        ],
    },
    Loader {
        name: "require",
        formals: &[
            "package",
            "lib.loc",
            "quietly",
            "warn.conflicts",
            "character.only",
            "mask.ok",
            "exclude",
            "include.only",
            "attach.required",
        ],
    },
    Loader {
        name: "requireNamespace",
        formals: &["package", "...", "quietly"],
    },
    Loader {
        name: "loadNamespace",
        formals: &["package", "lib.loc", "keep.source", "partial", "versionCheck"],
    },
];

/// Parse a source fragment and collect every package dependency in it.
pub fn code_dependencies(source: &str) -> Result<BTreeSet<String>, ParseError> {
    let exprs = parse_program(source)?;
    let mut deps = BTreeSet::new();
    for expr in &exprs {
        walk(expr, &mut deps);
    }
    Ok(deps)
}

/// Collect the package dependencies of one expression tree.
pub fn expression_dependencies(expr: &Expr) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    walk(expr, &mut deps);
    deps
}

fn walk(expr: &Expr, deps: &mut BTreeSet<String>) {
    // Non-call leaves are visited but contribute nothing
    let Expr::Call(call) = expr else { return };

    if let Some(func) = call.func.literal_name() {
        match func {
            "::" | ":::" => {
                if let Some(pkg) = call.args.first().and_then(|a| a.value.literal_name()) {
                    deps.insert(pkg.to_string());
                }
            }
            _ if METHODS_CALLS.contains(&func) => {
                deps.insert("methods".to_string());
            }
            _ => {
                if let Some(loader) = LOADERS.iter().find(|l| l.name == func) {
                    record_loader_call(loader, &call.args, deps);
                }
            }
        }
    }

    // Generic traversal: function position and every argument, in order
    walk(&call.func, deps);
    for arg in &call.args {
        walk(&arg.value, deps);
    }
}

fn record_loader_call(loader: &Loader, args: &[Arg], deps: &mut BTreeSet<String>) {
    let bound = match_formals(loader.formals, args);
    let Some(package) = bound.get("package") else {
        return;
    };

    let character_only = bound
        .get("character.only")
        .is_some_and(|v| is_true_literal(v));

    match package {
        Expr::Str(name) => {
            deps.insert(name.clone());
        }
        // A bare identifier under character.only refers to a variable, not
        // a literal package name; skip it rather than guess.
        Expr::Symbol(name) if !character_only => {
            deps.insert(name.clone());
        }
        _ => {}
    }
}

fn is_true_literal(expr: &Expr) -> bool {
    matches!(expr.as_symbol(), Some("TRUE") | Some("T"))
}

/// Bind call arguments to a formal parameter list with R's matching rules:
/// exact names first, then unique partial names, then positions. Positional
/// matching stops at `...`, as in R.
fn match_formals<'a>(
    formals: &'static [&'static str],
    args: &'a [Arg],
) -> HashMap<&'static str, &'a Expr> {
    let mut bound: HashMap<&'static str, &'a Expr> = HashMap::new();
    let mut used = vec![false; args.len()];

    // 1. Exact name matches
    for (i, arg) in args.iter().enumerate() {
        if let Some(name) = &arg.name {
            if let Some(formal) = formals.iter().find(|f| **f == name.as_str()) {
                if !bound.contains_key(formal) {
                    bound.insert(formal, &arg.value);
                    used[i] = true;
                }
            }
        }
    }

    let dots = formals
        .iter()
        .position(|f| *f == "...")
        .unwrap_or(formals.len());

    // 2. Unique partial matches against formals before `...`
    for (i, arg) in args.iter().enumerate() {
        if used[i] {
            continue;
        }
        if let Some(name) = &arg.name {
            let candidates: Vec<&'static str> = formals[..dots]
                .iter()
                .filter(|f| !bound.contains_key(**f) && f.starts_with(name.as_str()))
                .copied()
                .collect();
            if let [formal] = candidates[..] {
                bound.insert(formal, &arg.value);
                used[i] = true;
            }
        }
    }

    // 3. Positional fill of the remaining formals before `...`
    let remaining: Vec<&'static str> = formals[..dots]
        .iter()
        .filter(|f| !bound.contains_key(**f))
        .copied()
        .collect();
    let mut next = 0;
    for (i, arg) in args.iter().enumerate() {
        if used[i] || arg.name.is_some() {
            continue;
        }
        if next >= remaining.len() {
            break;
        }
        bound.insert(remaining[next], &arg.value);
        next += 1;
    }

    bound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(source: &str) -> Vec<String> {
        code_dependencies(source).unwrap().into_iter().collect()
    }

    #[test]
    fn test_namespace_accessors() {
        assert_eq!(deps("dplyr::filter(x)"), vec!["dplyr"]);
        assert_eq!(deps("stats:::rnorm(10)"), vec!["stats"]);
    }

    #[test]
    fn test_library_with_symbol_and_string() {
        assert_eq!(deps("library(dplyr)"), vec!["dplyr"]);
        assert_eq!(deps("library(\"dplyr\")"), vec!["dplyr"]);
        assert_eq!(deps("require(purrr)"), vec!["purrr"]);
        assert_eq!(deps("requireNamespace(\"jsonlite\")"), vec!["jsonlite"]);
        assert_eq!(deps("loadNamespace(\"tools\")"), vec!["tools"]);
    }

    #[test]
    fn test_character_only_with_variable_is_skipped() {
        assert!(deps("library(pkg, character.only = TRUE)").is_empty());
        // Partial name matching reaches character.only too
        assert!(deps("library(pkg, char = TRUE)").is_empty());
        // A literal string stays resolvable under character.only
        assert_eq!(
            deps("library(\"dplyr\", character.only = TRUE)"),
            vec!["dplyr"]
        );
    }

    #[test]
    fn test_named_package_argument_out_of_order() {
        assert_eq!(
            deps("library(quietly = TRUE, package = dplyr)"),
            vec!["dplyr"]
        );
    }

    #[test]
    fn test_dynamic_names_contribute_nothing() {
        assert!(deps("library(paste0(\"dp\", \"lyr\"))").is_empty());
        assert!(deps("lib <- \"dplyr\"\nlibrary(lib, character.only = TRUE)").is_empty());
    }

    #[test]
    fn test_nested_calls_are_walked() {
        assert_eq!(deps("foo(bar::baz())"), vec!["bar"]);
        assert_eq!(deps("f(g(h(library(deep))))"), vec!["deep"]);
        assert_eq!(deps("x <- function() tidyr::pivot_longer(d)"), vec!["tidyr"]);
    }

    #[test]
    fn test_methods_machinery() {
        assert_eq!(deps("setClass(\"Point\", representation(x = \"numeric\"))"),
            vec!["methods"]);
        assert_eq!(deps("setGeneric(\"area\", function(shape) standardGeneric(\"area\"))"),
            vec!["methods"]);
    }

    #[test]
    fn test_quoted_loader_name() {
        assert_eq!(deps("\"library\"(dplyr)"), vec!["dplyr"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(
            deps("library(dplyr)\ndplyr::mutate(x)\nlibrary(dplyr)"),
            vec!["dplyr"]
        );
    }

    #[test]
    fn test_loader_inside_control_flow() {
        assert_eq!(
            deps("if (interactive()) {\n  library(devtools)\n}"),
            vec!["devtools"]
        );
    }

    #[test]
    fn test_requirenamespace_extra_args_flow_to_dots() {
        // The TRUE is positional but lands in `...`, not in `quietly`
        assert_eq!(deps("requireNamespace(\"curl\", TRUE)"), vec!["curl"]);
    }

    #[test]
    fn test_result_is_sorted() {
        assert_eq!(
            deps("library(zoo)\nlibrary(arrow)\nbase::print(1)"),
            vec!["arrow", "base", "zoo"]
        );
    }
}
