//! Static analysis of R source code.
//!
//! This module is a minimal, self-contained R expression parser plus a
//! call-pattern walker. It produces call/argument structure sufficient to
//! recognize the call shapes that signal a package dependency; it is not a
//! full language implementation and never evaluates anything.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod walker;

pub use ast::{Arg, Call, Expr};
pub use parser::{parse_expression, parse_program, ParseError};
pub use walker::{code_dependencies, expression_dependencies};
