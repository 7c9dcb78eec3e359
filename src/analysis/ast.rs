//! R expression trees.
//!
//! The representation mirrors R's own homoiconicity: operators, control
//! flow, braces, indexing and function definitions are all calls whose
//! function position is a symbol (`+`, `if`, `{`, `[`, `function`, ...).
//! The walker then needs exactly one traversal shape.

/// One parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A name: identifier, keyword constant (`TRUE`, `NULL`), or backticked
    Symbol(String),
    /// A string literal
    Str(String),
    /// A numeric literal, kept as its lexeme
    Num(String),
    /// An empty argument slot, as in `x[, 1]`
    Missing,
    /// A call or function application
    Call(Call),
}

/// A call node: function position plus arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Arg>,
}

/// One argument, optionally named.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    pub name: Option<String>,
    pub value: Expr,
}

impl Arg {
    pub fn positional(value: Expr) -> Self {
        Arg { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: Expr) -> Self {
        Arg {
            name: Some(name.into()),
            value,
        }
    }
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn call(func: Expr, args: Vec<Arg>) -> Self {
        Expr::Call(Call {
            func: Box::new(func),
            args,
        })
    }

    /// Build an operator/keyword call with positional operands.
    pub fn call_op(op: &str, operands: Vec<Expr>) -> Self {
        Expr::call(
            Expr::symbol(op),
            operands.into_iter().map(Arg::positional).collect(),
        )
    }

    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Expr::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    /// The text of a bare name or string literal. Calls, numbers and
    /// missing slots have no literal name.
    pub fn literal_name(&self) -> Option<&str> {
        match self {
            Expr::Symbol(name) => Some(name),
            Expr::Str(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_name() {
        assert_eq!(Expr::symbol("dplyr").literal_name(), Some("dplyr"));
        assert_eq!(Expr::string("dplyr").literal_name(), Some("dplyr"));
        assert_eq!(Expr::Num("1".into()).literal_name(), None);
        assert_eq!(Expr::call_op("+", vec![]).literal_name(), None);
    }
}
