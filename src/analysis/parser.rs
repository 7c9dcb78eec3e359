//! Expression parser for R source.
//!
//! A precedence-climbing parser over R's operator table. It produces
//! call/argument structure faithful enough for dependency analysis:
//! every operator, control-flow keyword, brace block and index becomes a
//! call node (see [`crate::analysis::ast`]).
//!
//! Newline handling follows R: a newline ends a statement at the top level
//! and inside braces, but is insignificant inside parentheses and brackets
//! or directly after an operator.

use thiserror::Error;

use crate::analysis::ast::{Arg, Expr};
use crate::analysis::lexer::{Scanner, Spanned, Token};

/// A syntax error with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at line {line}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

/// Parse a full source file as a sequence of top-level expressions.
pub fn parse_program(source: &str) -> Result<Vec<Expr>, ParseError> {
    let tokens = Scanner::new(source).scan()?;
    let mut parser = Parser::new(tokens);
    let mut exprs = Vec::new();

    loop {
        parser.skip_separators();
        if matches!(parser.peek(), Token::Eof) {
            return Ok(exprs);
        }
        exprs.push(parser.parse_binary(0)?);
        match parser.peek() {
            Token::Newline | Token::Semi | Token::Eof => {}
            _ => return Err(parser.error("expected end of statement")),
        }
    }
}

/// Parse a single expression, e.g. a literate-document parameter value.
pub fn parse_expression(source: &str) -> Result<Expr, ParseError> {
    let mut exprs = parse_program(source)?;
    if exprs.is_empty() {
        return Err(ParseError {
            line: 1,
            message: "empty expression".into(),
        });
    }
    Ok(exprs.remove(0))
}

enum ArgClose {
    Paren,
    Bracket,
    DoubleBracket,
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Paren/bracket nesting depth; newlines are skipped when > 0
    depth: usize,
}

/// Binary operator precedence; higher binds tighter. `true` = right
/// associative. Accessor operators (`::`, `$`, ...) are postfix-parsed and
/// deliberately absent.
fn binary_prec(op: &str) -> Option<(u8, bool)> {
    let entry = match op {
        "?" => (1, false),
        "=" => (2, true),
        "<-" | "<<-" => (3, true),
        "->" | "->>" => (4, false),
        "~" => (5, false),
        "||" | "|" => (6, false),
        "&&" | "&" => (7, false),
        "==" | "!=" | "<" | ">" | "<=" | ">=" => (9, false),
        "+" | "-" => (10, false),
        "*" | "/" => (11, false),
        "|>" => (12, false),
        _ if op.starts_with('%') => (12, false),
        ":" => (13, false),
        "^" => (15, true),
        _ => return None,
    };
    Some(entry)
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // ------------------------------------------------------------------
    // Expression levels
    // ------------------------------------------------------------------

    fn parse_binary(&mut self, min_prec: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;

        loop {
            let save = self.pos;
            if self.depth > 0 {
                self.skip_newlines();
            }

            let op = match self.peek() {
                Token::Op(op) => op.clone(),
                _ => {
                    self.pos = save;
                    break;
                }
            };
            let Some((prec, right_assoc)) = binary_prec(&op) else {
                self.pos = save;
                break;
            };
            if prec < min_prec {
                self.pos = save;
                break;
            }

            self.advance();
            // A line ending in an operator always continues
            self.skip_newlines();

            let next_min = if right_assoc { prec } else { prec + 1 };
            let rhs = self.parse_binary(next_min)?;
            lhs = Expr::call_op(&op, vec![lhs, rhs]);
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let Token::Op(op) = self.peek() {
            // Prefix operand precedence: `-x^2` is `-(x^2)`, `!a == b`
            // is `!(a == b)`, `!a & b` is `(!a) & b`.
            let min = match op.as_str() {
                "-" | "+" => Some(14),
                "!" => Some(9),
                "~" => Some(6),
                "?" => Some(2),
                _ => None,
            };
            if let Some(min) = min {
                let op = op.clone();
                self.advance();
                self.skip_newlines();
                let operand = self.parse_binary(min)?;
                return Ok(Expr::call_op(&op, vec![operand]));
            }
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.peek() {
                Token::LParen => {
                    self.advance();
                    let args = self.parse_args(ArgClose::Paren)?;
                    expr = Expr::call(expr, args);
                }
                Token::LBracket => {
                    self.advance();
                    let mut args = vec![Arg::positional(expr)];
                    args.extend(self.parse_args(ArgClose::Bracket)?);
                    expr = Expr::call(Expr::symbol("["), args);
                }
                Token::LDoubleBracket => {
                    self.advance();
                    let mut args = vec![Arg::positional(expr)];
                    args.extend(self.parse_args(ArgClose::DoubleBracket)?);
                    expr = Expr::call(Expr::symbol("[["), args);
                }
                Token::Op(op)
                    if matches!(op.as_str(), "::" | ":::" | "$" | "@") =>
                {
                    let op = op.clone();
                    self.advance();
                    self.skip_newlines();
                    let member = self.parse_member()?;
                    expr = Expr::call_op(&op, vec![expr, member]);
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_member(&mut self) -> Result<Expr, ParseError> {
        match self.advance_tok() {
            (Token::Symbol(name), _) => Ok(Expr::Symbol(name)),
            (Token::Str(value), _) => Ok(Expr::Str(value)),
            (tok, line) => Err(ParseError {
                line,
                message: format!("expected a name after accessor, found {tok:?}"),
            }),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let (tok, line) = self.advance_tok();
        match tok {
            Token::Num(lexeme) => Ok(Expr::Num(lexeme)),
            Token::Str(value) => Ok(Expr::Str(value)),
            Token::Symbol(name) => match name.as_str() {
                "function" => self.parse_function(),
                "if" => self.parse_if(),
                "for" => self.parse_for(),
                "while" => self.parse_while(),
                "repeat" => {
                    self.skip_newlines();
                    let body = self.parse_binary(0)?;
                    Ok(Expr::call_op("repeat", vec![body]))
                }
                _ => Ok(Expr::Symbol(name)),
            },
            Token::Backslash => self.parse_function(),
            Token::LParen => {
                // Grouping parens are transparent in the tree
                self.depth += 1;
                self.skip_newlines();
                let inner = self.parse_binary(0)?;
                self.skip_newlines();
                self.expect(Token::RParen, ")")?;
                self.depth -= 1;
                Ok(inner)
            }
            Token::LBrace => self.parse_block(),
            other => Err(ParseError {
                line,
                message: format!("unexpected token {other:?}"),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Compound forms
    // ------------------------------------------------------------------

    fn parse_function(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, "( after function")?;
        self.depth += 1;

        let mut args: Vec<Arg> = Vec::new();
        self.skip_newlines();
        if !matches!(self.peek(), Token::RParen) {
            loop {
                self.skip_newlines();
                let (tok, line) = self.advance_tok();
                let Token::Symbol(param) = tok else {
                    return Err(ParseError {
                        line,
                        message: "expected parameter name".into(),
                    });
                };
                let default = if matches!(self.peek(), Token::Op(op) if op.as_str() == "=") {
                    self.advance();
                    self.skip_newlines();
                    self.parse_binary(0)?
                } else {
                    Expr::Missing
                };
                args.push(Arg::named(param, default));

                self.skip_newlines();
                match self.peek() {
                    Token::Comma => {
                        self.advance();
                    }
                    Token::RParen => break,
                    _ => return Err(self.error("expected `,` or `)` in parameter list")),
                }
            }
        }
        self.expect(Token::RParen, ")")?;
        self.depth -= 1;

        self.skip_newlines();
        let body = self.parse_binary(0)?;
        args.push(Arg::positional(body));
        Ok(Expr::call(Expr::symbol("function"), args))
    }

    fn parse_if(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_paren_header("if")?;
        self.skip_newlines();
        let then = self.parse_binary(0)?;

        // `else` may sit on the next line inside a block; look past
        // newlines but restore if it never shows up.
        let save = self.pos;
        self.skip_newlines();
        if matches!(self.peek(), Token::Symbol(s) if s.as_str() == "else") {
            self.advance();
            self.skip_newlines();
            let alt = self.parse_binary(0)?;
            Ok(Expr::call_op("if", vec![cond, then, alt]))
        } else {
            self.pos = save;
            Ok(Expr::call_op("if", vec![cond, then]))
        }
    }

    fn parse_for(&mut self) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, "( after for")?;
        self.depth += 1;
        self.skip_newlines();

        let (tok, line) = self.advance_tok();
        let Token::Symbol(var) = tok else {
            return Err(ParseError {
                line,
                message: "expected loop variable".into(),
            });
        };
        let (tok, line) = self.advance_tok();
        if !matches!(&tok, Token::Symbol(s) if s.as_str() == "in") {
            return Err(ParseError {
                line,
                message: "expected `in` in for loop".into(),
            });
        }
        self.skip_newlines();
        let seq = self.parse_binary(0)?;
        self.skip_newlines();
        self.expect(Token::RParen, ")")?;
        self.depth -= 1;

        self.skip_newlines();
        let body = self.parse_binary(0)?;
        Ok(Expr::call_op("for", vec![Expr::Symbol(var), seq, body]))
    }

    fn parse_while(&mut self) -> Result<Expr, ParseError> {
        let cond = self.parse_paren_header("while")?;
        self.skip_newlines();
        let body = self.parse_binary(0)?;
        Ok(Expr::call_op("while", vec![cond, body]))
    }

    fn parse_paren_header(&mut self, keyword: &str) -> Result<Expr, ParseError> {
        self.expect(Token::LParen, &format!("( after {keyword}"))?;
        self.depth += 1;
        self.skip_newlines();
        let inner = self.parse_binary(0)?;
        self.skip_newlines();
        self.expect(Token::RParen, ")")?;
        self.depth -= 1;
        Ok(inner)
    }

    fn parse_block(&mut self) -> Result<Expr, ParseError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            match self.peek() {
                Token::RBrace => {
                    self.advance();
                    break;
                }
                Token::Eof => return Err(self.error("unexpected end of input in block")),
                _ => {}
            }
            stmts.push(self.parse_binary(0)?);
            match self.peek() {
                Token::Newline | Token::Semi | Token::RBrace => {}
                Token::Eof => return Err(self.error("unexpected end of input in block")),
                _ => return Err(self.error("expected end of statement in block")),
            }
        }
        Ok(Expr::call(
            Expr::symbol("{"),
            stmts.into_iter().map(Arg::positional).collect(),
        ))
    }

    // ------------------------------------------------------------------
    // Argument lists
    // ------------------------------------------------------------------

    fn parse_args(&mut self, close: ArgClose) -> Result<Vec<Arg>, ParseError> {
        self.depth += 1;
        let mut args = Vec::new();

        self.skip_newlines();
        if self.at_close(&close) {
            self.consume_close(&close)?;
            self.depth -= 1;
            return Ok(args);
        }

        loop {
            self.skip_newlines();
            let arg = if matches!(self.peek(), Token::Comma) || self.at_close(&close) {
                Arg::positional(Expr::Missing)
            } else {
                self.parse_arg()?
            };
            args.push(arg);

            self.skip_newlines();
            if matches!(self.peek(), Token::Comma) {
                self.advance();
                continue;
            }
            if self.at_close(&close) {
                self.consume_close(&close)?;
                self.depth -= 1;
                return Ok(args);
            }
            return Err(self.error("expected `,` or closing delimiter in argument list"));
        }
    }

    fn parse_arg(&mut self) -> Result<Arg, ParseError> {
        // Named argument: `name = value` with a symbol or string name
        let name = match self.peek() {
            Token::Symbol(name) | Token::Str(name) => Some(name.clone()),
            _ => None,
        };
        if let Some(name) = name {
            if matches!(self.peek_at(self.pos + 1), Token::Op(op) if op.as_str() == "=") {
                self.advance(); // name
                self.advance(); // =
                self.skip_newlines();
                let value = if matches!(
                    self.peek(),
                    Token::Comma | Token::RParen | Token::RBracket
                ) {
                    Expr::Missing
                } else {
                    self.parse_binary(0)?
                };
                return Ok(Arg {
                    name: Some(name),
                    value,
                });
            }
        }
        Ok(Arg::positional(self.parse_binary(0)?))
    }

    fn at_close(&self, close: &ArgClose) -> bool {
        match close {
            ArgClose::Paren => matches!(self.peek(), Token::RParen),
            ArgClose::Bracket | ArgClose::DoubleBracket => {
                matches!(self.peek(), Token::RBracket)
            }
        }
    }

    fn consume_close(&mut self, close: &ArgClose) -> Result<(), ParseError> {
        match close {
            ArgClose::Paren => self.expect(Token::RParen, ")"),
            ArgClose::Bracket => self.expect(Token::RBracket, "]"),
            ArgClose::DoubleBracket => {
                self.expect(Token::RBracket, "]]")?;
                self.skip_newlines();
                self.expect(Token::RBracket, "]]")
            }
        }
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].0
    }

    fn peek_at(&self, idx: usize) -> &Token {
        let idx = idx.min(self.tokens.len() - 1);
        &self.tokens[idx].0
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn advance_tok(&mut self) -> (Token, usize) {
        let spanned = self.tokens[self.pos].clone();
        self.advance();
        spanned
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Token::Newline | Token::Semi) {
            self.advance();
        }
    }

    fn expect(&mut self, expected: Token, what: &str) -> Result<(), ParseError> {
        let (tok, line) = self.advance_tok();
        if tok == expected {
            Ok(())
        } else {
            Err(ParseError {
                line,
                message: format!("expected `{what}`, found {tok:?}"),
            })
        }
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError {
            line: self.tokens[self.pos].1,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call_name(expr: &Expr) -> &str {
        expr.as_call()
            .and_then(|c| c.func.as_symbol())
            .unwrap_or("<none>")
    }

    #[test]
    fn test_simple_call_with_named_args() {
        let expr = parse_expression("library(dplyr, quietly = TRUE)").unwrap();
        let call = expr.as_call().unwrap();
        assert_eq!(call.func.as_symbol(), Some("library"));
        assert_eq!(call.args.len(), 2);
        assert_eq!(call.args[0].name, None);
        assert_eq!(call.args[0].value, Expr::symbol("dplyr"));
        assert_eq!(call.args[1].name.as_deref(), Some("quietly"));
        assert_eq!(call.args[1].value, Expr::symbol("TRUE"));
    }

    #[test]
    fn test_namespace_access_binds_tighter_than_call() {
        // pkg::fn(x) is (pkg::fn)(x)
        let expr = parse_expression("pkg::fn(x)").unwrap();
        let outer = expr.as_call().unwrap();
        let inner = outer.func.as_call().unwrap();
        assert_eq!(inner.func.as_symbol(), Some("::"));
        assert_eq!(inner.args[0].value, Expr::symbol("pkg"));
        assert_eq!(inner.args[1].value, Expr::symbol("fn"));
    }

    #[test]
    fn test_operators_become_calls() {
        let expr = parse_expression("1 + 2 * 3").unwrap();
        assert_eq!(call_name(&expr), "+");
        let rhs = &expr.as_call().unwrap().args[1].value;
        assert_eq!(call_name(rhs), "*");
    }

    #[test]
    fn test_assignment_and_pipe() {
        let expr = parse_expression("out <- x |> summarize()").unwrap();
        assert_eq!(call_name(&expr), "<-");
        let rhs = &expr.as_call().unwrap().args[1].value;
        assert_eq!(call_name(rhs), "|>");
    }

    #[test]
    fn test_top_level_newlines_separate_statements() {
        let exprs = parse_program("x <- 1\ny <- 2\n").unwrap();
        assert_eq!(exprs.len(), 2);
    }

    #[test]
    fn test_newlines_inside_call_continue() {
        let exprs = parse_program("f(\n  a,\n  b = 2\n)\n").unwrap();
        assert_eq!(exprs.len(), 1);
        assert_eq!(exprs[0].as_call().unwrap().args.len(), 2);
    }

    #[test]
    fn test_block_statements() {
        let expr = parse_expression("{\n  library(a)\n  library(b)\n}").unwrap();
        let block = expr.as_call().unwrap();
        assert_eq!(block.func.as_symbol(), Some("{"));
        assert_eq!(block.args.len(), 2);
    }

    #[test]
    fn test_function_definition() {
        let expr = parse_expression("function(x, n = 10) x + n").unwrap();
        let call = expr.as_call().unwrap();
        assert_eq!(call.func.as_symbol(), Some("function"));
        // two formals plus the body
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[0].name.as_deref(), Some("x"));
        assert_eq!(call.args[1].name.as_deref(), Some("n"));
    }

    #[test]
    fn test_lambda_shorthand() {
        let expr = parse_expression(r"\(x) x + 1").unwrap();
        assert_eq!(call_name(&expr), "function");
    }

    #[test]
    fn test_control_flow() {
        let expr =
            parse_expression("if (ok) library(a) else library(b)").unwrap();
        let call = expr.as_call().unwrap();
        assert_eq!(call.func.as_symbol(), Some("if"));
        assert_eq!(call.args.len(), 3);

        let expr = parse_expression("for (i in 1:10) print(i)").unwrap();
        assert_eq!(call_name(&expr), "for");
    }

    #[test]
    fn test_empty_index_slots() {
        let expr = parse_expression("m[, 1]").unwrap();
        let call = expr.as_call().unwrap();
        assert_eq!(call.func.as_symbol(), Some("["));
        assert_eq!(call.args.len(), 3);
        assert_eq!(call.args[1].value, Expr::Missing);
    }

    #[test]
    fn test_double_bracket_index() {
        let expr = parse_expression("lst[[\"item\"]]").unwrap();
        assert_eq!(call_name(&expr), "[[");
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = parse_program("x <- 1\nf(,]\n").unwrap_err();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unary_minus() {
        let expr = parse_expression("-x").unwrap();
        assert_eq!(call_name(&expr), "-");
        assert_eq!(expr.as_call().unwrap().args.len(), 1);
    }

    #[test]
    fn test_string_function_position() {
        let expr = parse_expression(r#""library"(dplyr)"#).unwrap();
        let call = expr.as_call().unwrap();
        assert_eq!(call.func.literal_name(), Some("library"));
    }

    #[test]
    fn test_formula_and_percent_op() {
        let expr = parse_expression("y ~ x %in% z").unwrap();
        assert_eq!(call_name(&expr), "~");
    }
}
