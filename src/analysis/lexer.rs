//! Lexical scanner for R source.
//!
//! Converts source text into a token stream. Newlines are tokens because R
//! uses them as statement separators outside of bracketed contexts; the
//! parser decides where they matter.

use crate::analysis::parser::ParseError;

/// One lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier, keyword, or backtick-quoted name
    Symbol(String),
    /// String literal (quotes and escapes resolved)
    Str(String),
    /// Numeric literal, kept as its lexeme
    Num(String),
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    /// `[[` - lexed as one token so indexing shape survives
    LDoubleBracket,
    RBracket,
    Comma,
    Semi,
    Newline,
    /// `\` introducing a lambda (R >= 4.1)
    Backslash,
    /// Any operator, including `::`, `:::`, `%op%` and the assignment arrows
    Op(String),
    Eof,
}

/// Token paired with its 1-based source line.
pub type Spanned = (Token, usize);

pub struct Scanner {
    source: Vec<char>,
    pos: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    /// Scan the whole input. The final token is always `Eof`.
    pub fn scan(mut self) -> Result<Vec<Spanned>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.0 == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, ParseError> {
        self.skip_blank();

        let line = self.line;
        let Some(c) = self.advance() else {
            return Ok((Token::Eof, line));
        };

        let token = match c {
            '\n' => {
                self.line += 1;
                Token::Newline
            }
            '(' => Token::LParen,
            ')' => Token::RParen,
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '[' => {
                if self.eat('[') {
                    Token::LDoubleBracket
                } else {
                    Token::LBracket
                }
            }
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semi,
            '\\' => Token::Backslash,
            '"' | '\'' => self.string(c, line)?,
            '`' => self.backtick_symbol(line)?,
            '%' => self.percent_op(line)?,
            ':' => {
                if self.eat(':') {
                    if self.eat(':') {
                        Token::Op(":::".into())
                    } else {
                        Token::Op("::".into())
                    }
                } else {
                    Token::Op(":".into())
                }
            }
            '<' => {
                if self.eat('-') {
                    Token::Op("<-".into())
                } else if self.peek() == Some('<') && self.peek2() == Some('-') {
                    self.advance();
                    self.advance();
                    Token::Op("<<-".into())
                } else if self.eat('=') {
                    Token::Op("<=".into())
                } else {
                    Token::Op("<".into())
                }
            }
            '>' => {
                if self.eat('=') {
                    Token::Op(">=".into())
                } else {
                    Token::Op(">".into())
                }
            }
            '-' => {
                if self.eat('>') {
                    if self.eat('>') {
                        Token::Op("->>".into())
                    } else {
                        Token::Op("->".into())
                    }
                } else {
                    Token::Op("-".into())
                }
            }
            '=' => {
                if self.eat('=') {
                    Token::Op("==".into())
                } else {
                    Token::Op("=".into())
                }
            }
            '!' => {
                if self.eat('=') {
                    Token::Op("!=".into())
                } else {
                    Token::Op("!".into())
                }
            }
            '&' => {
                if self.eat('&') {
                    Token::Op("&&".into())
                } else {
                    Token::Op("&".into())
                }
            }
            '|' => {
                if self.eat('|') {
                    Token::Op("||".into())
                } else if self.eat('>') {
                    Token::Op("|>".into())
                } else {
                    Token::Op("|".into())
                }
            }
            '+' | '*' | '/' | '^' | '~' | '?' | '@' | '$' => Token::Op(c.to_string()),
            _ if c.is_ascii_digit() => self.number(c),
            '.' if self.peek().is_some_and(|d| d.is_ascii_digit()) => self.number(c),
            _ if c.is_alphabetic() || c == '.' => self.symbol(c),
            _ => {
                return Err(ParseError {
                    line,
                    message: format!("unexpected character `{c}`"),
                })
            }
        };

        Ok((token, line))
    }

    fn skip_blank(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.advance();
                }
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self, quote: char, line: usize) -> Result<Token, ParseError> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ParseError {
                        line,
                        message: "unterminated string literal".into(),
                    })
                }
                Some(c) if c == quote => return Ok(Token::Str(value)),
                Some('\\') => {
                    let Some(esc) = self.advance() else {
                        return Err(ParseError {
                            line,
                            message: "unterminated string literal".into(),
                        });
                    };
                    match esc {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        other => value.push(other),
                    }
                }
                Some('\n') => {
                    self.line += 1;
                    value.push('\n');
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn backtick_symbol(&mut self, line: usize) -> Result<Token, ParseError> {
        let mut name = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(ParseError {
                        line,
                        message: "unterminated backtick name".into(),
                    })
                }
                Some('`') => return Ok(Token::Symbol(name)),
                Some('\n') => {
                    self.line += 1;
                    name.push('\n');
                }
                Some(c) => name.push(c),
            }
        }
    }

    fn percent_op(&mut self, line: usize) -> Result<Token, ParseError> {
        let mut op = String::from("%");
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(ParseError {
                        line,
                        message: "unterminated %% operator".into(),
                    })
                }
                Some('%') => {
                    op.push('%');
                    return Ok(Token::Op(op));
                }
                Some(c) => op.push(c),
            }
        }
    }

    fn number(&mut self, first: char) -> Token {
        let mut lexeme = String::new();
        lexeme.push(first);

        if first == '0' && self.peek().is_some_and(|c| c == 'x' || c == 'X') {
            lexeme.push(self.advance().unwrap());
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                lexeme.push(self.advance().unwrap());
            }
        } else {
            while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
                lexeme.push(self.advance().unwrap());
            }
            if self.peek().is_some_and(|c| c == 'e' || c == 'E') {
                lexeme.push(self.advance().unwrap());
                if self.peek().is_some_and(|c| c == '+' || c == '-') {
                    lexeme.push(self.advance().unwrap());
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    lexeme.push(self.advance().unwrap());
                }
            }
        }

        // Integer / complex suffix
        if self.peek().is_some_and(|c| c == 'L' || c == 'i') {
            lexeme.push(self.advance().unwrap());
        }

        Token::Num(lexeme)
    }

    fn symbol(&mut self, first: char) -> Token {
        let mut name = String::new();
        name.push(first);
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '.' || c == '_')
        {
            name.push(self.advance().unwrap());
        }
        Token::Symbol(name)
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}
