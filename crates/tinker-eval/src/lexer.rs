//! Expression tokenizer.

use std::fmt;

use tinker_types::error::{ConsoleError, Result};

use crate::ops::BinaryOp;
use crate::scan::{is_identifier_char, is_identifier_start, is_operator_char};

/// A token with its char span in the source line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Float(f32),
    Double(f64),
    Str(String),
    True,
    False,
    Null,
    New,
    Op(BinaryOp),
    /// `=` or a compound assignment such as `+=`.
    Assign(Option<BinaryOp>),
    Dot,
    LParen,
    RParen,
    Comma,
    /// The introspection marker.
    At,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(name) => f.write_str(name),
            TokenKind::Int(i) => write!(f, "{i}"),
            TokenKind::Float(x) => write!(f, "{x}f"),
            TokenKind::Double(x) => write!(f, "{x}d"),
            TokenKind::Str(s) => write!(f, "{s:?}"),
            TokenKind::True => f.write_str("true"),
            TokenKind::False => f.write_str("false"),
            TokenKind::Null => f.write_str("null"),
            TokenKind::New => f.write_str("new"),
            TokenKind::Op(op) => write!(f, "{op}"),
            TokenKind::Assign(None) => f.write_str("="),
            TokenKind::Assign(Some(op)) => write!(f, "{op}="),
            TokenKind::Dot => f.write_str("."),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::At => f.write_str("@"),
        }
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    tokens: Vec<Token>,
}

/// Split a line into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let mut lexer = Lexer {
        chars: source.chars().collect(),
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

impl Lexer {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token {
            kind,
            start,
            end: self.pos,
        });
    }

    fn run(&mut self) -> Result<()> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            if is_identifier_start(c) {
                self.word(start);
            } else if c.is_ascii_digit() || (c == '-' && self.negative_literal_allowed()) {
                self.number(start)?;
            } else if c == '"' {
                self.string(start)?;
            } else if is_operator_char(c) {
                self.operator(start)?;
            } else {
                let kind = match c {
                    '.' => TokenKind::Dot,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    ',' => TokenKind::Comma,
                    '@' => TokenKind::At,
                    other => {
                        return Err(ConsoleError::syntax(
                            start,
                            format!("unexpected character '{other}'"),
                        ));
                    },
                };
                self.pos += 1;
                self.push(kind, start);
            }
        }
        Ok(())
    }

    /// A `-` starts a negative literal when a digit follows and no operand
    /// precedes it.
    fn negative_literal_allowed(&self) -> bool {
        self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
            && self.tokens.last().is_none_or(|t| {
                matches!(
                    t.kind,
                    TokenKind::Op(_) | TokenKind::Assign(_) | TokenKind::LParen | TokenKind::Comma
                )
            })
    }

    fn word(&mut self, start: usize) {
        while self.peek().is_some_and(is_identifier_char) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = match text.as_str() {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "new" => TokenKind::New,
            _ => TokenKind::Ident(text),
        };
        self.push(kind, start);
    }

    fn number(&mut self, start: usize) -> Result<()> {
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        self.digits();
        let mut fractional = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            fractional = true;
            self.pos += 1;
            self.digits();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let kind = match self.peek() {
            Some('f' | 'F') => {
                self.pos += 1;
                text.parse().map(TokenKind::Float).ok()
            },
            Some('d' | 'D') => {
                self.pos += 1;
                text.parse().map(TokenKind::Double).ok()
            },
            _ if fractional => {
                return Err(ConsoleError::syntax(
                    start,
                    format!("'{text}' needs an 'f' or 'd' suffix"),
                ));
            },
            _ => text.parse().map(TokenKind::Int).ok(),
        };
        if self.peek().is_some_and(is_identifier_char) {
            return Err(ConsoleError::syntax(self.pos, "invalid numeric literal"));
        }
        let kind =
            kind.ok_or_else(|| ConsoleError::syntax(start, format!("'{text}' is out of range")))?;
        self.push(kind, start);
        Ok(())
    }

    fn digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
    }

    fn string(&mut self, start: usize) -> Result<()> {
        self.pos += 1;
        let mut text = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(ConsoleError::syntax(start, "unterminated string"));
            };
            self.pos += 1;
            match c {
                '"' => break,
                '\\' => {
                    let escaped = self
                        .peek()
                        .ok_or_else(|| ConsoleError::syntax(start, "unterminated string"))?;
                    self.pos += 1;
                    text.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                },
                other => text.push(other),
            }
        }
        self.push(TokenKind::Str(text), start);
        Ok(())
    }

    fn operator(&mut self, start: usize) -> Result<()> {
        let first = self.chars[start];
        let second = self.peek_at(1);
        let two: String = [Some(first), second].into_iter().flatten().collect();
        if let Some(op) = BinaryOp::from_symbol(&two) {
            self.pos += 2;
            self.push(TokenKind::Op(op), start);
            return Ok(());
        }
        let single = BinaryOp::from_symbol(&first.to_string());
        if second == Some('=') {
            if let Some(op) = single.filter(|op| op.has_compound_form()) {
                self.pos += 2;
                self.push(TokenKind::Assign(Some(op)), start);
                return Ok(());
            }
        }
        self.pos += 1;
        match (first, single) {
            ('=', _) => self.push(TokenKind::Assign(None), start),
            (_, Some(op)) => self.push(TokenKind::Op(op), start),
            (other, None) => {
                return Err(ConsoleError::syntax(
                    start,
                    format!("unexpected character '{other}'"),
                ));
            },
        }
        Ok(())
    }
}
