//! Recursive-descent parser producing an [`Expr`] tree.
//!
//! ```text
//! line     := expr? '@'?
//! expr     := operand ((binop | assignop) expr)?
//! operand  := primary postfix*
//! primary  := literal | ident call? | '(' expr ')' expr? | 'new' typeChain call
//! postfix  := '.' ident call?
//! call     := '(' (expr (',' expr)*)? ')'
//! ```
//!
//! There is no precedence: the right side of an operator is the whole rest
//! of the expression.

use std::fmt;

use tinker_types::error::{ConsoleError, Result};

use crate::lexer::{Token, TokenKind, tokenize};
use crate::ops::BinaryOp;

/// Deepest nesting of groups, operator chains, calls and member accesses a
/// line may have. Evaluation recurses along the same tree.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f32),
    Double(f64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// An unqualified name, resolved against the root. `args` is set for a
    /// call.
    Name {
        name: String,
        args: Option<Vec<Expr>>,
    },
    Member {
        target: Box<Expr>,
        name: String,
        args: Option<Vec<Expr>>,
    },
    Group(Box<Expr>),
    /// `(ty)operand`
    Cast {
        ty: Box<Expr>,
        operand: Box<Expr>,
    },
    New {
        ty: Box<Expr>,
        args: Vec<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `target = value`, or a compound assignment when `op` is set.
    Assign {
        op: Option<BinaryOp>,
        target: Box<Expr>,
        value: Box<Expr>,
    },
}

/// A parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub expr: Option<Expr>,
    /// The line ended with `@`.
    pub introspect: bool,
}

fn call_suffix(f: &mut fmt::Formatter<'_>, args: &Option<Vec<Expr>>) -> fmt::Result {
    match args {
        Some(_) => f.write_str("(..)"),
        None => Ok(()),
    }
}

/// Compact form used for evaluation frames. Argument lists are elided.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Literal::Str(s)) => write!(f, "{s:?}"),
            Expr::Literal(Literal::Null) => f.write_str("null"),
            Expr::Literal(Literal::Bool(b)) => write!(f, "{b}"),
            Expr::Literal(Literal::Int(i)) => write!(f, "{i}"),
            Expr::Literal(Literal::Float(x)) => write!(f, "{x}f"),
            Expr::Literal(Literal::Double(x)) => write!(f, "{x}d"),
            Expr::Name { name, args } => {
                f.write_str(name)?;
                call_suffix(f, args)
            },
            Expr::Member { target, name, args } => {
                write!(f, "{target}.{name}")?;
                call_suffix(f, args)
            },
            Expr::Group(inner) => write!(f, "({inner})"),
            Expr::Cast { ty, operand } => write!(f, "({ty}){operand}"),
            Expr::New { ty, .. } => write!(f, "new {ty}(..)"),
            Expr::Binary { op, left, right } => write!(f, "{left} {op} {right}"),
            Expr::Assign { op, target, .. } => match op {
                Some(op) => write!(f, "{target} {op}= .."),
                None => write!(f, "{target} = .."),
            },
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Char length of the source, for errors at end of input.
    len: usize,
    depth: usize,
}

/// Parse a console line.
pub fn parse(source: &str) -> Result<Line> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        len: source.chars().count(),
        depth: 0,
    };
    let line = parser.line()?;
    log::debug!("Parsed {source:?} as {line:?}");
    Ok(line)
}

impl Parser {
    fn peek(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos).map(|t| &t.kind)
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.len, |t| t.start)
    }

    fn next(&mut self) -> Option<TokenKind> {
        let token = self.tokens.get(self.pos)?.kind.clone();
        self.pos += 1;
        Some(token)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == Some(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("expected '{kind}'")))
        }
    }

    fn unexpected(&self, wanted: &str) -> ConsoleError {
        match self.peek() {
            Some(found) => ConsoleError::syntax(self.position(), format!("{wanted}, found '{found}'")),
            None => ConsoleError::syntax(self.position(), format!("{wanted}, found end of line")),
        }
    }

    fn line(&mut self) -> Result<Line> {
        let expr = match self.peek() {
            None | Some(TokenKind::At) => None,
            Some(_) => Some(self.expr()?),
        };
        let introspect = self.eat(&TokenKind::At);
        if self.peek().is_some() {
            return Err(self.unexpected("expected end of line"));
        }
        Ok(Line { expr, introspect })
    }

    /// Enter one more level of nesting.
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(ConsoleError::syntax(
                self.position(),
                format!("expression nested deeper than {MAX_DEPTH} levels"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr> {
        self.descend()?;
        let expr = self.binary();
        self.depth -= 1;
        expr
    }

    fn binary(&mut self) -> Result<Expr> {
        let left = self.operand()?;
        match self.peek() {
            Some(&TokenKind::Op(op)) => {
                self.pos += 1;
                let right = self.expr()?;
                Ok(Expr::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            },
            Some(&TokenKind::Assign(op)) => {
                if !matches!(left, Expr::Name { args: None, .. } | Expr::Member { args: None, .. }) {
                    return Err(ConsoleError::syntax(
                        self.position(),
                        format!("cannot assign to '{left}'"),
                    ));
                }
                self.pos += 1;
                let value = self.expr()?;
                Ok(Expr::Assign {
                    op,
                    target: Box::new(left),
                    value: Box::new(value),
                })
            },
            _ => Ok(left),
        }
    }

    fn starts_operand(kind: Option<&TokenKind>) -> bool {
        matches!(
            kind,
            Some(
                TokenKind::Ident(_)
                    | TokenKind::Int(_)
                    | TokenKind::Float(_)
                    | TokenKind::Double(_)
                    | TokenKind::Str(_)
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Null
                    | TokenKind::New
                    | TokenKind::LParen
            )
        )
    }

    fn operand(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        let outer = self.depth;
        while self.eat(&TokenKind::Dot) {
            self.descend()?;
            let name = self.ident()?;
            let args = self.optional_call()?;
            expr = Expr::Member {
                target: Box::new(expr),
                name,
                args,
            };
        }
        self.depth = outer;
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr> {
        let start = self.position();
        let Some(token) = self.next() else {
            return Err(ConsoleError::syntax(start, "expected an operand, found end of line"));
        };
        let expr = match token {
            TokenKind::Null => Expr::Literal(Literal::Null),
            TokenKind::True => Expr::Literal(Literal::Bool(true)),
            TokenKind::False => Expr::Literal(Literal::Bool(false)),
            TokenKind::Int(i) => Expr::Literal(Literal::Int(i)),
            TokenKind::Float(x) => Expr::Literal(Literal::Float(x)),
            TokenKind::Double(x) => Expr::Literal(Literal::Double(x)),
            TokenKind::Str(s) => Expr::Literal(Literal::Str(s)),
            TokenKind::Ident(name) => {
                let args = self.optional_call()?;
                Expr::Name { name, args }
            },
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen)?;
                if Self::starts_operand(self.peek()) {
                    let operand = self.expr()?;
                    Expr::Cast {
                        ty: Box::new(inner),
                        operand: Box::new(operand),
                    }
                } else {
                    Expr::Group(Box::new(inner))
                }
            },
            TokenKind::New => {
                let mut ty = Expr::Name {
                    name: self.ident()?,
                    args: None,
                };
                let outer = self.depth;
                while self.eat(&TokenKind::Dot) {
                    self.descend()?;
                    ty = Expr::Member {
                        target: Box::new(ty),
                        name: self.ident()?,
                        args: None,
                    };
                }
                self.depth = outer;
                if self.peek() != Some(&TokenKind::LParen) {
                    return Err(self.unexpected("expected '(' after the constructed type"));
                }
                let args = self.optional_call()?.unwrap_or_default();
                Expr::New {
                    ty: Box::new(ty),
                    args,
                }
            },
            other => {
                return Err(ConsoleError::syntax(
                    start,
                    format!("expected an operand, found '{other}'"),
                ));
            },
        };
        Ok(expr)
    }

    fn ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(TokenKind::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            },
            _ => Err(self.unexpected("expected a name")),
        }
    }

    fn optional_call(&mut self) -> Result<Option<Vec<Expr>>> {
        if !self.eat(&TokenKind::LParen) {
            return Ok(None);
        }
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(Some(args));
        }
        loop {
            args.push(self.expr()?);
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(&TokenKind::RParen)?;
            return Ok(Some(args));
        }
    }
}
