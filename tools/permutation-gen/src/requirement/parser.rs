//! Recursive-descent parser producing an unresolved expression tree.
//!
//! Precedence, loosest first: `or`, `and`, `not`, then comparisons and
//! parenthesized groups. Comparisons never chain.

use super::token::{Span, Token, TokenKind, Tokenizer};
use crate::error::RequirementError;

/// Deepest expression tree a requirement may build. Every `not`, parenthesized
/// group and chained `and`/`or` counts as one level.
pub const MAX_NESTING: usize = 128;

/// A name or literal together with where it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
}

/// Requirement expression, axis names not yet checked against any option space
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Bool(bool),
    /// `AXIS == 'value'` / `AXIS != 'value'` (either operand order)
    Compare {
        axis: Spanned,
        op: CompareOp,
        value: Spanned,
    },
    /// `AXIS in ('a', 'b')` / `AXIS not in ['a']`
    Member {
        axis: Spanned,
        values: Vec<Spanned>,
        negated: bool,
    },
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

/// Parse a complete requirement expression.
pub fn parse_expression(source: &str) -> Result<Expr, RequirementError> {
    let tokens = Tokenizer::tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    let expr = parser.parse_or()?;
    let trailing = parser.peek();
    if trailing.kind != TokenKind::Eof {
        return Err(RequirementError::syntax(
            format!("unexpected {} after expression", trailing.kind),
            trailing.span,
        ));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The tokenizer always terminates the stream with Eof, and Eof is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, RequirementError> {
        let token = self.bump();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(RequirementError::syntax(
                format!("expected {}, found {}", kind, token.kind),
                token.span,
            ))
        }
    }

    /// Enter one more level of nesting at `span`.
    fn nest(&mut self, span: Span) -> Result<(), RequirementError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(RequirementError::syntax(
                format!("expression nested too deeply (limit {})", MAX_NESTING),
                span,
            ));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Expr, RequirementError> {
        let depth = self.depth;
        let mut lhs = self.parse_and()?;
        while self.peek().kind == TokenKind::Or {
            let op = self.bump();
            self.nest(op.span)?;
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, RequirementError> {
        let depth = self.depth;
        let mut lhs = self.parse_unary()?;
        while self.peek().kind == TokenKind::And {
            let op = self.bump();
            self.nest(op.span)?;
            let rhs = self.parse_unary()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        self.depth = depth;
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, RequirementError> {
        if self.peek().kind == TokenKind::Not {
            let op = self.bump();
            self.nest(op.span)?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, RequirementError> {
        let token = self.bump();
        match token.kind {
            TokenKind::LParen => {
                self.nest(token.span)?;
                let inner = self.parse_or()?;
                self.expect(TokenKind::RParen)?;
                self.depth -= 1;
                Ok(inner)
            }
            TokenKind::True => Ok(Expr::Bool(true)),
            TokenKind::False => Ok(Expr::Bool(false)),
            TokenKind::Ident(_) | TokenKind::Str(_) => self.parse_comparison(token),
            other => Err(RequirementError::syntax(
                format!("expected an expression, found {}", other),
                token.span,
            )),
        }
    }

    fn parse_comparison(&mut self, lhs: Token) -> Result<Expr, RequirementError> {
        let op_token = self.bump();
        match op_token.kind {
            TokenKind::EqEq | TokenKind::NotEq => {
                let op = if op_token.kind == TokenKind::EqEq {
                    CompareOp::Eq
                } else {
                    CompareOp::Ne
                };
                let rhs = self.bump();
                let span = lhs.span.merge(&rhs.span);
                match (lhs.kind, rhs.kind) {
                    (TokenKind::Ident(axis), TokenKind::Str(value)) => Ok(Expr::Compare {
                        axis: Spanned { text: axis, span: lhs.span },
                        op,
                        value: Spanned { text: value, span: rhs.span },
                    }),
                    (TokenKind::Str(value), TokenKind::Ident(axis)) => Ok(Expr::Compare {
                        axis: Spanned { text: axis, span: rhs.span },
                        op,
                        value: Spanned { text: value, span: lhs.span },
                    }),
                    (TokenKind::Ident(a), TokenKind::Ident(b)) => Err(RequirementError::syntax(
                        format!(
                            "cannot compare axis `{}` with axis `{}`; compare an axis with a quoted value",
                            a, b
                        ),
                        span,
                    )),
                    (TokenKind::Str(_), TokenKind::Str(_)) => Err(RequirementError::syntax(
                        "comparison between two literals; one side must be an axis name",
                        span,
                    )),
                    (_, other) => Err(RequirementError::syntax(
                        format!("expected an axis name or quoted value, found {}", other),
                        rhs.span,
                    )),
                }
            }
            TokenKind::In | TokenKind::Not => {
                if op_token.kind == TokenKind::Not {
                    self.expect(TokenKind::In)?;
                }
                let negated = op_token.kind == TokenKind::Not;
                let TokenKind::Ident(axis) = lhs.kind else {
                    return Err(RequirementError::syntax(
                        "left side of `in` must be an axis name",
                        lhs.span,
                    ));
                };
                let values = self.parse_list()?;
                Ok(Expr::Member {
                    axis: Spanned { text: axis, span: lhs.span },
                    values,
                    negated,
                })
            }
            _ => match lhs.kind {
                TokenKind::Ident(axis) => Err(RequirementError::syntax(
                    format!(
                        "axis `{}` must be compared with a value, e.g. `{} == '...'`",
                        axis, axis
                    ),
                    lhs.span,
                )),
                _ => Err(RequirementError::syntax(
                    "a literal on its own is not a condition",
                    lhs.span,
                )),
            },
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Spanned>, RequirementError> {
        let open = self.bump();
        let close = match open.kind {
            TokenKind::LParen => TokenKind::RParen,
            TokenKind::LBracket => TokenKind::RBracket,
            other => {
                return Err(RequirementError::syntax(
                    format!("expected a list of quoted values, found {}", other),
                    open.span,
                ));
            }
        };

        let mut values = Vec::new();
        loop {
            if self.eat(&close) {
                break;
            }
            let token = self.bump();
            let TokenKind::Str(value) = token.kind else {
                return Err(RequirementError::syntax(
                    format!("expected a quoted value, found {}", token.kind),
                    token.span,
                ));
            };
            values.push(Spanned {
                text: value,
                span: token.span,
            });
            if !self.eat(&TokenKind::Comma) {
                self.expect(close.clone())?;
                break;
            }
        }

        if values.is_empty() {
            return Err(RequirementError::syntax(
                "value list must not be empty",
                open.span,
            ));
        }
        Ok(values)
    }
}
