//! Recursive-descent parser: tokens → expression tree.
//!
//! Grammar (left-associative, `*` `/` bind tighter than `+` `-`):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | primary
//! primary := NUMBER | IDENT | '(' expr ')'
//! ```
//!
//! Identifiers become [`Reference`]s, classified by suffix at parse time so the
//! evaluator never touches the formula text again.

use crate::constants::{SUFFIX_RAW, SUFFIX_STANDARDIZED, SUFFIX_WEIGHT};
use crate::error::FormulaError;

use super::lexer::{Token, TokenKind};

/// Nesting limit for parentheses and unary signs.
const MAX_DEPTH: usize = 128;

/// Token limit per formula. Binary chains are left-deep, so this also bounds
/// tree depth for evaluation, reference walks and drop.
pub const MAX_TOKENS: usize = 2048;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefKind {
    /// `<id>` or `<id>_Val`
    Raw,
    /// `<id>_weight`
    Weight,
    /// `<id>_stnd`
    Standardized,
}

/// A variable reference as written in the formula.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Identifier exactly as written.
    pub name: String,
    /// Lowercased identifier with the recognized suffix stripped.
    pub id: String,
    pub kind: RefKind,
}

impl Reference {
    pub fn classify(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        let (id, kind) = if let Some(id) = strip_suffix(&lower, SUFFIX_WEIGHT) {
            (id, RefKind::Weight)
        } else if let Some(id) = strip_suffix(&lower, SUFFIX_STANDARDIZED) {
            (id, RefKind::Standardized)
        } else if let Some(id) = strip_suffix(&lower, SUFFIX_RAW) {
            (id, RefKind::Raw)
        } else {
            (lower.as_str(), RefKind::Raw)
        };
        Reference {
            name: name.to_string(),
            id: id.to_string(),
            kind,
        }
    }

    /// The whole identifier, lowercased. Used when a suffixed name is itself a
    /// declared id (e.g. a variable literally called `cost_val`).
    pub fn full_id(&self) -> String {
        self.name.to_ascii_lowercase()
    }
}

fn strip_suffix<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    s.strip_suffix(suffix).filter(|id| !id.is_empty())
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Number(f64),
    Ref(Reference),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Visit every reference in left-to-right order.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a Reference)) {
        match self {
            Expr::Number(_) => {}
            Expr::Ref(r) => f(r),
            Expr::Neg(inner) => inner.for_each_reference(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_reference(f);
                rhs.for_each_reference(f);
            }
        }
    }
}

pub fn parse(tokens: &[Token]) -> Result<Expr, FormulaError> {
    if tokens.is_empty() {
        return Err(FormulaError::failed("empty expression"));
    }
    if tokens.len() > MAX_TOKENS {
        return Err(FormulaError::failed(format!(
            "expression has {} tokens, limit is {}",
            tokens.len(),
            MAX_TOKENS
        )));
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expr(0)?;
    if let Some(tok) = parser.peek() {
        return Err(FormulaError::failed(format!(
            "unexpected {} at offset {}",
            describe(&tok.kind),
            tok.offset
        )));
    }
    Ok(expr)
}

struct Parser<'t> {
    tokens: &'t [Token],
    pos: usize,
}

impl<'t> Parser<'t> {
    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&'t Token> {
        let tok = self.tokens.get(self.pos);
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expr(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        let mut lhs = self.term(depth)?;
        while let Some(tok) = self.peek() {
            let op = match tok.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.term(depth)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn term(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary(depth)?;
        while let Some(tok) = self.peek() {
            let op = match tok.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.unary(depth)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        if depth > MAX_DEPTH {
            return Err(FormulaError::failed("expression nested too deeply"));
        }
        match self.peek().map(|t| &t.kind) {
            Some(TokenKind::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary(depth + 1)?)))
            }
            Some(TokenKind::Plus) => {
                self.pos += 1;
                self.unary(depth + 1)
            }
            _ => self.primary(depth),
        }
    }

    fn primary(&mut self, depth: usize) -> Result<Expr, FormulaError> {
        let Some(tok) = self.next() else {
            return Err(FormulaError::failed("unexpected end of expression"));
        };
        match &tok.kind {
            TokenKind::Number(v) => Ok(Expr::Number(*v)),
            TokenKind::Ident(name) => Ok(Expr::Ref(Reference::classify(name))),
            TokenKind::LParen => {
                let inner = self.expr(depth + 1)?;
                match self.next() {
                    Some(Token {
                        kind: TokenKind::RParen,
                        ..
                    }) => Ok(inner),
                    Some(other) => Err(FormulaError::failed(format!(
                        "expected ')' but found {} at offset {}",
                        describe(&other.kind),
                        other.offset
                    ))),
                    None => Err(FormulaError::failed(format!(
                        "unclosed '(' at offset {}",
                        tok.offset
                    ))),
                }
            }
            other => Err(FormulaError::failed(format!(
                "unexpected {} at offset {}",
                describe(other),
                tok.offset
            ))),
        }
    }
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Number(v) => format!("number {}", v),
        TokenKind::Ident(name) => format!("identifier '{}'", name),
        TokenKind::Plus => "'+'".into(),
        TokenKind::Minus => "'-'".into(),
        TokenKind::Star => "'*'".into(),
        TokenKind::Slash => "'/'".into(),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::lexer::tokenize;

    fn parse_str(src: &str) -> Result<Expr, FormulaError> {
        parse(&tokenize(src)?)
    }

    fn num(v: f64) -> Box<Expr> {
        Box::new(Expr::Number(v))
    }

    #[test]
    fn test_precedence() {
        let expr = parse_str("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Add,
                lhs: num(1.0),
                rhs: Box::new(Expr::Binary {
                    op: BinaryOp::Mul,
                    lhs: num(2.0),
                    rhs: num(3.0),
                }),
            }
        );
    }

    #[test]
    fn test_left_associative() {
        let expr = parse_str("8 / 4 / 2").unwrap();
        assert_eq!(
            expr,
            Expr::Binary {
                op: BinaryOp::Div,
                lhs: Box::new(Expr::Binary {
                    op: BinaryOp::Div,
                    lhs: num(8.0),
                    rhs: num(4.0),
                }),
                rhs: num(2.0),
            }
        );
    }

    #[test]
    fn test_reference_classification() {
        let cases = [
            ("v1", "v1", RefKind::Raw),
            ("v1_Val", "v1", RefKind::Raw),
            ("V1_VAL", "v1", RefKind::Raw),
            ("v1_Weight", "v1", RefKind::Weight),
            ("v10_STND", "v10", RefKind::Standardized),
            ("_val", "_val", RefKind::Raw),
        ];
        for (name, id, kind) in cases {
            let r = Reference::classify(name);
            assert_eq!(r.id, id, "{name}");
            assert_eq!(r.kind, kind, "{name}");
            assert_eq!(r.name, name);
        }
    }

    #[test]
    fn test_references_in_order() {
        let expr = parse_str("-(v2_stnd * v2_weight) + v10").unwrap();
        let mut names = Vec::new();
        expr.for_each_reference(&mut |r| names.push(r.name.clone()));
        assert_eq!(names, vec!["v2_stnd", "v2_weight", "v10"]);
    }

    #[test]
    fn test_malformed_syntax() {
        for src in ["", "1 +", "(1 + 2", "1 + 2)", "* 3", "v1 v2", "2 ** 3", "()"] {
            assert!(
                matches!(parse_str(src), Err(FormulaError::EvaluationFailed { .. })),
                "{src:?} should fail to parse"
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 10), ")".repeat(MAX_DEPTH + 10));
        assert!(matches!(
            parse_str(&deep),
            Err(FormulaError::EvaluationFailed { .. })
        ));
        let shallow = format!("{}1{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(parse_str(&shallow).unwrap(), Expr::Number(1.0));
    }

    #[test]
    fn test_token_limit() {
        let long = vec!["1"; 100_000].join("+");
        let err = parse_str(&long).unwrap_err();
        assert_eq!(err.kind(), "EvaluationFailed");
        assert!(err.to_string().contains("limit"));

        // 1024 terms and 1023 operators fit.
        let fits = vec!["1"; 1024].join("+");
        assert!(parse_str(&fits).is_ok());
        let over = vec!["1"; 1025].join("+");
        assert!(parse_str(&over).is_err());
    }
}
