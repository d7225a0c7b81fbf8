//! Tokenizer for payoff formulas.
//!
//! Accepted characters: ASCII digits, `.`, `+ - * /`, parentheses, whitespace, and
//! identifier characters (`[A-Za-z_][A-Za-z0-9_]*`). Anything else is rejected
//! with [`FormulaError::InvalidExpression`] before parsing starts.

use crate::error::FormulaError;

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

/// A token and its byte offset in the source formula.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let kind = match c {
            b' ' | b'\t' | b'\n' | b'\r' => {
                i += 1;
                continue;
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                let text = &src[start..i];
                let value: f64 = text.parse().map_err(|_| {
                    FormulaError::failed(format!("malformed number '{}' at offset {}", text, start))
                })?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    offset: start,
                });
                continue;
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(src[start..i].to_string()),
                    offset: start,
                });
                continue;
            }
            _ => {
                // Report the full (possibly multi-byte) character.
                let ch = src[start..].chars().next().unwrap_or('?');
                return Err(FormulaError::invalid(format!(
                    "disallowed character '{}' at offset {}",
                    ch, start
                )));
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
        i += 1;
    }

    Ok(tokens)
}
