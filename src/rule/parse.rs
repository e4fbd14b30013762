//! Reader for MCNP-style rule text.
//!
//! ```text
//! expr   := term (':' term)*
//! term   := factor factor*
//! factor := NUMBER | '(' expr? ')' | '#' '(' expr? ')'
//! ```
//!
//! Numbers are signed integers; the caller's resolver maps each one to a
//! signed global surface number.

use crate::error::{Result, RuleError};

use super::RuleNode;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(i32),
    Colon,
    Open,
    Close,
    Hash,
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let c = bytes[pos];
        match c {
            b' ' | b'\t' | b'\n' | b'\r' => pos += 1,
            b':' => {
                tokens.push((Token::Colon, pos));
                pos += 1;
            }
            b'(' => {
                tokens.push((Token::Open, pos));
                pos += 1;
            }
            b')' => {
                tokens.push((Token::Close, pos));
                pos += 1;
            }
            b'#' => {
                tokens.push((Token::Hash, pos));
                pos += 1;
            }
            b'-' | b'+' | b'0'..=b'9' => {
                let start = pos;
                pos += 1;
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                let word = &text[start..pos];
                // i32::MIN has no negation
                let value = word
                    .parse::<i32>()
                    .ok()
                    .filter(|&v| v != i32::MIN)
                    .ok_or_else(|| RuleError::BadToken {
                        token: word.to_string(),
                        position: start,
                    })?;
                tokens.push((Token::Number(value), start));
            }
            _ => {
                let end = text[pos..]
                    .find(|ch: char| ch.is_whitespace() || "():#".contains(ch))
                    .map_or(text.len(), |off| pos + off);
                return Err(RuleError::BadToken {
                    token: text[pos..end].to_string(),
                    position: pos,
                }
                .into());
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a, F> {
    tokens: &'a [(Token, usize)],
    pos: usize,
    resolve: &'a mut F,
}

impl<F> Parser<'_, F>
where
    F: FnMut(i32) -> Result<i32>,
{
    fn peek(&self) -> Option<(Token, usize)> {
        self.tokens.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<RuleNode> {
        let mut alternatives = Vec::new();
        match self.term()? {
            Some(t) => alternatives.push(t),
            None => {
                if let Some((Token::Colon, p)) = self.peek() {
                    return Err(RuleError::DanglingOperator { op: ':', position: p }.into());
                }
                // Empty expression: all space
                return Ok(RuleNode::Intersection(Vec::new()));
            }
        }
        while let Some((Token::Colon, colon_pos)) = self.peek() {
            self.pos += 1;
            match self.term()? {
                Some(t) => alternatives.push(t),
                None => {
                    return Err(RuleError::DanglingOperator {
                        op: ':',
                        position: colon_pos,
                    }
                    .into())
                }
            }
        }
        if alternatives.len() == 1 {
            Ok(alternatives.remove(0))
        } else {
            Ok(RuleNode::Union(alternatives))
        }
    }

    fn term(&mut self) -> Result<Option<RuleNode>> {
        let mut factors = Vec::new();
        while let Some(f) = self.factor()? {
            factors.push(f);
        }
        Ok(match factors.len() {
            0 => None,
            1 => factors.pop(),
            _ => Some(RuleNode::Intersection(factors)),
        })
    }

    fn factor(&mut self) -> Result<Option<RuleNode>> {
        let Some((token, at)) = self.peek() else {
            return Ok(None);
        };
        match token {
            Token::Number(n) => {
                self.pos += 1;
                Ok(Some(RuleNode::Surf((self.resolve)(n)?)))
            }
            Token::Open => {
                self.pos += 1;
                self.group(at).map(Some)
            }
            Token::Hash => {
                self.pos += 1;
                match self.peek() {
                    Some((Token::Open, open_at)) => {
                        self.pos += 1;
                        Ok(Some(self.group(open_at)?.complement()))
                    }
                    _ => Err(RuleError::DanglingOperator { op: '#', position: at }.into()),
                }
            }
            Token::Colon | Token::Close => Ok(None),
        }
    }

    fn group(&mut self, open_at: usize) -> Result<RuleNode> {
        let inner = self.expr()?;
        match self.peek() {
            Some((Token::Close, _)) => {
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(RuleError::Unbalanced { position: open_at }.into()),
        }
    }
}

/// Parses `text`, passing every number through `resolve`.
pub(super) fn parse_with<F>(text: &str, resolve: &mut F) -> Result<RuleNode>
where
    F: FnMut(i32) -> Result<i32>,
{
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        resolve,
    };
    let node = parser.expr()?;
    if let Some((_, p)) = parser.peek() {
        // Only a stray ')' can stop the top-level expression early
        return Err(RuleError::Unbalanced { position: p }.into());
    }
    Ok(node)
}
