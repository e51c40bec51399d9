//! Read-only queries over a tokenized buffer.
//!
//! Children are found by linear scan over the arena; there is no stored
//! sibling list.  Command payloads are small, so the scans stay short.

use super::tokenizer::{Token, TokenKind};

/// Borrowed view of a successfully parsed buffer.
#[derive(Debug, Clone, Copy)]
pub struct JsonDocument<'a> {
    src: &'a [u8],
    tokens: &'a [Token],
}

impl<'a> JsonDocument<'a> {
    /// `tokens` must be exactly the prefix returned by [`parse`](super::parse).
    pub fn new(src: &'a [u8], tokens: &'a [Token]) -> Self {
        Self { src, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, index: usize) -> Option<&'a Token> {
        self.tokens.get(index)
    }

    pub fn kind(&self, index: usize) -> Option<TokenKind> {
        self.token(index).map(|t| t.kind)
    }

    pub fn is_kind(&self, index: usize, kind: TokenKind) -> bool {
        self.kind(index) == Some(kind)
    }

    /// Raw bytes of a token; empty for unknown or unclosed tokens.
    pub fn text(&self, index: usize) -> &'a [u8] {
        self.token(index)
            .and_then(|t| self.src.get(t.start..t.end?))
            .unwrap_or(&[])
    }

    /// Index of the key named `key` directly inside `parent`.
    ///
    /// Scans forward from `parent + 1` and stops at the first token whose
    /// end reaches the parent's end, i.e. the first token past its subtree.
    pub fn find_key_in(&self, key: &str, parent: usize) -> Option<usize> {
        let parent_end = self.token(parent)?.end?;
        for (i, t) in self.tokens.iter().enumerate().skip(parent + 1) {
            let end = t.end?;
            if end >= parent_end {
                break;
            }
            if t.kind == TokenKind::Key && t.parent == Some(parent) && self.text(i) == key.as_bytes()
            {
                return Some(i);
            }
        }
        None
    }

    /// Next direct child of `parent` after `after` (from the start when `None`).
    ///
    /// Only keys, objects and arrays have children.
    pub fn first_child_of(&self, parent: usize, after: Option<usize>) -> Option<usize> {
        match self.kind(parent)? {
            TokenKind::Key | TokenKind::Object | TokenKind::Array => {}
            TokenKind::String | TokenKind::Primitive => return None,
        }
        let from = after.map_or(0, |a| a + 1);
        self.tokens
            .iter()
            .enumerate()
            .skip(from)
            .find(|(_, t)| t.parent == Some(parent))
            .map(|(i, _)| i)
    }

    /// All direct children of `parent`, in document order.
    pub fn children(&self, parent: usize) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.first_child_of(parent, None), move |&i| {
            self.first_child_of(parent, Some(i))
        })
    }

    /// Value token stored under `key` in object `parent`.
    pub fn value_of(&self, key: &str, parent: usize) -> Option<usize> {
        let k = self.find_key_in(key, parent)?;
        self.first_child_of(k, Some(k))
    }

    /// Byte-exact comparison of a token's span with `literal`.
    pub fn value_equals(&self, index: usize, literal: &str) -> bool {
        self.token(index).is_some() && self.text(index) == literal.as_bytes()
    }

    /// Primitive that starts like a JSON number.
    pub fn is_number(&self, index: usize) -> bool {
        self.is_kind(index, TokenKind::Primitive)
            && matches!(self.text(index).first(), Some(b'-' | b'0'..=b'9'))
    }

    /// Leading-integer coercion of a primitive; `-1` for anything else.
    ///
    /// Reads an optional sign and the run of digits that follows,
    /// saturating at the `i32` range.  `"1.9"` yields 1, `"true"` yields 0.
    pub fn as_integer(&self, index: usize) -> i32 {
        if !self.is_kind(index, TokenKind::Primitive) {
            return -1;
        }
        let bytes = self.text(index);
        let (negative, digits) = match bytes.split_first() {
            Some((b'-', rest)) => (true, rest),
            Some((b'+', rest)) => (false, rest),
            _ => (false, bytes),
        };
        let limit = i64::from(i32::MAX) + 1;
        let magnitude = digits
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .fold(0i64, |acc, &b| (acc * 10 + i64::from(b - b'0')).min(limit));
        let value = if negative { -magnitude } else { magnitude };
        value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
    }

    /// Leading-float coercion of a primitive; `-1.0` for anything else.
    pub fn as_float(&self, index: usize) -> f32 {
        if !self.is_kind(index, TokenKind::Primitive) {
            return -1.0;
        }
        let bytes = self.text(index);
        let numeric = bytes
            .iter()
            .take_while(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
            .count();
        core::str::from_utf8(&bytes[..numeric])
            .ok()
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.0)
    }

    /// `true` only for the primitive literal `true`.
    pub fn as_boolean(&self, index: usize) -> bool {
        self.is_kind(index, TokenKind::Primitive) && self.text(index) == b"true"
    }
}
