//! Single-pass JSON tokenizer.
//!
//! Converts a byte buffer into a flat, parent-indexed token arena:
//!
//! ```text
//!   {"type":"PUMP","run_pumps":[{"id":1,"for":40}]}
//!
//!   idx  kind       parent  children
//!   0    Object     -       2
//!   1    Key        0       1          "type"
//!   2    String     1       0          "PUMP"
//!   3    Key        0       1          "run_pumps"
//!   4    Array      3       1
//!   5    Object     4       2
//!   6    Key        5       1          "id"
//!   7    Primitive  6       0          1
//!   ...
//! ```
//!
//! One forward pass, no recursion, no allocation.  The only backward
//! movement is the parent walk on a closing bracket, bounded by the
//! nesting depth.

use crate::error::JsonError;

/// Lexical class of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Object,
    Array,
    /// A string in value position.
    String,
    /// A string in key position inside an object.
    Key,
    /// Number, `true`, `false` or `null`.
    Primitive,
}

impl TokenKind {
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Object | Self::Array)
    }
}

/// One lexical unit with its byte span and tree linkage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// First byte of the token.  Strings and keys exclude the quotes.
    pub start: usize,
    /// One past the last byte.  `None` while a container is still open.
    pub end: Option<usize>,
    /// Index of the enclosing container or owning key.
    pub parent: Option<usize>,
    /// Number of direct children.
    pub child_count: usize,
}

impl Token {
    pub const EMPTY: Self = Self {
        kind: TokenKind::Primitive,
        start: 0,
        end: None,
        parent: None,
        child_count: 0,
    };
}

impl Default for Token {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Tokenize `src` into `tokens`, returning the number of tokens written.
///
/// Scanning stops at the first NUL byte.  Index 0 is the root; a buffer
/// may hold only one root value.
pub fn parse(src: &[u8], tokens: &mut [Token]) -> Result<usize, JsonError> {
    let len = src.iter().position(|&b| b == 0).unwrap_or(src.len());
    let mut parser = Parser {
        tokens,
        next: 0,
        sup: None,
        expect_key: false,
    };
    parser.run(&src[..len])
}

struct Parser<'t> {
    tokens: &'t mut [Token],
    /// Next free slot in the arena.
    next: usize,
    /// Innermost open container, or the key awaiting its value.
    sup: Option<usize>,
    /// The next string inside an object is a key.
    expect_key: bool,
}

impl Parser<'_> {
    fn run(&mut self, src: &[u8]) -> Result<usize, JsonError> {
        let mut pos = 0;
        while pos < src.len() {
            match src[pos] {
                b'{' => self.open(TokenKind::Object, pos)?,
                b'[' => self.open(TokenKind::Array, pos)?,
                b'}' => self.close(TokenKind::Object, pos)?,
                b']' => self.close(TokenKind::Array, pos)?,
                b'"' => pos = self.string(src, pos)?,
                b':' => self.colon()?,
                b',' => self.comma()?,
                b'\t' | b'\r' | b'\n' | b' ' => {}
                b'-' | b'0'..=b'9' | b't' | b'f' | b'n' => pos = self.primitive(src, pos)?,
                _ => return Err(JsonError::Invalid),
            }
            pos += 1;
        }

        if self.tokens[..self.next].iter().any(|t| t.end.is_none()) {
            return Err(JsonError::Incomplete);
        }
        Ok(self.next)
    }

    fn sup_kind(&self) -> Option<TokenKind> {
        self.sup.map(|s| self.tokens[s].kind)
    }

    /// Validate placement, claim a slot and link it under `sup`.
    ///
    /// Nothing is written unless the token is both legal here and fits.
    fn attach(
        &mut self,
        kind: TokenKind,
        start: usize,
        end: Option<usize>,
    ) -> Result<usize, JsonError> {
        match self.sup {
            None if self.next > 0 => return Err(JsonError::Invalid),
            None => {}
            Some(s) => {
                let sup = &self.tokens[s];
                let allowed = match sup.kind {
                    TokenKind::Object => kind == TokenKind::Key,
                    TokenKind::Array => kind != TokenKind::Key,
                    TokenKind::Key => sup.child_count == 0 && kind != TokenKind::Key,
                    TokenKind::String | TokenKind::Primitive => false,
                };
                if !allowed {
                    return Err(JsonError::Invalid);
                }
            }
        }

        let idx = self.next;
        let slot = self.tokens.get_mut(idx).ok_or(JsonError::OutOfTokens)?;
        *slot = Token {
            kind,
            start,
            end,
            parent: self.sup,
            child_count: 0,
        };
        self.next += 1;
        if let Some(s) = self.sup {
            self.tokens[s].child_count += 1;
        }
        Ok(idx)
    }

    fn open(&mut self, kind: TokenKind, pos: usize) -> Result<(), JsonError> {
        let idx = self.attach(kind, pos, None)?;
        self.sup = Some(idx);
        self.expect_key = kind == TokenKind::Object;
        Ok(())
    }

    fn close(&mut self, kind: TokenKind, pos: usize) -> Result<(), JsonError> {
        let mut cursor = self.next.checked_sub(1);
        while let Some(i) = cursor {
            let token = &mut self.tokens[i];
            if token.kind.is_container() && token.end.is_none() {
                if token.kind != kind {
                    return Err(JsonError::Invalid);
                }
                token.end = Some(pos + 1);
                self.sup = token.parent;
                self.expect_key = false;
                return Ok(());
            }
            cursor = token.parent;
        }
        // Closing bracket with nothing open.
        Err(JsonError::Invalid)
    }

    fn colon(&mut self) -> Result<(), JsonError> {
        let last = self.next.checked_sub(1).ok_or(JsonError::Invalid)?;
        let token = &self.tokens[last];
        if token.kind != TokenKind::Key || token.parent != self.sup {
            return Err(JsonError::Invalid);
        }
        self.sup = Some(last);
        self.expect_key = false;
        Ok(())
    }

    fn comma(&mut self) -> Result<(), JsonError> {
        let s = self.sup.ok_or(JsonError::Invalid)?;
        if !self.tokens[s].kind.is_container() {
            self.sup = self.tokens[s].parent;
        }
        self.expect_key = self.sup_kind() == Some(TokenKind::Object);
        Ok(())
    }

    /// Scan a quoted string starting at `pos`; returns the closing quote offset.
    fn string(&mut self, src: &[u8], pos: usize) -> Result<usize, JsonError> {
        let start = pos + 1;
        let mut i = start;
        loop {
            let Some(&c) = src.get(i) else {
                return Err(JsonError::Incomplete);
            };
            match c {
                b'"' => break,
                b'\\' => match src.get(i + 1) {
                    None => return Err(JsonError::Incomplete),
                    Some(b'"' | b'/' | b'\\' | b'b' | b'f' | b'r' | b'n' | b't') => i += 2,
                    Some(b'u') => {
                        for k in 0..4 {
                            match src.get(i + 2 + k) {
                                None => return Err(JsonError::Incomplete),
                                Some(h) if h.is_ascii_hexdigit() => {}
                                Some(_) => return Err(JsonError::Invalid),
                            }
                        }
                        i += 6;
                    }
                    Some(_) => return Err(JsonError::Invalid),
                },
                0x00..=0x1F => return Err(JsonError::Invalid),
                _ => i += 1,
            }
        }

        let kind = if self.expect_key && self.sup_kind() == Some(TokenKind::Object) {
            TokenKind::Key
        } else {
            TokenKind::String
        };
        self.attach(kind, start, Some(i))?;
        if kind == TokenKind::Key {
            self.expect_key = false;
        }
        Ok(i)
    }

    /// Scan a bare primitive starting at `pos`; returns its last byte offset
    /// so the delimiter is handled by the main loop.
    fn primitive(&mut self, src: &[u8], pos: usize) -> Result<usize, JsonError> {
        let mut i = pos;
        while let Some(&c) = src.get(i) {
            match c {
                b'\t' | b'\r' | b'\n' | b' ' | b',' | b']' | b'}' | b':' => {
                    self.attach(TokenKind::Primitive, pos, Some(i))?;
                    return Ok(i - 1);
                }
                0x20..=0x7E => i += 1,
                _ => return Err(JsonError::Invalid),
            }
        }
        Err(JsonError::Incomplete)
    }
}
