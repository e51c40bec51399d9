//! Allocation-free JSON reader for the command protocol.
//!
//! ```text
//!   bytes ──▶ tokenizer::parse ──▶ [Token; N] arena ──▶ JsonDocument
//!                                   (flat, parent-indexed)   (queries)
//! ```
//!
//! The tokenizer writes into a caller-owned token arena and never
//! recurses; the query layer is a read-only view over that arena.

pub mod query;
pub mod tokenizer;

pub use query::JsonDocument;
pub use tokenizer::{parse, Token, TokenKind};

/// Token arena size used by the command interpreter.
pub const MAX_TOKENS: usize = 128;
