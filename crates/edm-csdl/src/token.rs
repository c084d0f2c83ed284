//! Token model shared by every tokenizer and parser
//!
//! A document is seen as nested objects of named fields. Field values are
//! either scalars or objects; repeated children simply repeat the field name.

use crate::Result;
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    StartObject,
    EndObject,
    FieldName(String),
    Value(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::StartObject => write!(f, "start of object"),
            TokenKind::EndObject => write!(f, "end of object"),
            TokenKind::FieldName(name) => write!(f, "field '{}'", name),
            TokenKind::Value(value) => write!(f, "value '{}'", value),
        }
    }
}

/// A token and where it came from in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset for text sources, token index for buffers
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

/// Anything that yields tokens one at a time.
///
/// `Ok(None)` means the source is exhausted. Parsers treat exhaustion
/// before the closing token of a construct as a structural error.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>>;
}

/// In-memory token sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenBuffer {
    tokens: VecDeque<Token>,
    next_offset: usize,
}

impl TokenBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a token; its offset is its index in the buffer.
    pub fn push(&mut self, kind: TokenKind) {
        let offset = self.next_offset;
        self.next_offset += 1;
        self.tokens.push_back(Token::new(kind, offset));
    }

    pub fn start_object(&mut self) {
        self.push(TokenKind::StartObject);
    }

    pub fn end_object(&mut self) {
        self.push(TokenKind::EndObject);
    }

    pub fn field(&mut self, name: impl Into<String>) {
        self.push(TokenKind::FieldName(name.into()));
    }

    pub fn value(&mut self, value: impl Into<String>) {
        self.push(TokenKind::Value(value.into()));
    }

    /// Field followed by a scalar value.
    pub fn scalar(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.field(name);
        self.value(value);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// Drop everything after the first `len` remaining tokens.
    pub fn truncate(&mut self, len: usize) {
        self.tokens.truncate(len);
    }

    /// Drain another source completely into a buffer.
    pub fn collect_from(source: &mut dyn TokenSource) -> Result<Self> {
        let mut buffer = Self::new();
        while let Some(token) = source.next_token()? {
            buffer.next_offset = token.offset + 1;
            buffer.tokens.push_back(token);
        }
        Ok(buffer)
    }
}

impl TokenSource for TokenBuffer {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.tokens.pop_front())
    }
}

impl FromIterator<TokenKind> for TokenBuffer {
    fn from_iter<I: IntoIterator<Item = TokenKind>>(iter: I) -> Self {
        let mut buffer = Self::new();
        for kind in iter {
            buffer.push(kind);
        }
        buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_assigns_offsets_in_order() {
        let mut buffer = TokenBuffer::new();
        buffer.start_object();
        buffer.scalar("Name", "Car");
        buffer.end_object();
        assert_eq!(buffer.len(), 4);

        let offsets: Vec<_> = buffer.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3]);

        let first = buffer.next_token().unwrap().unwrap();
        assert_eq!(first.kind, TokenKind::StartObject);
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn test_buffer_from_kinds() {
        let mut buffer: TokenBuffer = vec![
            TokenKind::StartObject,
            TokenKind::FieldName("Key".into()),
            TokenKind::StartObject,
            TokenKind::EndObject,
            TokenKind::EndObject,
        ]
        .into_iter()
        .collect();

        let mut count = 0;
        while buffer.next_token().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
        assert!(buffer.next_token().unwrap().is_none());
    }
}
