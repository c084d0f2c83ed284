//! Streaming deserialization engine
//!
//! Every construct parser follows the same loop: consume the opening token,
//! branch on each field name, read a scalar or recurse into a child parser,
//! and stop at the closing token. Unrecognized fields are skipped whole.
//! The protocol version is fixed when the deserializer is created and is
//! visible to every parser below it.

use crate::token::{Token, TokenKind, TokenSource};
use crate::{Error, Result};
use edm_model::{ProtocolVersion, RawValue};
use std::fmt::Display;
use std::str::FromStr;
use tracing::trace;

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// A node that can be built from a token stream.
pub trait CsdlDeserialize: Sized {
    /// Construct name as it appears in error paths
    const CONSTRUCT: &'static str;

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self>;
}

/// Reads one field value into the node being built.
pub type FieldHandler<T> = fn(&mut Deserializer<'_>, &mut T) -> Result<()>;

/// Static field-name to handler table of one construct.
pub type FieldTable<T> = [(&'static str, FieldHandler<T>)];

/// Run the handler registered for `field`, if any.
/// Returns whether the field was recognized.
pub fn dispatch<T>(
    table: &FieldTable<T>,
    de: &mut Deserializer<'_>,
    field: &str,
    target: &mut T,
) -> Result<bool> {
    match table.iter().find(|(name, _)| *name == field) {
        Some((_, handler)) => {
            handler(de, target)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Field names a table recognizes, in table order.
pub fn field_names<T>(table: &FieldTable<T>) -> impl Iterator<Item = &'static str> + '_ {
    table.iter().map(|(name, _)| *name)
}

/// Cursor over a token source with one token of lookahead.
pub struct Deserializer<'s> {
    source: &'s mut dyn TokenSource,
    version: ProtocolVersion,
    max_depth: usize,
    path: Vec<&'static str>,
    peeked: Option<Token>,
    offset: usize,
}

impl<'s> Deserializer<'s> {
    pub fn new(source: &'s mut dyn TokenSource, version: ProtocolVersion) -> Self {
        Self {
            source,
            version,
            max_depth: DEFAULT_MAX_DEPTH,
            path: Vec::new(),
            peeked: None,
            offset: 0,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Offset of the last token consumed.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Constructs currently open, outermost first, e.g. `Edmx/DataServices/Schema`.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            "document".to_string()
        } else {
            self.path.join("/")
        }
    }

    /// Parse a child construct at the cursor.
    pub fn parse<T: CsdlDeserialize>(&mut self) -> Result<T> {
        trace!("Parsing {} under {}", T::CONSTRUCT, self.path());
        T::deserialize(self)
    }

    fn next(&mut self) -> Result<Token> {
        let token = match self.peeked.take() {
            Some(token) => Some(token),
            None => self.source.next_token()?,
        };
        match token {
            Some(token) => {
                self.offset = token.offset;
                Ok(token)
            }
            None => Err(Error::UnexpectedEnd {
                path: self.path(),
                offset: self.offset,
            }),
        }
    }

    fn peek(&mut self) -> Result<&Token> {
        if self.peeked.is_none() {
            self.peeked = self.source.next_token()?;
        }
        self.peeked.as_ref().ok_or_else(|| Error::UnexpectedEnd {
            path: self.path(),
            offset: self.offset,
        })
    }

    /// Whether the value at the cursor is an object rather than a scalar.
    pub fn peek_is_object(&mut self) -> Result<bool> {
        Ok(self.peek()?.kind == TokenKind::StartObject)
    }

    fn unexpected(&self, expected: &str, found: &TokenKind) -> Error {
        Error::UnexpectedToken {
            path: self.path(),
            offset: self.offset,
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    fn check_depth(&self, extra: usize) -> Result<()> {
        if self.path.len() + extra > self.max_depth {
            return Err(Error::DepthExceeded {
                path: self.path(),
                offset: self.offset,
                max_depth: self.max_depth,
            });
        }
        Ok(())
    }

    /// Consume one object, calling `on_field` for every field name.
    ///
    /// `on_field` reads the field's value and returns `true`, or returns
    /// `false` without touching the stream, in which case the value is skipped.
    pub fn read_object<F>(&mut self, construct: &'static str, mut on_field: F) -> Result<()>
    where
        F: FnMut(&mut Self, &str) -> Result<bool>,
    {
        self.path.push(construct);
        self.check_depth(0)?;

        let start = self.next()?;
        if start.kind != TokenKind::StartObject {
            return Err(self.unexpected("start of object", &start.kind));
        }

        loop {
            let token = self.next()?;
            match token.kind {
                TokenKind::EndObject => break,
                TokenKind::FieldName(name) => {
                    if !on_field(self, &name)? {
                        self.skip_value()?;
                    }
                }
                other => return Err(self.unexpected("field name or end of object", &other)),
            }
        }

        self.path.pop();
        Ok(())
    }

    pub fn read_string(&mut self) -> Result<String> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Value(value) => Ok(value),
            other => Err(self.unexpected("scalar value", &other)),
        }
    }

    /// `true` and `1` (any case) are true; anything else is false.
    pub fn read_bool(&mut self) -> Result<bool> {
        let value = self.read_string()?;
        let value = value.trim();
        Ok(value.eq_ignore_ascii_case("true") || value == "1")
    }

    /// Read a scalar and parse it, reporting the field on failure.
    pub fn read_parsed<T>(&mut self, field: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let value = self.read_string()?;
        value.trim().parse::<T>().map_err(|e| Error::InvalidValue {
            path: self.path(),
            field: field.to_string(),
            value: value.clone(),
            offset: self.offset,
            message: e.to_string(),
        })
    }

    /// Skip the value at the cursor, including nested objects.
    pub fn skip_value(&mut self) -> Result<()> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Value(_) => Ok(()),
            TokenKind::StartObject => {
                let mut depth = 1usize;
                while depth > 0 {
                    match self.next()?.kind {
                        TokenKind::StartObject => depth += 1,
                        TokenKind::EndObject => depth -= 1,
                        _ => {}
                    }
                }
                Ok(())
            }
            other => Err(self.unexpected("value", &other)),
        }
    }

    /// Capture the value at the cursor as an uninterpreted tree.
    pub fn capture_raw(&mut self) -> Result<RawValue> {
        self.capture_raw_at(1)
    }

    fn capture_raw_at(&mut self, depth: usize) -> Result<RawValue> {
        self.check_depth(depth)?;

        let token = self.next()?;
        match token.kind {
            TokenKind::Value(value) => Ok(RawValue::Scalar(value)),
            TokenKind::StartObject => {
                let mut fields = Vec::new();
                loop {
                    let token = self.next()?;
                    match token.kind {
                        TokenKind::EndObject => break,
                        TokenKind::FieldName(name) => {
                            let value = self.capture_raw_at(depth + 1)?;
                            fields.push((name, value));
                        }
                        other => {
                            return Err(self.unexpected("field name or end of object", &other));
                        }
                    }
                }
                Ok(RawValue::Object(fields))
            }
            other => Err(self.unexpected("value", &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenBuffer;

    #[derive(Debug, Default, PartialEq)]
    struct Sample {
        name: String,
        flag: bool,
        size: Option<u32>,
    }

    static SAMPLE_FIELDS: &FieldTable<Sample> = &[
        ("Name", |de, s| {
            s.name = de.read_string()?;
            Ok(())
        }),
        ("Flag", |de, s| {
            s.flag = de.read_bool()?;
            Ok(())
        }),
        ("Size", |de, s| {
            s.size = Some(de.read_parsed("Size")?);
            Ok(())
        }),
    ];

    impl CsdlDeserialize for Sample {
        const CONSTRUCT: &'static str = "Sample";

        fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
            let mut sample = Sample::default();
            de.read_object(Self::CONSTRUCT, |de, field| {
                dispatch(SAMPLE_FIELDS, de, field, &mut sample)
            })?;
            Ok(sample)
        }
    }

    fn sample_tokens() -> TokenBuffer {
        let mut buffer = TokenBuffer::new();
        buffer.start_object();
        buffer.scalar("Name", "Car");
        buffer.field("Extra");
        buffer.start_object();
        buffer.scalar("Deep", "1");
        buffer.field("Deeper");
        buffer.start_object();
        buffer.end_object();
        buffer.end_object();
        buffer.scalar("Flag", "TRUE");
        buffer.scalar("Size", "12");
        buffer.end_object();
        buffer
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let mut tokens = sample_tokens();
        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V3);
        let sample: Sample = de.parse().unwrap();
        assert_eq!(
            sample,
            Sample {
                name: "Car".to_string(),
                flag: true,
                size: Some(12),
            }
        );
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_truncated_stream_is_unexpected_end() {
        let mut tokens = sample_tokens();
        tokens.truncate(5);
        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V3);
        let err = de.parse::<Sample>().unwrap_err();
        assert!(matches!(err, Error::UnexpectedEnd { ref path, .. } if path == "Sample"));
    }

    #[test]
    fn test_bool_accepts_true_and_one_only() {
        let cases = [
            ("true", true),
            ("True", true),
            ("1", true),
            ("0", false),
            ("yes", false),
        ];
        for (text, expected) in cases {
            let mut tokens = TokenBuffer::new();
            tokens.value(text);
            let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
            assert_eq!(de.read_bool().unwrap(), expected, "{}", text);
        }
    }

    #[test]
    fn test_invalid_number_reports_field() {
        let mut tokens = TokenBuffer::new();
        tokens.start_object();
        tokens.scalar("Size", "large");
        tokens.end_object();
        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
        let err = de.parse::<Sample>().unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue { ref field, ref value, offset: 2, .. } if field == "Size" && value == "large"
        ));
    }

    #[test]
    fn test_scalar_where_object_expected() {
        let mut tokens = TokenBuffer::new();
        tokens.value("oops");
        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
        assert!(matches!(
            de.parse::<Sample>(),
            Err(Error::UnexpectedToken { .. })
        ));
    }

    #[test]
    fn test_capture_raw_respects_depth_limit() {
        let mut tokens = TokenBuffer::new();
        for _ in 0..4 {
            tokens.start_object();
            tokens.field("Nested");
        }
        tokens.value("x");
        for _ in 0..4 {
            tokens.end_object();
        }

        let mut shallow = tokens.clone();
        let mut de = Deserializer::new(&mut shallow, ProtocolVersion::V4).with_max_depth(3);
        assert!(matches!(
            de.capture_raw(),
            Err(Error::DepthExceeded { max_depth: 3, .. })
        ));

        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
        let raw = de.capture_raw().unwrap();
        let leaf = raw
            .field("Nested")
            .and_then(|v| v.field("Nested"))
            .and_then(|v| v.field("Nested"))
            .and_then(|v| v.field("Nested"))
            .and_then(RawValue::as_scalar);
        assert_eq!(leaf, Some("x"));
    }
}
