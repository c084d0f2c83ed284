//! JSON tokenizer
//!
//! Objects map to objects and scalars to values. An array is spread over
//! its enclosing field: each element repeats the field name, which is the
//! same shape repeated XML child elements produce. Key order is preserved.

use crate::token::{Token, TokenKind, TokenSource};
use crate::Result;
use serde_json::Value;
use std::collections::VecDeque;
use std::io::Read;

/// Tokenizer over a fully parsed JSON value. Offsets are token indexes.
#[derive(Debug)]
pub struct JsonTokenizer {
    tokens: VecDeque<Token>,
}

impl JsonTokenizer {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value: Value = serde_json::from_reader(reader)?;
        Ok(Self::from_value(&value))
    }

    pub fn parse_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(value: &Value) -> Self {
        let mut tokenizer = Self {
            tokens: VecDeque::new(),
        };
        tokenizer.emit_value(value);
        tokenizer
    }

    fn push(&mut self, kind: TokenKind) {
        let offset = self.tokens.len();
        self.tokens.push_back(Token::new(kind, offset));
    }

    fn emit_field(&mut self, name: &str, value: &Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.emit_field(name, item);
                }
            }
            other => {
                self.push(TokenKind::FieldName(name.to_string()));
                self.emit_value(other);
            }
        }
    }

    fn emit_value(&mut self, value: &Value) {
        match value {
            Value::Object(map) => {
                self.push(TokenKind::StartObject);
                for (name, child) in map {
                    self.emit_field(name, child);
                }
                self.push(TokenKind::EndObject);
            }
            Value::Array(items) => {
                // A bare array has no field name to repeat; keep its elements in order
                for item in items {
                    self.emit_value(item);
                }
            }
            Value::String(s) => self.push(TokenKind::Value(s.clone())),
            Value::Number(n) => self.push(TokenKind::Value(n.to_string())),
            Value::Bool(b) => self.push(TokenKind::Value(b.to_string())),
            Value::Null => self.push(TokenKind::Value(String::new())),
        }
    }
}

impl TokenSource for JsonTokenizer {
    fn next_token(&mut self) -> Result<Option<Token>> {
        Ok(self.tokens.pop_front())
    }
}
