//! # edm-csdl
//!
//! Streaming CSDL deserializer for OData metadata documents.
//!
//! Documents are first turned into a flat stream of tokens (by the XML or
//! JSON tokenizer, or an in-memory buffer) and then walked by one parser per
//! construct. Each parser recognizes a fixed field vocabulary that depends
//! on the protocol version chosen for the parse; everything else is skipped.

pub mod annotation;
pub mod config;
pub mod container;
pub mod de;
pub mod document;
pub mod json;
pub mod operation;
pub mod parser;
pub mod schema;
pub mod structural;
pub mod token;
pub mod vocabulary;
pub mod writer;
pub mod xml;
pub mod xml_writer;

pub use config::{CsdlConfig, InputFormat};
pub use de::{CsdlDeserialize, Deserializer};
pub use json::JsonTokenizer;
pub use parser::{MetadataParser, parse_root_document};
pub use token::{Token, TokenBuffer, TokenKind, TokenSource};
pub use vocabulary::{Construct, vocabulary};
pub use writer::{TokenWriter, to_tokens};
pub use xml::XmlTokenizer;
pub use xml_writer::{XmlWriter, to_xml_string};

use thiserror::Error;

/// Errors that can occur while tokenizing or deserializing CSDL
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unexpected end of input in {path} at offset {offset}")]
    UnexpectedEnd { path: String, offset: usize },

    #[error("Unexpected token in {path} at offset {offset}: expected {expected}, found {found}")]
    UnexpectedToken {
        path: String,
        offset: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid value '{value}' for {field} in {path} at offset {offset}: {message}")]
    InvalidValue {
        path: String,
        field: String,
        value: String,
        offset: usize,
        message: String,
    },

    #[error("Missing required element {element} in {path}")]
    MissingElement { path: String, element: String },

    #[error("Maximum nesting depth {max_depth} exceeded in {path} at offset {offset}")]
    DepthExceeded {
        path: String,
        offset: usize,
        max_depth: usize,
    },

    #[error("XML error at offset {offset}: {source}")]
    Xml {
        offset: usize,
        #[source]
        source: quick_xml::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model error: {0}")]
    Model(#[from] edm_model::Error),
}

impl Error {
    /// Build an XML error at the given byte offset.
    pub fn xml(offset: usize, source: impl Into<quick_xml::Error>) -> Self {
        Self::Xml {
            offset,
            source: source.into(),
        }
    }

    /// Byte offset (or token index) the error refers to, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Error::UnexpectedEnd { offset, .. }
            | Error::UnexpectedToken { offset, .. }
            | Error::InvalidValue { offset, .. }
            | Error::DepthExceeded { offset, .. }
            | Error::Xml { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}

/// Result type for CSDL operations
pub type Result<T> = std::result::Result<T, Error>;
