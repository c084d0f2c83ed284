//! Annotations and annotation groups
//!
//! Annotation expressions are not interpreted here. Whatever the document
//! carries besides the term and qualifier is kept as a raw field tree so
//! consumers that understand vocabularies can evaluate it themselves.

use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};

/// Uninterpreted field tree captured from the token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawValue {
    Scalar(String),
    /// Fields in document order; names may repeat.
    Object(Vec<(String, RawValue)>),
}

impl RawValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            RawValue::Scalar(s) => Some(s),
            RawValue::Object(_) => None,
        }
    }

    /// First field with the given name, if this is an object.
    pub fn field(&self, name: &str) -> Option<&RawValue> {
        match self {
            RawValue::Object(fields) => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            RawValue::Scalar(_) => None,
        }
    }
}

/// A constant or dynamic expression, e.g. `String`, `Path`, `Record`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationExpression {
    /// Expression kind as named in the document
    pub kind: String,
    pub value: RawValue,
}

/// A single term application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub term: String,
    pub qualifier: Option<String>,
    pub expression: Option<AnnotationExpression>,
}

impl Annotation {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }
}

/// V3 members of an annotation group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3AnnotationsGroup {
    pub value_annotations: Vec<Annotation>,
    pub type_annotations: Vec<Annotation>,
}

/// V4 members of an annotation group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4AnnotationsGroup {
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationsGroupExt {
    V3(V3AnnotationsGroup),
    V4(V4AnnotationsGroup),
}

/// An `Annotations` element: annotations applied to an external target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationsGroup {
    pub target: String,
    pub qualifier: Option<String>,
    pub ext: AnnotationsGroupExt,
}

impl AnnotationsGroup {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => AnnotationsGroupExt::V3(V3AnnotationsGroup::default()),
            ProtocolVersion::V4 => AnnotationsGroupExt::V4(V4AnnotationsGroup::default()),
        };
        Self {
            target: String::new(),
            qualifier: None,
            ext,
        }
    }

    /// Every annotation in the group regardless of revision.
    pub fn all_annotations(&self) -> Vec<&Annotation> {
        match &self.ext {
            AnnotationsGroupExt::V3(group) => group
                .value_annotations
                .iter()
                .chain(&group.type_annotations)
                .collect(),
            AnnotationsGroupExt::V4(group) => group.annotations.iter().collect(),
        }
    }
}
