#![warn(clippy::all)]

//! # edm-model
//!
//! Versioned Entity Data Model (EDM) structures for OData metadata.
//!
//! This crate provides the in-memory model produced from a CSDL document:
//! schemas, entity/complex/enum types, containers and their members, for
//! both the V3 and V4 protocol revisions. It also hosts the primitive type
//! registry and the read-only lookups (by qualified name) that consuming
//! subsystems use to resolve references between model nodes.

/// Annotations, annotation groups and opaque annotation expressions.
pub mod annotation;
/// Entity containers, entity sets, singletons and imports.
pub mod container;
/// Document root and data-services wrapper.
pub mod document;
/// Base-type chain resolution for structured types.
pub mod inheritance;
/// Qualified names and type references.
pub mod name;
/// Built-in primitive type catalog.
pub mod primitive;
/// Version-keyed registry of parsed documents and their link indexes.
pub mod registry;
/// Schema node and its V3/V4 exclusive members.
pub mod schema;
/// Structural types, properties, keys and enumerations.
pub mod types;
/// Protocol revision selector.
pub mod version;

pub use annotation::{Annotation, AnnotationExpression, AnnotationsGroup, RawValue};
pub use container::{
    ActionImport, AssociationSet, EntityContainer, EntitySet, FunctionImport,
    NavigationPropertyBinding, Singleton,
};
pub use document::{
    DataServices, Include, IncludeAnnotations, Reference, ResolvedType, RootDocument,
};
pub use name::{QualifiedName, TypeRef};
pub use primitive::{EdmSimpleType, HostType, PrimitiveValue};
pub use registry::{EntitySetLinks, LinkIndex, MetadataRegistry, NavigationLink};
pub use schema::{Action, Association, Function, Schema, TypeDefinition, Using, ValueTerm};
pub use types::{
    ComplexType, ConcurrencyMode, ContentKind, EntityKey, EntityType, EnumMember, EnumType,
    MaxLength, NavigationProperty, Property, PropertyRef, Scale, StoreGeneratedPattern,
    StructuredType,
};
pub use version::ProtocolVersion;

use thiserror::Error;

/// Errors raised when resolving names and types against the model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid primitive type: {0}")]
    InvalidPrimitiveType(String),

    #[error("Primitive type {name} is not supported under protocol {version}")]
    UnsupportedInVersion {
        name: String,
        version: ProtocolVersion,
    },

    #[error("Unresolved type reference: {0}")]
    UnresolvedType(String),

    #[error("Inheritance error: {0}")]
    Inheritance(String),

    #[error("No document registered for protocol {0}")]
    NotRegistered(ProtocolVersion),

    #[error("Invalid value '{value}' for facet {facet}")]
    InvalidFacet { facet: String, value: String },

    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },
}

impl Error {
    /// Build an invalid-primitive-type error for a type name or host type.
    pub fn invalid_primitive(name: impl Into<String>) -> Self {
        Self::InvalidPrimitiveType(name.into())
    }

    /// Build an unresolved-type error for a qualified name.
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::UnresolvedType(name.into())
    }

    /// Build an invalid-facet error for a facet value that does not parse.
    pub fn invalid_facet(facet: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidFacet {
            facet: facet.into(),
            value: value.into(),
        }
    }

    /// Build an invalid-name error with the offending input and reason.
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for model operations.
pub type Result<T> = std::result::Result<T, Error>;
