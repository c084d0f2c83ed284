//! Document root and data-services wrapper
//!
//! The root is what a parse returns. Besides holding the schemas it offers
//! the qualified-name lookups consumers use to follow references between
//! nodes, matching schemas by namespace or alias.

use crate::annotation::Annotation;
use crate::container::{EntityContainer, EntitySet};
use crate::name::{QualifiedName, TypeRef};
use crate::primitive::{EDM_NAMESPACE, EdmSimpleType};
use crate::schema::{Association, Schema, TypeDefinition};
use crate::types::{ComplexType, EntityType, EnumType};
use crate::version::ProtocolVersion;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// `Include` of an external reference: a namespace made visible under an alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Include {
    pub namespace: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeAnnotations {
    pub term_namespace: String,
    pub qualifier: Option<String>,
    pub target_namespace: Option<String>,
}

/// V4 reference to an external CSDL document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub uri: String,
    pub includes: Vec<Include>,
    pub include_annotations: Vec<IncludeAnnotations>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataServices {
    pub data_service_version: Option<String>,
    pub max_data_service_version: Option<String>,
    /// Schemas in document order
    pub schemas: Vec<Schema>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4RootDocument {
    pub references: Vec<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootDocumentExt {
    V3,
    V4(V4RootDocument),
}

/// Parsed `Edmx` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootDocument {
    /// Format version attribute as written (`1.0`, `4.0`, ...)
    pub version: String,
    pub data_services: DataServices,
    pub ext: RootDocumentExt,
}

/// A type reference resolved against the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResolvedType<'a> {
    Primitive(EdmSimpleType),
    Entity(&'a EntityType),
    Complex(&'a ComplexType),
    Enum(&'a EnumType),
    Definition(&'a TypeDefinition),
}

impl RootDocument {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => RootDocumentExt::V3,
            ProtocolVersion::V4 => RootDocumentExt::V4(V4RootDocument::default()),
        };
        Self {
            version: String::new(),
            data_services: DataServices::default(),
            ext,
        }
    }

    pub fn protocol_version(&self) -> ProtocolVersion {
        match self.ext {
            RootDocumentExt::V3 => ProtocolVersion::V3,
            RootDocumentExt::V4(_) => ProtocolVersion::V4,
        }
    }

    pub fn references(&self) -> &[Reference] {
        match &self.ext {
            RootDocumentExt::V3 => &[],
            RootDocumentExt::V4(v4) => &v4.references,
        }
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.data_services.schemas
    }

    /// First schema known by the given namespace or alias.
    pub fn schema(&self, namespace_or_alias: &str) -> Option<&Schema> {
        self.schemas()
            .iter()
            .find(|s| s.is_known_as(namespace_or_alias))
    }

    fn schemas_known_as<'a, 'q>(
        &'a self,
        qualifier: &'q str,
    ) -> impl Iterator<Item = &'a Schema> + use<'a, 'q> {
        self.schemas()
            .iter()
            .filter(move |s| s.is_known_as(qualifier))
    }

    /// Entity type by qualified name. Partial schemas sharing a namespace are
    /// searched in document order and the last declaration wins.
    pub fn entity_type(&self, qualified_name: &str) -> Option<&EntityType> {
        let qn = QualifiedName::parse(qualified_name).ok()?;
        self.schemas_known_as(&qn.namespace)
            .filter_map(|s| s.entity_type(&qn.name))
            .last()
    }

    pub fn complex_type(&self, qualified_name: &str) -> Option<&ComplexType> {
        let qn = QualifiedName::parse(qualified_name).ok()?;
        self.schemas_known_as(&qn.namespace)
            .filter_map(|s| s.complex_type(&qn.name))
            .last()
    }

    pub fn enum_type(&self, qualified_name: &str) -> Option<&EnumType> {
        let qn = QualifiedName::parse(qualified_name).ok()?;
        self.schemas_known_as(&qn.namespace)
            .filter_map(|s| s.enum_type(&qn.name))
            .last()
    }

    pub fn type_definition(&self, qualified_name: &str) -> Option<&TypeDefinition> {
        let qn = QualifiedName::parse(qualified_name).ok()?;
        self.schemas_known_as(&qn.namespace)
            .find_map(|s| s.type_definition(&qn.name))
    }

    pub fn association(&self, qualified_name: &str) -> Option<&Association> {
        let qn = QualifiedName::parse(qualified_name).ok()?;
        self.schemas_known_as(&qn.namespace)
            .find_map(|s| s.association(&qn.name))
    }

    /// Entity type by qualified name, failing when it is not declared.
    pub fn resolve_entity_type(&self, qualified_name: &str) -> Result<&EntityType> {
        self.entity_type(qualified_name)
            .ok_or_else(|| Error::unresolved(qualified_name))
    }

    pub fn resolve_complex_type(&self, qualified_name: &str) -> Result<&ComplexType> {
        self.complex_type(qualified_name)
            .ok_or_else(|| Error::unresolved(qualified_name))
    }

    /// Container by name. V4 documents refer to containers by qualified
    /// name, V3 documents by their simple name; both are accepted.
    pub fn entity_container(&self, name: &str) -> Option<&EntityContainer> {
        if let Ok(qn) = QualifiedName::parse(name) {
            if let Some(found) = self
                .schemas_known_as(&qn.namespace)
                .find_map(|s| s.entity_container(&qn.name))
            {
                return Some(found);
            }
        }
        self.schemas().iter().find_map(|s| s.entity_container(name))
    }

    /// The first default container declared in any schema.
    pub fn default_entity_container(&self) -> Option<&EntityContainer> {
        self.schemas()
            .iter()
            .find_map(Schema::default_entity_container)
    }

    /// Entity set in the default container.
    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.default_entity_container()?.entity_set(name)
    }

    /// Resolve a type reference to a primitive or a declared type.
    pub fn resolve_type(&self, type_ref: &TypeRef) -> Result<ResolvedType<'_>> {
        let element = type_ref.element_type.as_str();
        let qn = type_ref.qualified_name()?;

        if qn.namespace == EDM_NAMESPACE {
            return EdmSimpleType::resolve_for_version(element, self.protocol_version())
                .map(ResolvedType::Primitive);
        }
        if let Some(t) = self.entity_type(element) {
            return Ok(ResolvedType::Entity(t));
        }
        if let Some(t) = self.complex_type(element) {
            return Ok(ResolvedType::Complex(t));
        }
        if let Some(t) = self.enum_type(element) {
            return Ok(ResolvedType::Enum(t));
        }
        if let Some(t) = self.type_definition(element) {
            return Ok(ResolvedType::Definition(t));
        }
        Err(Error::unresolved(element))
    }
}
