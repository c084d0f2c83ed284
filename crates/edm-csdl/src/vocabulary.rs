//! Recognized field names per construct and protocol version
//!
//! Derived from the parsers' dispatch tables, so the answer is always what
//! the parser actually accepts.

use crate::annotation::{
    ANNOTATION_FIELDS, ANNOTATIONS_GROUP_FIELDS, V3_ANNOTATIONS_GROUP_FIELDS,
    V4_ANNOTATIONS_GROUP_FIELDS,
};
use crate::container::{
    ACTION_IMPORT_FIELDS, ASSOCIATION_SET_END_FIELDS, ASSOCIATION_SET_FIELDS,
    ENTITY_CONTAINER_FIELDS, ENTITY_SET_FIELDS, FUNCTION_IMPORT_FIELDS,
    NAVIGATION_PROPERTY_BINDING_FIELDS, SINGLETON_FIELDS, V3_ENTITY_CONTAINER_FIELDS,
    V3_FUNCTION_IMPORT_FIELDS, V4_ENTITY_CONTAINER_FIELDS, V4_ENTITY_SET_FIELDS,
    V4_FUNCTION_IMPORT_FIELDS,
};
use crate::de::{FieldTable, field_names};
use crate::document::{
    DATA_SERVICES_FIELDS, INCLUDE_ANNOTATIONS_FIELDS, INCLUDE_FIELDS, REFERENCE_FIELDS,
    ROOT_DOCUMENT_FIELDS, V4_ROOT_DOCUMENT_FIELDS,
};
use crate::operation::{
    ACTION_FIELDS, FUNCTION_FIELDS, PARAMETER_FIELDS, RETURN_TYPE_FIELDS, TYPE_DEFINITION_FIELDS,
};
use crate::schema::{
    ASSOCIATION_CONSTRAINT_FIELDS, ASSOCIATION_END_FIELDS, ASSOCIATION_FIELDS,
    ROLE_CONSTRAINT_FIELDS, SCHEMA_FIELDS, USING_FIELDS, V3_SCHEMA_FIELDS, V4_SCHEMA_FIELDS,
    VALUE_TERM_FIELDS,
};
use crate::structural::{
    COMPLEX_TYPE_FIELDS, ENTITY_KEY_FIELDS, ENTITY_TYPE_FIELDS, ENUM_MEMBER_FIELDS,
    ENUM_TYPE_FIELDS, NAVIGATION_PROPERTY_FIELDS, ON_DELETE_FIELDS, PROPERTY_FIELDS,
    PROPERTY_REF_FIELDS, REFERENTIAL_CONSTRAINT_FIELDS, V3_NAVIGATION_PROPERTY_FIELDS,
    V4_COMPLEX_TYPE_FIELDS, V4_ENTITY_TYPE_FIELDS, V4_ENUM_MEMBER_FIELDS, V4_ENUM_TYPE_FIELDS,
    V4_NAVIGATION_PROPERTY_FIELDS, V4_PROPERTY_FIELDS,
};
use crate::{Error, Result};
use edm_model::ProtocolVersion;
use std::fmt;
use std::str::FromStr;

static NONE: &FieldTable<()> = &[];

/// Every construct that has its own parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Construct {
    Document,
    DataServices,
    Reference,
    Include,
    IncludeAnnotations,
    Schema,
    Using,
    Association,
    AssociationEnd,
    AssociationConstraint,
    RoleConstraint,
    ValueTerm,
    EntityType,
    ComplexType,
    EnumType,
    EnumMember,
    Property,
    NavigationProperty,
    ReferentialConstraint,
    OnDelete,
    EntityKey,
    PropertyRef,
    EntityContainer,
    EntitySet,
    NavigationPropertyBinding,
    FunctionImport,
    ActionImport,
    Singleton,
    AssociationSet,
    AssociationSetEnd,
    Action,
    Function,
    Parameter,
    ReturnType,
    TypeDefinition,
    Annotation,
    Annotations,
}

impl Construct {
    pub const ALL: [Construct; 37] = [
        Construct::Document,
        Construct::DataServices,
        Construct::Reference,
        Construct::Include,
        Construct::IncludeAnnotations,
        Construct::Schema,
        Construct::Using,
        Construct::Association,
        Construct::AssociationEnd,
        Construct::AssociationConstraint,
        Construct::RoleConstraint,
        Construct::ValueTerm,
        Construct::EntityType,
        Construct::ComplexType,
        Construct::EnumType,
        Construct::EnumMember,
        Construct::Property,
        Construct::NavigationProperty,
        Construct::ReferentialConstraint,
        Construct::OnDelete,
        Construct::EntityKey,
        Construct::PropertyRef,
        Construct::EntityContainer,
        Construct::EntitySet,
        Construct::NavigationPropertyBinding,
        Construct::FunctionImport,
        Construct::ActionImport,
        Construct::Singleton,
        Construct::AssociationSet,
        Construct::AssociationSetEnd,
        Construct::Action,
        Construct::Function,
        Construct::Parameter,
        Construct::ReturnType,
        Construct::TypeDefinition,
        Construct::Annotation,
        Construct::Annotations,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Construct::Document => "Document",
            Construct::DataServices => "DataServices",
            Construct::Reference => "Reference",
            Construct::Include => "Include",
            Construct::IncludeAnnotations => "IncludeAnnotations",
            Construct::Schema => "Schema",
            Construct::Using => "Using",
            Construct::Association => "Association",
            Construct::AssociationEnd => "AssociationEnd",
            Construct::AssociationConstraint => "AssociationConstraint",
            Construct::RoleConstraint => "RoleConstraint",
            Construct::ValueTerm => "ValueTerm",
            Construct::EntityType => "EntityType",
            Construct::ComplexType => "ComplexType",
            Construct::EnumType => "EnumType",
            Construct::EnumMember => "EnumMember",
            Construct::Property => "Property",
            Construct::NavigationProperty => "NavigationProperty",
            Construct::ReferentialConstraint => "ReferentialConstraint",
            Construct::OnDelete => "OnDelete",
            Construct::EntityKey => "EntityKey",
            Construct::PropertyRef => "PropertyRef",
            Construct::EntityContainer => "EntityContainer",
            Construct::EntitySet => "EntitySet",
            Construct::NavigationPropertyBinding => "NavigationPropertyBinding",
            Construct::FunctionImport => "FunctionImport",
            Construct::ActionImport => "ActionImport",
            Construct::Singleton => "Singleton",
            Construct::AssociationSet => "AssociationSet",
            Construct::AssociationSetEnd => "AssociationSetEnd",
            Construct::Action => "Action",
            Construct::Function => "Function",
            Construct::Parameter => "Parameter",
            Construct::ReturnType => "ReturnType",
            Construct::TypeDefinition => "TypeDefinition",
            Construct::Annotation => "Annotation",
            Construct::Annotations => "Annotations",
        }
    }
}

impl fmt::Display for Construct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Construct {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Construct::ALL
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("Unknown construct: {}", s)))
    }
}

fn versioned<S, A, B>(
    shared: &FieldTable<S>,
    v3: &FieldTable<A>,
    v4: &FieldTable<B>,
    version: ProtocolVersion,
) -> Vec<&'static str> {
    let mut fields: Vec<_> = field_names(shared).collect();
    match version {
        ProtocolVersion::V3 => fields.extend(field_names(v3)),
        ProtocolVersion::V4 => fields.extend(field_names(v4)),
    }
    fields
}

fn shared<S>(table: &FieldTable<S>) -> Vec<&'static str> {
    field_names(table).collect()
}

/// Field names the parser of `construct` recognizes under `version`.
///
/// `Annotation` also accepts any other field as its expression, which is not
/// listed.
pub fn vocabulary(construct: Construct, version: ProtocolVersion) -> Vec<&'static str> {
    match construct {
        Construct::Document => {
            let mut fields = vec!["DataServices"];
            fields.extend(versioned(
                ROOT_DOCUMENT_FIELDS,
                NONE,
                V4_ROOT_DOCUMENT_FIELDS,
                version,
            ));
            fields
        }
        Construct::DataServices => shared(DATA_SERVICES_FIELDS),
        Construct::Reference => shared(REFERENCE_FIELDS),
        Construct::Include => shared(INCLUDE_FIELDS),
        Construct::IncludeAnnotations => shared(INCLUDE_ANNOTATIONS_FIELDS),
        Construct::Schema => versioned(SCHEMA_FIELDS, V3_SCHEMA_FIELDS, V4_SCHEMA_FIELDS, version),
        Construct::Using => shared(USING_FIELDS),
        Construct::Association => shared(ASSOCIATION_FIELDS),
        Construct::AssociationEnd => shared(ASSOCIATION_END_FIELDS),
        Construct::AssociationConstraint => shared(ASSOCIATION_CONSTRAINT_FIELDS),
        Construct::RoleConstraint => shared(ROLE_CONSTRAINT_FIELDS),
        Construct::ValueTerm => shared(VALUE_TERM_FIELDS),
        Construct::EntityType => {
            versioned(ENTITY_TYPE_FIELDS, NONE, V4_ENTITY_TYPE_FIELDS, version)
        }
        Construct::ComplexType => {
            versioned(COMPLEX_TYPE_FIELDS, NONE, V4_COMPLEX_TYPE_FIELDS, version)
        }
        Construct::EnumType => versioned(ENUM_TYPE_FIELDS, NONE, V4_ENUM_TYPE_FIELDS, version),
        Construct::EnumMember => {
            versioned(ENUM_MEMBER_FIELDS, NONE, V4_ENUM_MEMBER_FIELDS, version)
        }
        Construct::Property => versioned(PROPERTY_FIELDS, NONE, V4_PROPERTY_FIELDS, version),
        Construct::NavigationProperty => versioned(
            NAVIGATION_PROPERTY_FIELDS,
            V3_NAVIGATION_PROPERTY_FIELDS,
            V4_NAVIGATION_PROPERTY_FIELDS,
            version,
        ),
        Construct::ReferentialConstraint => shared(REFERENTIAL_CONSTRAINT_FIELDS),
        Construct::OnDelete => shared(ON_DELETE_FIELDS),
        Construct::EntityKey => shared(ENTITY_KEY_FIELDS),
        Construct::PropertyRef => shared(PROPERTY_REF_FIELDS),
        Construct::EntityContainer => versioned(
            ENTITY_CONTAINER_FIELDS,
            V3_ENTITY_CONTAINER_FIELDS,
            V4_ENTITY_CONTAINER_FIELDS,
            version,
        ),
        Construct::EntitySet => versioned(ENTITY_SET_FIELDS, NONE, V4_ENTITY_SET_FIELDS, version),
        Construct::NavigationPropertyBinding => shared(NAVIGATION_PROPERTY_BINDING_FIELDS),
        Construct::FunctionImport => versioned(
            FUNCTION_IMPORT_FIELDS,
            V3_FUNCTION_IMPORT_FIELDS,
            V4_FUNCTION_IMPORT_FIELDS,
            version,
        ),
        Construct::ActionImport => shared(ACTION_IMPORT_FIELDS),
        Construct::Singleton => shared(SINGLETON_FIELDS),
        Construct::AssociationSet => shared(ASSOCIATION_SET_FIELDS),
        Construct::AssociationSetEnd => shared(ASSOCIATION_SET_END_FIELDS),
        Construct::Action => shared(ACTION_FIELDS),
        Construct::Function => shared(FUNCTION_FIELDS),
        Construct::Parameter => shared(PARAMETER_FIELDS),
        Construct::ReturnType => shared(RETURN_TYPE_FIELDS),
        Construct::TypeDefinition => shared(TYPE_DEFINITION_FIELDS),
        Construct::Annotation => shared(ANNOTATION_FIELDS),
        Construct::Annotations => versioned(
            ANNOTATIONS_GROUP_FIELDS,
            V3_ANNOTATIONS_GROUP_FIELDS,
            V4_ANNOTATIONS_GROUP_FIELDS,
            version,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_vocabulary_depends_on_version() {
        let v3 = vocabulary(Construct::Schema, ProtocolVersion::V3);
        let v4 = vocabulary(Construct::Schema, ProtocolVersion::V4);

        for shared in ["Namespace", "Alias", "EntityType", "ComplexType", "EnumType"] {
            assert!(v3.contains(&shared) && v4.contains(&shared), "{}", shared);
        }
        for v3_only in ["Using", "Association", "ValueTerm"] {
            assert!(v3.contains(&v3_only) && !v4.contains(&v3_only), "{}", v3_only);
        }
        for v4_only in ["Action", "Function", "TypeDefinition", "Annotation"] {
            assert!(!v3.contains(&v4_only) && v4.contains(&v4_only), "{}", v4_only);
        }
        assert!(v3.contains(&"EntityContainer") && v4.contains(&"EntityContainer"));
    }

    #[test]
    fn test_entity_key_has_no_scalars() {
        assert_eq!(
            vocabulary(Construct::EntityKey, ProtocolVersion::V4),
            vec!["PropertyRef"]
        );
    }

    #[test]
    fn test_document_vocabulary() {
        assert_eq!(
            vocabulary(Construct::Document, ProtocolVersion::V3),
            vec!["DataServices", "Version"]
        );
        assert!(vocabulary(Construct::Document, ProtocolVersion::V4).contains(&"Reference"));
    }

    #[test]
    fn test_construct_names_round_trip() {
        for construct in Construct::ALL {
            assert_eq!(construct.name().parse::<Construct>().unwrap(), construct);
        }
        assert!("entitytype".parse::<Construct>().is_ok());
        assert!("Bogus".parse::<Construct>().is_err());
    }
}
