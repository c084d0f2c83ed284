//! Model to token writer
//!
//! Walks a parsed model and emits the token stream the parsers accept, so
//! that parsing the output with the same protocol version rebuilds an equal
//! model. Within every object the scalar fields come before child objects,
//! which lets the XML emitter turn them into attributes.

use crate::token::TokenBuffer;
use edm_model::annotation::AnnotationsGroupExt;
use edm_model::container::{
    AssociationSetEnd, EntityContainerExt, EntitySetExt, FunctionImportExt,
};
use edm_model::document::RootDocumentExt;
use edm_model::schema::{
    AssociationConstraint, AssociationEnd, Parameter, ReturnType, RoleConstraint, SchemaExt,
};
use edm_model::types::{
    ComplexTypeExt, NavigationPropertyExt, OnDelete, ReferentialConstraint,
};
use edm_model::{
    Action, ActionImport, Annotation, AnnotationsGroup, Association, AssociationSet, ComplexType,
    ContentKind, DataServices, EntityContainer, EntityKey, EntitySet, EntityType, EnumMember,
    EnumType, Function, FunctionImport, Include, IncludeAnnotations, NavigationProperty,
    NavigationPropertyBinding, Property, PropertyRef, RawValue, Reference, RootDocument, Schema,
    Singleton, StoreGeneratedPattern, TypeDefinition, Using, ValueTerm,
};
use std::fmt::Display;
use tracing::debug;

/// A model node that can be written back as tokens.
pub trait CsdlSerialize {
    /// Write this node as one object, from its opening to its closing token.
    fn serialize(&self, w: &mut TokenWriter);
}

/// Accumulates tokens for a model walk.
#[derive(Debug, Default)]
pub struct TokenWriter {
    tokens: TokenBuffer,
}

impl TokenWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_tokens(self) -> TokenBuffer {
        self.tokens
    }

    pub fn write<T: CsdlSerialize + ?Sized>(&mut self, node: &T) {
        node.serialize(self);
    }

    /// Wrap `body` in an object.
    pub fn object(&mut self, body: impl FnOnce(&mut Self)) {
        self.tokens.start_object();
        body(self);
        self.tokens.end_object();
    }

    pub fn scalar(&mut self, name: &str, value: impl Display) {
        self.tokens.scalar(name, value.to_string());
    }

    pub fn optional(&mut self, name: &str, value: Option<impl Display>) {
        if let Some(value) = value {
            self.scalar(name, value);
        }
    }

    /// Boolean field, omitted when it equals the parser's default.
    pub fn flag(&mut self, name: &str, value: bool, default: bool) {
        if value != default {
            self.scalar(name, value);
        }
    }

    pub fn child<T: CsdlSerialize>(&mut self, name: &str, node: &T) {
        self.tokens.field(name);
        node.serialize(self);
    }

    pub fn optional_child<T: CsdlSerialize>(&mut self, name: &str, node: Option<&T>) {
        if let Some(node) = node {
            self.child(name, node);
        }
    }

    /// Repeated child; one field per element.
    pub fn children<T: CsdlSerialize>(&mut self, name: &str, nodes: &[T]) {
        for node in nodes {
            self.child(name, node);
        }
    }

    pub fn raw(&mut self, name: &str, value: &RawValue) {
        self.tokens.field(name);
        self.raw_value(value);
    }

    fn raw_value(&mut self, value: &RawValue) {
        match value {
            RawValue::Scalar(text) => self.tokens.value(text.as_str()),
            RawValue::Object(fields) => self.object(|w| {
                for (name, value) in fields {
                    w.raw(name, value);
                }
            }),
        }
    }
}

/// Tokens for a whole document, root object first.
pub fn to_tokens(root: &RootDocument) -> TokenBuffer {
    let mut writer = TokenWriter::new();
    writer.write(root);
    let tokens = writer.into_tokens();
    debug!(
        "Wrote {} document as {} tokens",
        root.protocol_version(),
        tokens.len()
    );
    tokens
}

impl CsdlSerialize for RootDocument {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Version", &self.version);
            if let RootDocumentExt::V4(v4) = &self.ext {
                w.children("Reference", &v4.references);
            }
            w.child("DataServices", &self.data_services);
        });
    }
}

impl CsdlSerialize for Reference {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Uri", &self.uri);
            w.children("Include", &self.includes);
            w.children("IncludeAnnotations", &self.include_annotations);
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for Include {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Namespace", &self.namespace);
            w.optional("Alias", self.alias.as_deref());
        });
    }
}

impl CsdlSerialize for IncludeAnnotations {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("TermNamespace", &self.term_namespace);
            w.optional("Qualifier", self.qualifier.as_deref());
            w.optional("TargetNamespace", self.target_namespace.as_deref());
        });
    }
}

impl CsdlSerialize for DataServices {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.optional("DataServiceVersion", self.data_service_version.as_deref());
            w.optional(
                "MaxDataServiceVersion",
                self.max_data_service_version.as_deref(),
            );
            w.children("Schema", &self.schemas);
        });
    }
}

impl CsdlSerialize for Schema {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Namespace", &self.namespace);
            w.optional("Alias", self.alias.as_deref());
            match &self.ext {
                SchemaExt::V3(v3) => {
                    w.children("Using", &v3.usings);
                    w.children("Association", &v3.associations);
                    w.children("ComplexType", &self.complex_types);
                    w.children("EntityType", &self.entity_types);
                    w.children("EnumType", &self.enum_types);
                    w.children("ValueTerm", &v3.value_terms);
                    w.children("EntityContainer", &v3.entity_containers);
                    w.children("Annotations", &self.annotation_groups);
                }
                SchemaExt::V4(v4) => {
                    w.children("TypeDefinition", &v4.type_definitions);
                    w.children("EnumType", &self.enum_types);
                    w.children("ComplexType", &self.complex_types);
                    w.children("EntityType", &self.entity_types);
                    w.children("Action", &v4.actions);
                    w.children("Function", &v4.functions);
                    w.optional_child("EntityContainer", v4.entity_container.as_ref());
                    w.children("Annotations", &self.annotation_groups);
                    w.children("Annotation", &v4.annotations);
                }
            }
        });
    }
}

impl CsdlSerialize for Using {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Namespace", &self.namespace);
            w.optional("Alias", self.alias.as_deref());
        });
    }
}

impl CsdlSerialize for Association {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.children("End", &self.ends);
            w.optional_child("ReferentialConstraint", self.referential_constraint.as_ref());
        });
    }
}

impl CsdlSerialize for AssociationEnd {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Type", &self.type_name);
            w.scalar("Role", &self.role);
            w.scalar("Multiplicity", &self.multiplicity);
            w.optional_child("OnDelete", self.on_delete.as_ref());
        });
    }
}

impl CsdlSerialize for AssociationConstraint {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.child("Principal", &self.principal);
            w.child("Dependent", &self.dependent);
        });
    }
}

impl CsdlSerialize for RoleConstraint {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Role", &self.role);
            w.children("PropertyRef", &self.property_refs);
        });
    }
}

impl CsdlSerialize for ValueTerm {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Type", &self.type_name);
            w.optional("DefaultValue", self.default_value.as_deref());
            w.flag("Nullable", self.nullable, true);
        });
    }
}

impl CsdlSerialize for EntityType {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.flag("Abstract", self.is_abstract, false);
            w.optional("BaseType", self.base_type.as_deref());
            w.flag("OpenType", self.open_type, false);
            w.flag("HasStream", self.has_stream, false);
            w.optional_child("Key", self.key.as_ref());
            w.children("Property", &self.properties);
            w.children("NavigationProperty", &self.navigation_properties);
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for EntityKey {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| w.children("PropertyRef", &self.property_refs));
    }
}

impl CsdlSerialize for PropertyRef {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.optional("Alias", self.alias.as_deref());
        });
    }
}

impl CsdlSerialize for Property {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Type", &self.type_name);
            w.flag("Nullable", self.nullable, true);
            w.optional("DefaultValue", self.default_value.as_deref());
            w.optional("MaxLength", self.max_length);
            w.flag("FixedLength", self.fixed_length, false);
            w.optional("Precision", self.precision);
            w.optional("Scale", self.scale);
            w.flag("Unicode", self.unicode, true);
            w.optional("Collation", self.collation.as_deref());
            w.optional("SRID", self.srid.as_deref());
            w.optional("ConcurrencyMode", self.concurrency_mode);
            w.optional("FC_SourcePath", self.fc_source_path.as_deref());
            w.optional("FC_TargetPath", self.fc_target_path.as_deref());
            if self.fc_content_kind != ContentKind::default() {
                w.scalar("FC_ContentKind", self.fc_content_kind);
            }
            w.optional("FC_NsPrefix", self.fc_ns_prefix.as_deref());
            w.optional("FC_NsUri", self.fc_ns_uri.as_deref());
            w.flag("FC_KeepInContent", self.fc_keep_in_content, true);
            if self.store_generated_pattern != StoreGeneratedPattern::default() {
                w.scalar("StoreGeneratedPattern", self.store_generated_pattern);
            }
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for NavigationProperty {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            match &self.ext {
                NavigationPropertyExt::V3(v3) => {
                    w.scalar("Relationship", &v3.relationship);
                    w.scalar("FromRole", &v3.from_role);
                    w.scalar("ToRole", &v3.to_role);
                }
                NavigationPropertyExt::V4(v4) => {
                    w.scalar("Type", &v4.type_name);
                    w.flag("Nullable", v4.nullable, true);
                    w.optional("Partner", v4.partner.as_deref());
                    w.flag("ContainsTarget", v4.contains_target, false);
                    w.children("ReferentialConstraint", &v4.referential_constraints);
                    w.optional_child("OnDelete", v4.on_delete.as_ref());
                    w.optional_child("Annotation", v4.annotation.as_ref());
                }
            }
        });
    }
}

impl CsdlSerialize for ReferentialConstraint {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Property", &self.property);
            w.scalar("ReferencedProperty", &self.referenced_property);
        });
    }
}

impl CsdlSerialize for OnDelete {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| w.scalar("Action", &self.action));
    }
}

impl CsdlSerialize for ComplexType {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            match &self.ext {
                ComplexTypeExt::V3 => w.children("Property", &self.properties),
                ComplexTypeExt::V4(v4) => {
                    w.flag("Abstract", v4.is_abstract, false);
                    w.optional("BaseType", v4.base_type.as_deref());
                    w.flag("OpenType", v4.open_type, false);
                    w.children("Property", &self.properties);
                    w.children("NavigationProperty", &v4.navigation_properties);
                    w.optional_child("Annotation", v4.annotation.as_ref());
                }
            }
        });
    }
}

impl CsdlSerialize for EnumType {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.optional("UnderlyingType", self.underlying_type.as_deref());
            w.flag("IsFlags", self.is_flags, false);
            w.children("Member", &self.members);
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for EnumMember {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.optional("Value", self.value);
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for EntityContainer {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.optional("Extends", self.extends.as_deref());
            w.optional("LazyLoadingEnabled", self.lazy_loading_enabled);
            w.flag(
                "IsDefaultEntityContainer",
                self.is_default_entity_container,
                false,
            );
            w.children("EntitySet", &self.entity_sets);
            match &self.ext {
                EntityContainerExt::V3(v3) => {
                    w.children("AssociationSet", &v3.association_sets);
                    w.children("FunctionImport", &self.function_imports);
                }
                EntityContainerExt::V4(v4) => {
                    w.children("Singleton", &v4.singletons);
                    w.children("ActionImport", &v4.action_imports);
                    w.children("FunctionImport", &self.function_imports);
                    w.optional_child("Annotation", v4.annotation.as_ref());
                }
            }
        });
    }
}

impl CsdlSerialize for EntitySet {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("EntityType", &self.entity_type);
            if let EntitySetExt::V4(v4) = &self.ext {
                w.flag(
                    "IncludeInServiceDocument",
                    v4.include_in_service_document,
                    true,
                );
                w.children(
                    "NavigationPropertyBinding",
                    &v4.navigation_property_bindings,
                );
                w.optional_child("Annotation", v4.annotation.as_ref());
            }
        });
    }
}

impl CsdlSerialize for NavigationPropertyBinding {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Path", &self.path);
            w.scalar("Target", &self.target);
        });
    }
}

impl CsdlSerialize for FunctionImport {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            match &self.ext {
                FunctionImportExt::V3(v3) => {
                    w.optional("ReturnType", v3.return_type.as_deref());
                    w.optional("EntitySet", v3.entity_set.as_deref());
                    w.optional("EntitySetPath", v3.entity_set_path.as_deref());
                    w.flag("IsComposable", v3.is_composable, false);
                    w.flag("IsSideEffecting", v3.is_side_effecting, true);
                    w.flag("IsBindable", v3.is_bindable, false);
                    w.flag("IsAlwaysBindable", v3.is_always_bindable, false);
                    w.optional("HttpMethod", v3.http_method.as_deref());
                    w.children("Parameter", &v3.parameters);
                }
                FunctionImportExt::V4(v4) => {
                    w.scalar("Function", &v4.function);
                    w.optional("EntitySet", v4.entity_set.as_deref());
                    w.flag(
                        "IncludeInServiceDocument",
                        v4.include_in_service_document,
                        false,
                    );
                    w.optional_child("Annotation", v4.annotation.as_ref());
                }
            }
        });
    }
}

impl CsdlSerialize for ActionImport {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Action", &self.action);
            w.optional("EntitySet", self.entity_set.as_deref());
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for Singleton {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Type", &self.type_name);
            w.children(
                "NavigationPropertyBinding",
                &self.navigation_property_bindings,
            );
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for AssociationSet {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Association", &self.association);
            w.children("End", &self.ends);
        });
    }
}

impl CsdlSerialize for AssociationSetEnd {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Role", &self.role);
            w.scalar("EntitySet", &self.entity_set);
        });
    }
}

impl CsdlSerialize for Action {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.flag("IsBound", self.is_bound, false);
            w.optional("EntitySetPath", self.entity_set_path.as_deref());
            w.children("Parameter", &self.parameters);
            w.optional_child("ReturnType", self.return_type.as_ref());
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for Function {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.flag("IsBound", self.is_bound, false);
            w.flag("IsComposable", self.is_composable, false);
            w.optional("EntitySetPath", self.entity_set_path.as_deref());
            w.children("Parameter", &self.parameters);
            w.optional_child("ReturnType", self.return_type.as_ref());
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for Parameter {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("Type", &self.type_name);
            w.flag("Nullable", self.nullable, true);
            w.optional("MaxLength", self.max_length);
            w.optional("Precision", self.precision);
            w.optional("Scale", self.scale);
            w.optional("SRID", self.srid.as_deref());
            w.optional("Mode", self.mode.as_deref());
        });
    }
}

impl CsdlSerialize for ReturnType {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Type", &self.type_name);
            w.flag("Nullable", self.nullable, true);
            w.optional("MaxLength", self.max_length);
            w.optional("Precision", self.precision);
            w.optional("Scale", self.scale);
            w.optional("SRID", self.srid.as_deref());
        });
    }
}

impl CsdlSerialize for TypeDefinition {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Name", &self.name);
            w.scalar("UnderlyingType", &self.underlying_type);
            w.optional("MaxLength", self.max_length);
            w.optional("Precision", self.precision);
            w.optional("Scale", self.scale);
            w.optional("SRID", self.srid.as_deref());
            w.flag("Unicode", self.unicode, true);
            w.optional_child("Annotation", self.annotation.as_ref());
        });
    }
}

impl CsdlSerialize for Annotation {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Term", &self.term);
            w.optional("Qualifier", self.qualifier.as_deref());
            if let Some(expression) = &self.expression {
                w.raw(&expression.kind, &expression.value);
            }
        });
    }
}

impl CsdlSerialize for AnnotationsGroup {
    fn serialize(&self, w: &mut TokenWriter) {
        w.object(|w| {
            w.scalar("Target", &self.target);
            w.optional("Qualifier", self.qualifier.as_deref());
            match &self.ext {
                AnnotationsGroupExt::V3(v3) => {
                    w.children("ValueAnnotation", &v3.value_annotations);
                    w.children("TypeAnnotation", &v3.type_annotations);
                }
                AnnotationsGroupExt::V4(v4) => w.children("Annotation", &v4.annotations),
            }
        });
    }
}
