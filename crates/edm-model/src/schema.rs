//! Schema node and its V3/V4 exclusive members

use crate::annotation::{Annotation, AnnotationsGroup};
use crate::container::EntityContainer;
use crate::types::{ComplexType, EntityType, EnumType, MaxLength, OnDelete, PropertyRef, Scale};
use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};

/// V3 `Using`: imports another namespace under an alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Using {
    pub namespace: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationEnd {
    pub type_name: String,
    pub role: String,
    /// `0..1`, `1` or `*`
    pub multiplicity: String,
    pub on_delete: Option<OnDelete>,
}

/// One side of a V3 referential constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleConstraint {
    pub role: String,
    pub property_refs: Vec<PropertyRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationConstraint {
    pub principal: RoleConstraint,
    pub dependent: RoleConstraint,
}

/// V3 association between two entity types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub name: String,
    pub ends: Vec<AssociationEnd>,
    pub referential_constraint: Option<AssociationConstraint>,
}

impl Association {
    pub fn end(&self, role: &str) -> Option<&AssociationEnd> {
        self.ends.iter().find(|e| e.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTerm {
    pub name: String,
    pub type_name: String,
    pub default_value: Option<String>,
    pub nullable: bool,
}

impl Default for ValueTerm {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_name: String::new(),
            default_value: None,
            nullable: true,
        }
    }
}

/// Parameter of a function import, action or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    pub max_length: Option<MaxLength>,
    pub precision: Option<u32>,
    pub scale: Option<Scale>,
    pub srid: Option<String>,
    /// V3 parameter direction (`In`, `Out`, `InOut`)
    pub mode: Option<String>,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_name: String::new(),
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            srid: None,
            mode: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnType {
    pub type_name: String,
    pub nullable: bool,
    pub max_length: Option<MaxLength>,
    pub precision: Option<u32>,
    pub scale: Option<Scale>,
    pub srid: Option<String>,
}

impl Default for ReturnType {
    fn default() -> Self {
        Self {
            type_name: String::new(),
            nullable: true,
            max_length: None,
            precision: None,
            scale: None,
            srid: None,
        }
    }
}

/// V4 action: an operation that may have side effects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub is_bound: bool,
    pub entity_set_path: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<ReturnType>,
    pub annotation: Option<Annotation>,
}

/// V4 function: a side-effect free operation, optionally composable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub is_bound: bool,
    pub is_composable: bool,
    pub entity_set_path: Option<String>,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<ReturnType>,
    pub annotation: Option<Annotation>,
}

/// V4 type definition: a named primitive type with facets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    pub name: String,
    pub underlying_type: String,
    pub max_length: Option<MaxLength>,
    pub precision: Option<u32>,
    pub scale: Option<Scale>,
    pub srid: Option<String>,
    pub unicode: bool,
    pub annotation: Option<Annotation>,
}

impl Default for TypeDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            underlying_type: String::new(),
            max_length: None,
            precision: None,
            scale: None,
            srid: None,
            unicode: true,
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3Schema {
    pub usings: Vec<Using>,
    pub associations: Vec<Association>,
    pub value_terms: Vec<ValueTerm>,
    pub entity_containers: Vec<EntityContainer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4Schema {
    /// The schema's single container, always flagged as default
    pub entity_container: Option<EntityContainer>,
    pub actions: Vec<Action>,
    pub functions: Vec<Function>,
    pub type_definitions: Vec<TypeDefinition>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaExt {
    V3(V3Schema),
    V4(V4Schema),
}

/// A namespace of type and container declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub namespace: String,
    pub alias: Option<String>,
    pub entity_types: Vec<EntityType>,
    pub complex_types: Vec<ComplexType>,
    pub enum_types: Vec<EnumType>,
    pub annotation_groups: Vec<AnnotationsGroup>,
    pub ext: SchemaExt,
}

impl Schema {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => SchemaExt::V3(V3Schema::default()),
            ProtocolVersion::V4 => SchemaExt::V4(V4Schema::default()),
        };
        Self {
            namespace: String::new(),
            alias: None,
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            enum_types: Vec::new(),
            annotation_groups: Vec::new(),
            ext,
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        match self.ext {
            SchemaExt::V3(_) => ProtocolVersion::V3,
            SchemaExt::V4(_) => ProtocolVersion::V4,
        }
    }

    /// Whether `qualifier` names this schema by namespace or alias.
    pub fn is_known_as(&self, qualifier: &str) -> bool {
        self.namespace == qualifier || self.alias.as_deref() == Some(qualifier)
    }

    /// Entity type by local name. When a name is declared twice the later
    /// declaration wins.
    pub fn entity_type(&self, name: &str) -> Option<&EntityType> {
        self.entity_types.iter().rev().find(|t| t.name == name)
    }

    /// Complex type by local name; the later of duplicate declarations wins.
    pub fn complex_type(&self, name: &str) -> Option<&ComplexType> {
        self.complex_types.iter().rev().find(|t| t.name == name)
    }

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enum_types.iter().rev().find(|t| t.name == name)
    }

    /// Containers declared in this schema: any number under V3, at most one under V4.
    pub fn entity_containers(&self) -> &[EntityContainer] {
        match &self.ext {
            SchemaExt::V3(v3) => &v3.entity_containers,
            SchemaExt::V4(v4) => v4.entity_container.as_slice(),
        }
    }

    pub fn entity_container(&self, name: &str) -> Option<&EntityContainer> {
        self.entity_containers().iter().find(|c| c.name == name)
    }

    pub fn default_entity_container(&self) -> Option<&EntityContainer> {
        match &self.ext {
            SchemaExt::V3(v3) => v3
                .entity_containers
                .iter()
                .find(|c| c.is_default_entity_container),
            SchemaExt::V4(v4) => v4.entity_container.as_ref(),
        }
    }

    pub fn usings(&self) -> &[Using] {
        match &self.ext {
            SchemaExt::V3(v3) => &v3.usings,
            SchemaExt::V4(_) => &[],
        }
    }

    pub fn associations(&self) -> &[Association] {
        match &self.ext {
            SchemaExt::V3(v3) => &v3.associations,
            SchemaExt::V4(_) => &[],
        }
    }

    pub fn association(&self, name: &str) -> Option<&Association> {
        self.associations().iter().find(|a| a.name == name)
    }

    pub fn value_terms(&self) -> &[ValueTerm] {
        match &self.ext {
            SchemaExt::V3(v3) => &v3.value_terms,
            SchemaExt::V4(_) => &[],
        }
    }

    pub fn actions(&self) -> &[Action] {
        match &self.ext {
            SchemaExt::V3(_) => &[],
            SchemaExt::V4(v4) => &v4.actions,
        }
    }

    /// Actions may be overloaded by binding parameter; all overloads are returned.
    pub fn actions_named(&self, name: &str) -> Vec<&Action> {
        self.actions().iter().filter(|a| a.name == name).collect()
    }

    pub fn functions(&self) -> &[Function] {
        match &self.ext {
            SchemaExt::V3(_) => &[],
            SchemaExt::V4(v4) => &v4.functions,
        }
    }

    pub fn functions_named(&self, name: &str) -> Vec<&Function> {
        self.functions().iter().filter(|f| f.name == name).collect()
    }

    pub fn type_definitions(&self) -> &[TypeDefinition] {
        match &self.ext {
            SchemaExt::V3(_) => &[],
            SchemaExt::V4(v4) => &v4.type_definitions,
        }
    }

    pub fn type_definition(&self, name: &str) -> Option<&TypeDefinition> {
        self.type_definitions().iter().find(|t| t.name == name)
    }

    /// Free-standing schema annotations (V4).
    pub fn annotations(&self) -> &[Annotation] {
        match &self.ext {
            SchemaExt::V3(_) => &[],
            SchemaExt::V4(v4) => &v4.annotations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Property;

    fn entity(name: &str, property: &str) -> EntityType {
        let mut et = EntityType::new(name);
        et.properties.push(Property::new(property, "Edm.String"));
        et
    }

    #[test]
    fn test_entity_type_lookup_last_match_wins() {
        let mut schema = Schema::new(ProtocolVersion::V3);
        schema.entity_types.push(entity("Car", "First"));
        schema.entity_types.push(entity("Truck", "Other"));
        schema.entity_types.push(entity("Car", "Second"));

        let car = schema.entity_type("Car").unwrap();
        assert_eq!(car.properties[0].name, "Second");
        assert!(schema.entity_type("Bike").is_none());
    }

    #[test]
    fn test_complex_type_lookup_last_match_wins() {
        let mut schema = Schema::new(ProtocolVersion::V4);
        let mut first = ComplexType::new(ProtocolVersion::V4);
        first.name = "Address".to_string();
        let mut second = first.clone();
        second.properties.push(Property::new("Street", "Edm.String"));
        schema.complex_types.push(first);
        schema.complex_types.push(second);

        assert_eq!(schema.complex_type("Address").unwrap().properties.len(), 1);
    }

    #[test]
    fn test_v3_default_container_uses_flag() {
        let mut schema = Schema::new(ProtocolVersion::V3);
        let mut a = EntityContainer::new(ProtocolVersion::V3);
        a.name = "Secondary".to_string();
        let mut b = EntityContainer::new(ProtocolVersion::V3);
        b.name = "Main".to_string();
        b.is_default_entity_container = true;
        if let SchemaExt::V3(v3) = &mut schema.ext {
            v3.entity_containers.push(a);
            v3.entity_containers.push(b);
        }

        assert_eq!(schema.entity_containers().len(), 2);
        assert_eq!(schema.default_entity_container().unwrap().name, "Main");
        assert!(schema.actions().is_empty());
        assert!(schema.type_definitions().is_empty());
    }

    #[test]
    fn test_alias_matching() {
        let mut schema = Schema::new(ProtocolVersion::V4);
        schema.namespace = "Microsoft.OData.SampleService.Models.TripPin".to_string();
        schema.alias = Some("TripPin".to_string());
        assert!(schema.is_known_as("TripPin"));
        assert!(schema.is_known_as("Microsoft.OData.SampleService.Models.TripPin"));
        assert!(!schema.is_known_as("Other"));
    }
}
