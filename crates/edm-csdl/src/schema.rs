//! Schema parser and the V3-only schema members

use crate::Result;
use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use edm_model::schema::{
    AssociationConstraint, AssociationEnd, RoleConstraint, SchemaExt, V3Schema, V4Schema,
};
use edm_model::{Association, EntityContainer, Schema, Using, ValueTerm};

pub(crate) static USING_FIELDS: &FieldTable<Using> = &[
    ("Namespace", |de, u| {
        u.namespace = de.read_string()?;
        Ok(())
    }),
    ("Alias", |de, u| {
        u.alias = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Using {
    const CONSTRUCT: &'static str = "Using";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut using = Using::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(USING_FIELDS, de, field, &mut using)
        })?;
        Ok(using)
    }
}

pub(crate) static ASSOCIATION_END_FIELDS: &FieldTable<AssociationEnd> = &[
    ("Type", |de, e| {
        e.type_name = de.read_string()?;
        Ok(())
    }),
    ("Role", |de, e| {
        e.role = de.read_string()?;
        Ok(())
    }),
    ("Multiplicity", |de, e| {
        e.multiplicity = de.read_string()?;
        Ok(())
    }),
    ("OnDelete", |de, e| {
        e.on_delete = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for AssociationEnd {
    const CONSTRUCT: &'static str = "End";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut end = AssociationEnd::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ASSOCIATION_END_FIELDS, de, field, &mut end)
        })?;
        Ok(end)
    }
}

pub(crate) static ROLE_CONSTRAINT_FIELDS: &FieldTable<RoleConstraint> = &[
    ("Role", |de, r| {
        r.role = de.read_string()?;
        Ok(())
    }),
    ("PropertyRef", |de, r| {
        r.property_refs.push(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for RoleConstraint {
    const CONSTRUCT: &'static str = "Role";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut role = RoleConstraint::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ROLE_CONSTRAINT_FIELDS, de, field, &mut role)
        })?;
        Ok(role)
    }
}

pub(crate) static ASSOCIATION_CONSTRAINT_FIELDS: &FieldTable<AssociationConstraint> = &[
    ("Principal", |de, c| {
        c.principal = de.parse()?;
        Ok(())
    }),
    ("Dependent", |de, c| {
        c.dependent = de.parse()?;
        Ok(())
    }),
];

impl CsdlDeserialize for AssociationConstraint {
    const CONSTRUCT: &'static str = "ReferentialConstraint";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut constraint = AssociationConstraint::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ASSOCIATION_CONSTRAINT_FIELDS, de, field, &mut constraint)
        })?;
        Ok(constraint)
    }
}

pub(crate) static ASSOCIATION_FIELDS: &FieldTable<Association> = &[
    ("Name", |de, a| {
        a.name = de.read_string()?;
        Ok(())
    }),
    ("End", |de, a| {
        a.ends.push(de.parse()?);
        Ok(())
    }),
    ("ReferentialConstraint", |de, a| {
        a.referential_constraint = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Association {
    const CONSTRUCT: &'static str = "Association";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut association = Association::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ASSOCIATION_FIELDS, de, field, &mut association)
        })?;
        Ok(association)
    }
}

pub(crate) static VALUE_TERM_FIELDS: &FieldTable<ValueTerm> = &[
    ("Name", |de, t| {
        t.name = de.read_string()?;
        Ok(())
    }),
    ("Type", |de, t| {
        t.type_name = de.read_string()?;
        Ok(())
    }),
    ("DefaultValue", |de, t| {
        t.default_value = Some(de.read_string()?);
        Ok(())
    }),
    ("Nullable", |de, t| {
        t.nullable = de.read_bool()?;
        Ok(())
    }),
];

impl CsdlDeserialize for ValueTerm {
    const CONSTRUCT: &'static str = "ValueTerm";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut term = ValueTerm::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(VALUE_TERM_FIELDS, de, field, &mut term)
        })?;
        Ok(term)
    }
}

pub(crate) static SCHEMA_FIELDS: &FieldTable<Schema> = &[
    ("Namespace", |de, s| {
        s.namespace = de.read_string()?;
        Ok(())
    }),
    ("Alias", |de, s| {
        s.alias = Some(de.read_string()?);
        Ok(())
    }),
    ("ComplexType", |de, s| {
        s.complex_types.push(de.parse()?);
        Ok(())
    }),
    ("EntityType", |de, s| {
        s.entity_types.push(de.parse()?);
        Ok(())
    }),
    ("EnumType", |de, s| {
        s.enum_types.push(de.parse()?);
        Ok(())
    }),
    ("Annotations", |de, s| {
        s.annotation_groups.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V3_SCHEMA_FIELDS: &FieldTable<V3Schema> = &[
    ("Using", |de, s| {
        s.usings.push(de.parse()?);
        Ok(())
    }),
    ("Association", |de, s| {
        s.associations.push(de.parse()?);
        Ok(())
    }),
    ("ValueTerm", |de, s| {
        s.value_terms.push(de.parse()?);
        Ok(())
    }),
    ("EntityContainer", |de, s| {
        s.entity_containers.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_SCHEMA_FIELDS: &FieldTable<V4Schema> = &[
    // A V4 schema has at most one container and it is always the default
    ("EntityContainer", |de, s| {
        let mut container: EntityContainer = de.parse()?;
        container.is_default_entity_container = true;
        s.entity_container = Some(container);
        Ok(())
    }),
    ("Action", |de, s| {
        s.actions.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, s| {
        s.annotations.push(de.parse()?);
        Ok(())
    }),
    ("Function", |de, s| {
        s.functions.push(de.parse()?);
        Ok(())
    }),
    ("TypeDefinition", |de, s| {
        s.type_definitions.push(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Schema {
    const CONSTRUCT: &'static str = "Schema";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut schema = Schema::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(SCHEMA_FIELDS, de, field, &mut schema)? {
                return Ok(true);
            }
            match &mut schema.ext {
                SchemaExt::V3(v3) => dispatch(V3_SCHEMA_FIELDS, de, field, v3),
                SchemaExt::V4(v4) => dispatch(V4_SCHEMA_FIELDS, de, field, v4),
            }
        })?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenBuffer;
    use crate::xml::XmlTokenizer;
    use edm_model::ProtocolVersion;

    fn parse_xml(xml: &str, version: ProtocolVersion) -> Schema {
        let mut tokens = XmlTokenizer::new(xml.as_bytes());
        let mut de = Deserializer::new(&mut tokens, version);
        de.parse().unwrap()
    }

    const MIXED_SCHEMA: &str = r#"<Schema Namespace="Auto" Alias="Self">
        <Using Namespace="Vocab.Display" Alias="Display"/>
        <Association Name="CarOwner">
            <End Type="Auto.Car" Role="Car" Multiplicity="*"/>
            <End Type="Auto.Person" Role="Owner" Multiplicity="0..1">
                <OnDelete Action="Cascade"/>
            </End>
            <ReferentialConstraint>
                <Principal Role="Owner"><PropertyRef Name="Id"/></Principal>
                <Dependent Role="Car"><PropertyRef Name="OwnerId"/></Dependent>
            </ReferentialConstraint>
        </Association>
        <ValueTerm Name="Title" Type="Edm.String"/>
        <EntityType Name="Car"/>
        <Action Name="Wash"/>
        <Function Name="Find"/>
        <TypeDefinition Name="Vin" UnderlyingType="Edm.String"/>
        <Annotation Term="Core.Description" String="Cars"/>
        <EntityContainer Name="Garage"/>
    </Schema>"#;

    #[test]
    fn test_v3_schema_members() {
        let schema = parse_xml(MIXED_SCHEMA, ProtocolVersion::V3);
        assert_eq!(schema.namespace, "Auto");
        assert!(schema.is_known_as("Self"));
        assert_eq!(schema.usings()[0].alias.as_deref(), Some("Display"));

        let association = schema.association("CarOwner").unwrap();
        assert_eq!(association.ends.len(), 2);
        let owner = association.end("Owner").unwrap();
        assert_eq!(owner.on_delete.as_ref().unwrap().action, "Cascade");
        let constraint = association.referential_constraint.as_ref().unwrap();
        assert_eq!(constraint.principal.role, "Owner");
        assert_eq!(constraint.dependent.property_refs[0].name, "OwnerId");

        assert_eq!(schema.value_terms().len(), 1);
        assert!(schema.actions().is_empty());
        assert!(schema.functions().is_empty());
        assert!(schema.type_definitions().is_empty());
        assert!(schema.annotations().is_empty());

        // The V3 container keeps whatever flag the document states
        let container = schema.entity_container("Garage").unwrap();
        assert!(!container.is_default_entity_container());
        assert!(schema.default_entity_container().is_none());
    }

    #[test]
    fn test_v4_schema_members() {
        let schema = parse_xml(MIXED_SCHEMA, ProtocolVersion::V4);
        assert!(schema.usings().is_empty());
        assert!(schema.associations().is_empty());
        assert!(schema.value_terms().is_empty());

        assert_eq!(schema.actions().len(), 1);
        assert_eq!(schema.functions_named("Find").len(), 1);
        assert!(schema.type_definition("Vin").is_some());
        assert_eq!(schema.annotations()[0].term, "Core.Description");
        assert_eq!(schema.entity_types.len(), 1);
    }

    #[test]
    fn test_bare_v4_container_becomes_default() {
        let mut tokens = TokenBuffer::new();
        tokens.start_object();
        tokens.scalar("Namespace", "Trip");
        tokens.field("EntityContainer");
        tokens.start_object();
        tokens.end_object();
        tokens.end_object();

        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V4);
        let schema: Schema = de.parse().unwrap();

        let container = schema.default_entity_container().unwrap();
        assert!(container.is_default_entity_container());
        assert_eq!(schema.entity_containers().len(), 1);
    }

    #[test]
    fn test_duplicate_entity_type_lookup_returns_last() {
        let schema = parse_xml(
            r#"<Schema Namespace="Auto">
                <EntityType Name="Car"><Property Name="A" Type="Edm.String"/></EntityType>
                <EntityType Name="Car"><Property Name="B" Type="Edm.String"/></EntityType>
                <ComplexType Name="Spec"/>
                <ComplexType Name="Spec"><Property Name="C" Type="Edm.Int32"/></ComplexType>
            </Schema>"#,
            ProtocolVersion::V3,
        );
        assert_eq!(schema.entity_type("Car").unwrap().properties[0].name, "B");
        assert_eq!(schema.complex_type("Spec").unwrap().properties.len(), 1);
    }
}
