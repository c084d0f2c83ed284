//! Parsers for entity, complex and enum types and their members

use crate::Result;
use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use edm_model::ProtocolVersion;
use edm_model::types::{
    ComplexTypeExt, NavigationPropertyExt, OnDelete, ReferentialConstraint, V3NavigationProperty,
    V4ComplexType, V4NavigationProperty,
};
use edm_model::{
    ComplexType, EntityKey, EntityType, EnumMember, EnumType, NavigationProperty, Property,
    PropertyRef,
};

pub(crate) static PROPERTY_FIELDS: &FieldTable<Property> = &[
    ("Name", |de, p| {
        p.name = de.read_string()?;
        Ok(())
    }),
    ("Type", |de, p| {
        p.type_name = de.read_string()?;
        Ok(())
    }),
    ("Nullable", |de, p| {
        p.nullable = de.read_bool()?;
        Ok(())
    }),
    ("DefaultValue", |de, p| {
        p.default_value = Some(de.read_string()?);
        Ok(())
    }),
    ("MaxLength", |de, p| {
        p.max_length = Some(de.read_parsed("MaxLength")?);
        Ok(())
    }),
    ("FixedLength", |de, p| {
        p.fixed_length = de.read_bool()?;
        Ok(())
    }),
    ("Precision", |de, p| {
        p.precision = Some(de.read_parsed("Precision")?);
        Ok(())
    }),
    ("Scale", |de, p| {
        p.scale = Some(de.read_parsed("Scale")?);
        Ok(())
    }),
    ("Unicode", |de, p| {
        p.unicode = de.read_bool()?;
        Ok(())
    }),
    ("Collation", |de, p| {
        p.collation = Some(de.read_string()?);
        Ok(())
    }),
    ("SRID", |de, p| {
        p.srid = Some(de.read_string()?);
        Ok(())
    }),
    ("ConcurrencyMode", |de, p| {
        p.concurrency_mode = Some(de.read_parsed("ConcurrencyMode")?);
        Ok(())
    }),
    ("FC_SourcePath", |de, p| {
        p.fc_source_path = Some(de.read_string()?);
        Ok(())
    }),
    ("FC_TargetPath", |de, p| {
        p.fc_target_path = Some(de.read_string()?);
        Ok(())
    }),
    ("FC_ContentKind", |de, p| {
        p.fc_content_kind = de.read_parsed("FC_ContentKind")?;
        Ok(())
    }),
    ("FC_NsPrefix", |de, p| {
        p.fc_ns_prefix = Some(de.read_string()?);
        Ok(())
    }),
    ("FC_NsUri", |de, p| {
        p.fc_ns_uri = Some(de.read_string()?);
        Ok(())
    }),
    ("FC_KeepInContent", |de, p| {
        p.fc_keep_in_content = de.read_bool()?;
        Ok(())
    }),
    ("StoreGeneratedPattern", |de, p| {
        p.store_generated_pattern = de.read_parsed("StoreGeneratedPattern")?;
        Ok(())
    }),
];

pub(crate) static V4_PROPERTY_FIELDS: &FieldTable<Property> = &[("Annotation", |de, p| {
    p.annotation = Some(de.parse()?);
    Ok(())
})];

impl CsdlDeserialize for Property {
    const CONSTRUCT: &'static str = "Property";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut property = Property::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(PROPERTY_FIELDS, de, field, &mut property)? {
                return Ok(true);
            }
            match de.version() {
                ProtocolVersion::V3 => Ok(false),
                ProtocolVersion::V4 => dispatch(V4_PROPERTY_FIELDS, de, field, &mut property),
            }
        })?;
        Ok(property)
    }
}

pub(crate) static REFERENTIAL_CONSTRAINT_FIELDS: &FieldTable<ReferentialConstraint> = &[
    ("Property", |de, c| {
        c.property = de.read_string()?;
        Ok(())
    }),
    ("ReferencedProperty", |de, c| {
        c.referenced_property = de.read_string()?;
        Ok(())
    }),
];

impl CsdlDeserialize for ReferentialConstraint {
    const CONSTRUCT: &'static str = "ReferentialConstraint";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut constraint = ReferentialConstraint::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(REFERENTIAL_CONSTRAINT_FIELDS, de, field, &mut constraint)
        })?;
        Ok(constraint)
    }
}

pub(crate) static ON_DELETE_FIELDS: &FieldTable<OnDelete> = &[("Action", |de, o| {
    o.action = de.read_string()?;
    Ok(())
})];

impl CsdlDeserialize for OnDelete {
    const CONSTRUCT: &'static str = "OnDelete";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut on_delete = OnDelete::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ON_DELETE_FIELDS, de, field, &mut on_delete)
        })?;
        Ok(on_delete)
    }
}

pub(crate) static NAVIGATION_PROPERTY_FIELDS: &FieldTable<NavigationProperty> =
    &[("Name", |de, n| {
        n.name = de.read_string()?;
        Ok(())
    })];

pub(crate) static V3_NAVIGATION_PROPERTY_FIELDS: &FieldTable<V3NavigationProperty> = &[
    ("Relationship", |de, n| {
        n.relationship = de.read_string()?;
        Ok(())
    }),
    ("FromRole", |de, n| {
        n.from_role = de.read_string()?;
        Ok(())
    }),
    ("ToRole", |de, n| {
        n.to_role = de.read_string()?;
        Ok(())
    }),
];

pub(crate) static V4_NAVIGATION_PROPERTY_FIELDS: &FieldTable<V4NavigationProperty> = &[
    ("Type", |de, n| {
        n.type_name = de.read_string()?;
        Ok(())
    }),
    ("Nullable", |de, n| {
        n.nullable = de.read_bool()?;
        Ok(())
    }),
    ("Partner", |de, n| {
        n.partner = Some(de.read_string()?);
        Ok(())
    }),
    ("ContainsTarget", |de, n| {
        n.contains_target = de.read_bool()?;
        Ok(())
    }),
    ("ReferentialConstraint", |de, n| {
        n.referential_constraints.push(de.parse()?);
        Ok(())
    }),
    ("OnDelete", |de, n| {
        n.on_delete = Some(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, n| {
        n.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for NavigationProperty {
    const CONSTRUCT: &'static str = "NavigationProperty";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut nav = NavigationProperty::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(NAVIGATION_PROPERTY_FIELDS, de, field, &mut nav)? {
                return Ok(true);
            }
            match &mut nav.ext {
                NavigationPropertyExt::V3(v3) => {
                    dispatch(V3_NAVIGATION_PROPERTY_FIELDS, de, field, v3)
                }
                NavigationPropertyExt::V4(v4) => {
                    dispatch(V4_NAVIGATION_PROPERTY_FIELDS, de, field, v4)
                }
            }
        })?;
        Ok(nav)
    }
}

pub(crate) static PROPERTY_REF_FIELDS: &FieldTable<PropertyRef> = &[
    ("Name", |de, r| {
        r.name = de.read_string()?;
        Ok(())
    }),
    ("Alias", |de, r| {
        r.alias = Some(de.read_string()?);
        Ok(())
    }),
];

impl CsdlDeserialize for PropertyRef {
    const CONSTRUCT: &'static str = "PropertyRef";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut property_ref = PropertyRef::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(PROPERTY_REF_FIELDS, de, field, &mut property_ref)
        })?;
        Ok(property_ref)
    }
}

pub(crate) static ENTITY_KEY_FIELDS: &FieldTable<EntityKey> = &[("PropertyRef", |de, k| {
    k.property_refs.push(de.parse()?);
    Ok(())
})];

impl CsdlDeserialize for EntityKey {
    const CONSTRUCT: &'static str = "Key";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut key = EntityKey::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ENTITY_KEY_FIELDS, de, field, &mut key)
        })?;
        Ok(key)
    }
}

pub(crate) static ENTITY_TYPE_FIELDS: &FieldTable<EntityType> = &[
    ("Name", |de, t| {
        t.name = de.read_string()?;
        Ok(())
    }),
    ("Abstract", |de, t| {
        t.is_abstract = de.read_bool()?;
        Ok(())
    }),
    ("BaseType", |de, t| {
        t.base_type = Some(de.read_string()?);
        Ok(())
    }),
    ("OpenType", |de, t| {
        t.open_type = de.read_bool()?;
        Ok(())
    }),
    ("HasStream", |de, t| {
        t.has_stream = de.read_bool()?;
        Ok(())
    }),
    ("Key", |de, t| {
        t.key = Some(de.parse()?);
        Ok(())
    }),
    ("Property", |de, t| {
        t.properties.push(de.parse()?);
        Ok(())
    }),
    ("NavigationProperty", |de, t| {
        t.navigation_properties.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_ENTITY_TYPE_FIELDS: &FieldTable<EntityType> = &[("Annotation", |de, t| {
    t.annotation = Some(de.parse()?);
    Ok(())
})];

impl CsdlDeserialize for EntityType {
    const CONSTRUCT: &'static str = "EntityType";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut entity_type = EntityType::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ENTITY_TYPE_FIELDS, de, field, &mut entity_type)? {
                return Ok(true);
            }
            match de.version() {
                ProtocolVersion::V3 => Ok(false),
                ProtocolVersion::V4 => dispatch(V4_ENTITY_TYPE_FIELDS, de, field, &mut entity_type),
            }
        })?;
        Ok(entity_type)
    }
}

pub(crate) static COMPLEX_TYPE_FIELDS: &FieldTable<ComplexType> = &[
    ("Name", |de, t| {
        t.name = de.read_string()?;
        Ok(())
    }),
    ("Property", |de, t| {
        t.properties.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_COMPLEX_TYPE_FIELDS: &FieldTable<V4ComplexType> = &[
    ("Abstract", |de, t| {
        t.is_abstract = de.read_bool()?;
        Ok(())
    }),
    ("BaseType", |de, t| {
        t.base_type = Some(de.read_string()?);
        Ok(())
    }),
    ("OpenType", |de, t| {
        t.open_type = de.read_bool()?;
        Ok(())
    }),
    ("NavigationProperty", |de, t| {
        t.navigation_properties.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, t| {
        t.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for ComplexType {
    const CONSTRUCT: &'static str = "ComplexType";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut complex_type = ComplexType::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(COMPLEX_TYPE_FIELDS, de, field, &mut complex_type)? {
                return Ok(true);
            }
            match &mut complex_type.ext {
                ComplexTypeExt::V3 => Ok(false),
                ComplexTypeExt::V4(v4) => dispatch(V4_COMPLEX_TYPE_FIELDS, de, field, v4),
            }
        })?;
        Ok(complex_type)
    }
}

pub(crate) static ENUM_MEMBER_FIELDS: &FieldTable<EnumMember> = &[
    ("Name", |de, m| {
        m.name = de.read_string()?;
        Ok(())
    }),
    ("Value", |de, m| {
        m.value = Some(de.read_parsed("Value")?);
        Ok(())
    }),
];

pub(crate) static V4_ENUM_MEMBER_FIELDS: &FieldTable<EnumMember> = &[("Annotation", |de, m| {
    m.annotation = Some(de.parse()?);
    Ok(())
})];

impl CsdlDeserialize for EnumMember {
    const CONSTRUCT: &'static str = "Member";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut member = EnumMember::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ENUM_MEMBER_FIELDS, de, field, &mut member)? {
                return Ok(true);
            }
            match de.version() {
                ProtocolVersion::V3 => Ok(false),
                ProtocolVersion::V4 => dispatch(V4_ENUM_MEMBER_FIELDS, de, field, &mut member),
            }
        })?;
        Ok(member)
    }
}

pub(crate) static ENUM_TYPE_FIELDS: &FieldTable<EnumType> = &[
    ("Name", |de, t| {
        t.name = de.read_string()?;
        Ok(())
    }),
    ("UnderlyingType", |de, t| {
        t.underlying_type = Some(de.read_string()?);
        Ok(())
    }),
    ("IsFlags", |de, t| {
        t.is_flags = de.read_bool()?;
        Ok(())
    }),
    ("Member", |de, t| {
        t.members.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_ENUM_TYPE_FIELDS: &FieldTable<EnumType> = &[("Annotation", |de, t| {
    t.annotation = Some(de.parse()?);
    Ok(())
})];

impl CsdlDeserialize for EnumType {
    const CONSTRUCT: &'static str = "EnumType";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut enum_type = EnumType::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ENUM_TYPE_FIELDS, de, field, &mut enum_type)? {
                return Ok(true);
            }
            match de.version() {
                ProtocolVersion::V3 => Ok(false),
                ProtocolVersion::V4 => dispatch(V4_ENUM_TYPE_FIELDS, de, field, &mut enum_type),
            }
        })?;
        Ok(enum_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenBuffer;
    use crate::xml::XmlTokenizer;
    use crate::Error;
    use edm_model::types::{ConcurrencyMode, MaxLength, Scale};
    use edm_model::{EdmSimpleType, StructuredType};

    fn parse_xml<T: CsdlDeserialize>(xml: &str, version: ProtocolVersion) -> Result<T> {
        let mut tokens = XmlTokenizer::new(xml.as_bytes());
        let mut de = Deserializer::new(&mut tokens, version);
        de.parse()
    }

    #[test]
    fn test_car_entity_type() {
        let mut tokens = TokenBuffer::new();
        tokens.start_object();
        tokens.scalar("Name", "Car");
        tokens.field("Key");
        tokens.start_object();
        tokens.field("PropertyRef");
        tokens.start_object();
        tokens.scalar("Name", "VIN");
        tokens.end_object();
        tokens.end_object();
        tokens.field("Property");
        tokens.start_object();
        tokens.scalar("Name", "VIN");
        tokens.scalar("Type", "Edm.String");
        tokens.end_object();
        tokens.end_object();

        let mut de = Deserializer::new(&mut tokens, ProtocolVersion::V3);
        let car: EntityType = de.parse().unwrap();

        assert_eq!(car.name, "Car");
        assert_eq!(car.key.as_ref().unwrap().property_names(), vec!["VIN"]);
        assert_eq!(car.properties.len(), 1);
        let vin = &car.properties[0];
        assert_eq!(vin.type_name, "Edm.String");
        assert!(vin.nullable);
        assert!(vin.unicode);
        assert!(!vin.fixed_length);
        assert_eq!(vin.primitive_type().unwrap(), EdmSimpleType::String);
    }

    #[test]
    fn test_property_facets() {
        let property: Property = parse_xml(
            r#"<Property Name="Price" Type="Edm.Decimal" Nullable="false" Precision="19"
                Scale="4" MaxLength="Max" ConcurrencyMode="Fixed" FixedLength="true"
                FC_TargetPath="SyndicationTitle" FC_ContentKind="html" FC_KeepInContent="false"
                StoreGeneratedPattern="Computed"/>"#,
            ProtocolVersion::V3,
        )
        .unwrap();

        assert!(!property.nullable);
        assert_eq!(property.precision, Some(19));
        assert_eq!(property.scale, Some(Scale::Value(4)));
        assert_eq!(property.max_length, Some(MaxLength::Max));
        assert_eq!(property.concurrency_mode, Some(ConcurrencyMode::Fixed));
        assert!(property.fixed_length);
        assert_eq!(property.fc_target_path.as_deref(), Some("SyndicationTitle"));
        assert_eq!(property.fc_content_kind.to_string(), "html");
        assert!(!property.fc_keep_in_content);
        assert_eq!(property.store_generated_pattern.to_string(), "Computed");
    }

    #[test]
    fn test_bad_facet_is_invalid_value() {
        let result: Result<Property> = parse_xml(
            r#"<Property Name="A" Type="Edm.String" MaxLength="huge"/>"#,
            ProtocolVersion::V4,
        );
        assert!(matches!(
            result,
            Err(Error::InvalidValue { ref field, .. }) if field == "MaxLength"
        ));
    }

    #[test]
    fn test_unknown_fields_in_entity_type_are_skipped() {
        let entity: EntityType = parse_xml(
            r#"<EntityType Name="Car" Color="red">
                <Documentation><Summary>A car</Summary></Documentation>
                <Property Name="VIN" Type="Edm.String"/>
            </EntityType>"#,
            ProtocolVersion::V3,
        )
        .unwrap();
        assert_eq!(entity.name, "Car");
        assert_eq!(entity.properties.len(), 1);
    }

    #[test]
    fn test_v4_only_annotation_ignored_under_v3() {
        let xml = r#"<EntityType Name="Person">
            <Annotation Term="Core.Description" String="A person"/>
        </EntityType>"#;

        let v3: EntityType = parse_xml(xml, ProtocolVersion::V3).unwrap();
        assert!(v3.annotation.is_none());

        let v4: EntityType = parse_xml(xml, ProtocolVersion::V4).unwrap();
        assert_eq!(v4.annotation.unwrap().term, "Core.Description");
    }

    #[test]
    fn test_navigation_property_variants() {
        let xml = r#"<NavigationProperty Name="Owner" Relationship="Auto.CarOwner"
            FromRole="Car" ToRole="Owner" Type="Auto.Person" Partner="Cars" Nullable="false">
            <ReferentialConstraint Property="OwnerId" ReferencedProperty="Id"/>
            <OnDelete Action="Cascade"/>
        </NavigationProperty>"#;

        let v3: NavigationProperty = parse_xml(xml, ProtocolVersion::V3).unwrap();
        match &v3.ext {
            NavigationPropertyExt::V3(nav) => {
                assert_eq!(nav.relationship, "Auto.CarOwner");
                assert_eq!(nav.to_role, "Owner");
            }
            NavigationPropertyExt::V4(_) => panic!("expected V3 navigation property"),
        }

        let v4: NavigationProperty = parse_xml(xml, ProtocolVersion::V4).unwrap();
        match &v4.ext {
            NavigationPropertyExt::V4(nav) => {
                assert_eq!(nav.type_name, "Auto.Person");
                assert_eq!(nav.partner.as_deref(), Some("Cars"));
                assert!(!nav.nullable);
                assert_eq!(nav.referential_constraints[0].referenced_property, "Id");
                assert_eq!(nav.on_delete.as_ref().unwrap().action, "Cascade");
            }
            NavigationPropertyExt::V3(_) => panic!("expected V4 navigation property"),
        }
    }

    #[test]
    fn test_complex_type_v4_members() {
        let xml = r#"<ComplexType Name="Address" BaseType="NS.Location" OpenType="true">
            <Property Name="Street" Type="Edm.String"/>
        </ComplexType>"#;

        let v3: ComplexType = parse_xml(xml, ProtocolVersion::V3).unwrap();
        assert!(v3.base_type().is_none());
        assert!(!v3.is_open_type());

        let v4: ComplexType = parse_xml(xml, ProtocolVersion::V4).unwrap();
        assert_eq!(v4.base_type(), Some("NS.Location"));
        assert!(v4.is_open_type());
        assert_eq!(v4.properties.len(), 1);
    }

    #[test]
    fn test_enum_type_members() {
        let enum_type: EnumType = parse_xml(
            r#"<EnumType Name="Color" UnderlyingType="Edm.Byte" IsFlags="true">
                <Member Name="Red" Value="1"/>
                <Member Name="Green" Value="2"/>
                <Member Name="Red" Value="4"/>
            </EnumType>"#,
            ProtocolVersion::V4,
        )
        .unwrap();

        assert!(enum_type.is_flags);
        assert_eq!(enum_type.members.len(), 3);
        assert_eq!(enum_type.members[2].value, Some(4));
        assert_eq!(
            enum_type.underlying_primitive().unwrap(),
            EdmSimpleType::Byte
        );
    }
}
