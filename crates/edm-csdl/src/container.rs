//! Entity container parsers

use crate::Result;
use crate::de::{CsdlDeserialize, Deserializer, FieldTable, dispatch};
use edm_model::container::{
    AssociationSetEnd, EntityContainerExt, EntitySetExt, FunctionImportExt, V3EntityContainer,
    V3FunctionImport, V4EntityContainer, V4EntitySet, V4FunctionImport,
};
use edm_model::schema::ReturnType;
use edm_model::{
    ActionImport, AssociationSet, EntityContainer, EntitySet, FunctionImport,
    NavigationPropertyBinding, Singleton,
};

pub(crate) static NAVIGATION_PROPERTY_BINDING_FIELDS: &FieldTable<NavigationPropertyBinding> = &[
    ("Path", |de, b| {
        b.path = de.read_string()?;
        Ok(())
    }),
    ("Target", |de, b| {
        b.target = de.read_string()?;
        Ok(())
    }),
];

impl CsdlDeserialize for NavigationPropertyBinding {
    const CONSTRUCT: &'static str = "NavigationPropertyBinding";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut binding = NavigationPropertyBinding::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(NAVIGATION_PROPERTY_BINDING_FIELDS, de, field, &mut binding)
        })?;
        Ok(binding)
    }
}

pub(crate) static ENTITY_SET_FIELDS: &FieldTable<EntitySet> = &[
    ("Name", |de, s| {
        s.name = de.read_string()?;
        Ok(())
    }),
    ("EntityType", |de, s| {
        s.entity_type = de.read_string()?;
        Ok(())
    }),
];

pub(crate) static V4_ENTITY_SET_FIELDS: &FieldTable<V4EntitySet> = &[
    ("IncludeInServiceDocument", |de, s| {
        s.include_in_service_document = de.read_bool()?;
        Ok(())
    }),
    ("NavigationPropertyBinding", |de, s| {
        s.navigation_property_bindings.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, s| {
        s.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for EntitySet {
    const CONSTRUCT: &'static str = "EntitySet";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut set = EntitySet::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ENTITY_SET_FIELDS, de, field, &mut set)? {
                return Ok(true);
            }
            match &mut set.ext {
                EntitySetExt::V3 => Ok(false),
                EntitySetExt::V4(v4) => dispatch(V4_ENTITY_SET_FIELDS, de, field, v4),
            }
        })?;
        Ok(set)
    }
}

pub(crate) static FUNCTION_IMPORT_FIELDS: &FieldTable<FunctionImport> = &[("Name", |de, f| {
    f.name = de.read_string()?;
    Ok(())
})];

pub(crate) static V3_FUNCTION_IMPORT_FIELDS: &FieldTable<V3FunctionImport> = &[
    // Either a type name attribute or a nested ReturnType element
    ("ReturnType", |de, f| {
        f.return_type = if de.peek_is_object()? {
            let return_type: ReturnType = de.parse()?;
            Some(return_type.type_name)
        } else {
            Some(de.read_string()?)
        };
        Ok(())
    }),
    ("EntitySet", |de, f| {
        f.entity_set = Some(de.read_string()?);
        Ok(())
    }),
    ("EntitySetPath", |de, f| {
        f.entity_set_path = Some(de.read_string()?);
        Ok(())
    }),
    ("IsComposable", |de, f| {
        f.is_composable = de.read_bool()?;
        Ok(())
    }),
    ("IsSideEffecting", |de, f| {
        f.is_side_effecting = de.read_bool()?;
        Ok(())
    }),
    ("IsBindable", |de, f| {
        f.is_bindable = de.read_bool()?;
        Ok(())
    }),
    ("IsAlwaysBindable", |de, f| {
        f.is_always_bindable = de.read_bool()?;
        Ok(())
    }),
    ("HttpMethod", |de, f| {
        f.http_method = Some(de.read_string()?);
        Ok(())
    }),
    ("Parameter", |de, f| {
        f.parameters.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V4_FUNCTION_IMPORT_FIELDS: &FieldTable<V4FunctionImport> = &[
    ("Function", |de, f| {
        f.function = de.read_string()?;
        Ok(())
    }),
    ("EntitySet", |de, f| {
        f.entity_set = Some(de.read_string()?);
        Ok(())
    }),
    ("IncludeInServiceDocument", |de, f| {
        f.include_in_service_document = de.read_bool()?;
        Ok(())
    }),
    ("Annotation", |de, f| {
        f.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for FunctionImport {
    const CONSTRUCT: &'static str = "FunctionImport";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut import = FunctionImport::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(FUNCTION_IMPORT_FIELDS, de, field, &mut import)? {
                return Ok(true);
            }
            match &mut import.ext {
                FunctionImportExt::V3(v3) => dispatch(V3_FUNCTION_IMPORT_FIELDS, de, field, v3),
                FunctionImportExt::V4(v4) => dispatch(V4_FUNCTION_IMPORT_FIELDS, de, field, v4),
            }
        })?;
        Ok(import)
    }
}

pub(crate) static ACTION_IMPORT_FIELDS: &FieldTable<ActionImport> = &[
    ("Name", |de, a| {
        a.name = de.read_string()?;
        Ok(())
    }),
    ("Action", |de, a| {
        a.action = de.read_string()?;
        Ok(())
    }),
    ("EntitySet", |de, a| {
        a.entity_set = Some(de.read_string()?);
        Ok(())
    }),
    ("Annotation", |de, a| {
        a.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for ActionImport {
    const CONSTRUCT: &'static str = "ActionImport";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut import = ActionImport::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ACTION_IMPORT_FIELDS, de, field, &mut import)
        })?;
        Ok(import)
    }
}

pub(crate) static SINGLETON_FIELDS: &FieldTable<Singleton> = &[
    ("Name", |de, s| {
        s.name = de.read_string()?;
        Ok(())
    }),
    ("Type", |de, s| {
        s.type_name = de.read_string()?;
        Ok(())
    }),
    ("NavigationPropertyBinding", |de, s| {
        s.navigation_property_bindings.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, s| {
        s.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for Singleton {
    const CONSTRUCT: &'static str = "Singleton";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut singleton = Singleton::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(SINGLETON_FIELDS, de, field, &mut singleton)
        })?;
        Ok(singleton)
    }
}

pub(crate) static ASSOCIATION_SET_END_FIELDS: &FieldTable<AssociationSetEnd> = &[
    ("Role", |de, e| {
        e.role = de.read_string()?;
        Ok(())
    }),
    ("EntitySet", |de, e| {
        e.entity_set = de.read_string()?;
        Ok(())
    }),
];

impl CsdlDeserialize for AssociationSetEnd {
    const CONSTRUCT: &'static str = "End";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut end = AssociationSetEnd::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ASSOCIATION_SET_END_FIELDS, de, field, &mut end)
        })?;
        Ok(end)
    }
}

pub(crate) static ASSOCIATION_SET_FIELDS: &FieldTable<AssociationSet> = &[
    ("Name", |de, a| {
        a.name = de.read_string()?;
        Ok(())
    }),
    ("Association", |de, a| {
        a.association = de.read_string()?;
        Ok(())
    }),
    ("End", |de, a| {
        a.ends.push(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for AssociationSet {
    const CONSTRUCT: &'static str = "AssociationSet";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut set = AssociationSet::default();
        de.read_object(Self::CONSTRUCT, |de, field| {
            dispatch(ASSOCIATION_SET_FIELDS, de, field, &mut set)
        })?;
        Ok(set)
    }
}

pub(crate) static ENTITY_CONTAINER_FIELDS: &FieldTable<EntityContainer> = &[
    ("Name", |de, c| {
        c.name = de.read_string()?;
        Ok(())
    }),
    ("Extends", |de, c| {
        c.extends = Some(de.read_string()?);
        Ok(())
    }),
    ("LazyLoadingEnabled", |de, c| {
        c.lazy_loading_enabled = Some(de.read_bool()?);
        Ok(())
    }),
    ("IsDefaultEntityContainer", |de, c| {
        c.is_default_entity_container = de.read_bool()?;
        Ok(())
    }),
    ("EntitySet", |de, c| {
        c.entity_sets.push(de.parse()?);
        Ok(())
    }),
    ("FunctionImport", |de, c| {
        c.function_imports.push(de.parse()?);
        Ok(())
    }),
];

pub(crate) static V3_ENTITY_CONTAINER_FIELDS: &FieldTable<V3EntityContainer> =
    &[("AssociationSet", |de, c| {
        c.association_sets.push(de.parse()?);
        Ok(())
    })];

pub(crate) static V4_ENTITY_CONTAINER_FIELDS: &FieldTable<V4EntityContainer> = &[
    ("Singleton", |de, c| {
        c.singletons.push(de.parse()?);
        Ok(())
    }),
    ("ActionImport", |de, c| {
        c.action_imports.push(de.parse()?);
        Ok(())
    }),
    ("Annotation", |de, c| {
        c.annotation = Some(de.parse()?);
        Ok(())
    }),
];

impl CsdlDeserialize for EntityContainer {
    const CONSTRUCT: &'static str = "EntityContainer";

    fn deserialize(de: &mut Deserializer<'_>) -> Result<Self> {
        let mut container = EntityContainer::new(de.version());
        de.read_object(Self::CONSTRUCT, |de, field| {
            if dispatch(ENTITY_CONTAINER_FIELDS, de, field, &mut container)? {
                return Ok(true);
            }
            match &mut container.ext {
                EntityContainerExt::V3(v3) => dispatch(V3_ENTITY_CONTAINER_FIELDS, de, field, v3),
                EntityContainerExt::V4(v4) => dispatch(V4_ENTITY_CONTAINER_FIELDS, de, field, v4),
            }
        })?;
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlTokenizer;
    use edm_model::ProtocolVersion;

    fn parse_xml<T: CsdlDeserialize>(xml: &str, version: ProtocolVersion) -> T {
        let mut tokens = XmlTokenizer::new(xml.as_bytes());
        let mut de = Deserializer::new(&mut tokens, version);
        de.parse().unwrap()
    }

    const CONTAINER: &str = r#"<EntityContainer Name="Garage" IsDefaultEntityContainer="true"
            LazyLoadingEnabled="1">
        <EntitySet Name="Cars" EntityType="Auto.Car" IncludeInServiceDocument="false">
            <NavigationPropertyBinding Path="Owner" Target="People"/>
        </EntitySet>
        <AssociationSet Name="CarOwners" Association="Auto.CarOwner">
            <End Role="Car" EntitySet="Cars"/>
            <End Role="Owner" EntitySet="People"/>
        </AssociationSet>
        <Singleton Name="Me" Type="Auto.Person"/>
        <ActionImport Name="Wash" Action="Auto.Wash"/>
        <FunctionImport Name="Find" EntitySet="Cars" ReturnType="Collection(Auto.Car)"
            Function="Auto.Find" HttpMethod="GET">
            <Parameter Name="Make" Type="Edm.String" Mode="In"/>
        </FunctionImport>
    </EntityContainer>"#;

    #[test]
    fn test_v3_container() {
        let container: EntityContainer = parse_xml(CONTAINER, ProtocolVersion::V3);
        assert_eq!(container.name, "Garage");
        assert!(container.is_default_entity_container());
        assert_eq!(container.lazy_loading_enabled, Some(true));

        let cars = container.entity_set("Cars").unwrap();
        assert!(cars.include_in_service_document());
        assert!(cars.navigation_property_bindings().is_empty());

        assert_eq!(container.association_sets().len(), 1);
        assert_eq!(container.association_sets()[0].ends[1].entity_set, "People");
        assert!(container.singletons().is_empty());
        assert!(container.action_imports().is_empty());

        let find = container.function_import("Find").unwrap();
        match &find.ext {
            FunctionImportExt::V3(v3) => {
                assert_eq!(v3.return_type.as_deref(), Some("Collection(Auto.Car)"));
                assert_eq!(v3.http_method.as_deref(), Some("GET"));
                assert_eq!(v3.parameters[0].mode.as_deref(), Some("In"));
            }
            FunctionImportExt::V4(_) => panic!("expected V3 function import"),
        }
    }

    #[test]
    fn test_v4_container() {
        let container: EntityContainer = parse_xml(CONTAINER, ProtocolVersion::V4);
        let cars = container.entity_set("Cars").unwrap();
        assert!(!cars.include_in_service_document());
        assert_eq!(cars.navigation_property_bindings()[0].target, "People");

        assert!(container.association_sets().is_empty());
        assert_eq!(container.singleton("Me").unwrap().type_name, "Auto.Person");
        assert_eq!(container.action_import("Wash").unwrap().action, "Auto.Wash");

        let find = container.function_import("Find").unwrap();
        assert_eq!(find.entity_set(), Some("Cars"));
        match &find.ext {
            FunctionImportExt::V4(v4) => assert_eq!(v4.function, "Auto.Find"),
            FunctionImportExt::V3(_) => panic!("expected V4 function import"),
        }
    }

    #[test]
    fn test_v3_return_type_element() {
        let import: FunctionImport = parse_xml(
            r#"<FunctionImport Name="Count"><ReturnType Type="Edm.Int32"/></FunctionImport>"#,
            ProtocolVersion::V3,
        );
        match import.ext {
            FunctionImportExt::V3(v3) => assert_eq!(v3.return_type.as_deref(), Some("Edm.Int32")),
            FunctionImportExt::V4(_) => panic!("expected V3 function import"),
        }
    }
}
