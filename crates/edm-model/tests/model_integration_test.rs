//! Integration tests for edm-model
//!
//! Builds small documents by hand and exercises the cross-node lookups that
//! consumers depend on.

use edm_model::container::{EntityContainerExt, FunctionImportExt};
use edm_model::inheritance::{effective_key, effective_properties, entity_type_chain};
use edm_model::schema::SchemaExt;
use edm_model::types::NavigationPropertyExt;
use edm_model::{
    EdmSimpleType, EntityContainer, EntityKey, EntitySet, EntityType, Error, FunctionImport,
    MetadataRegistry, NavigationProperty, ProtocolVersion, Property, PropertyRef, ResolvedType,
    RootDocument, Schema, TypeRef,
};

fn key(names: &[&str]) -> EntityKey {
    EntityKey {
        property_refs: names
            .iter()
            .map(|n| PropertyRef {
                name: n.to_string(),
                alias: None,
            })
            .collect(),
    }
}

/// Two partial schemas sharing the `Auto` namespace, the second redeclaring
/// `Car` with an extra property.
fn partial_schemas_document() -> RootDocument {
    let mut first = Schema::new(ProtocolVersion::V3);
    first.namespace = "Auto".to_string();
    let mut vehicle = EntityType::new("Vehicle");
    vehicle.key = Some(key(&["VIN"]));
    vehicle.properties.push(Property::new("VIN", "Edm.String"));
    first.entity_types.push(vehicle);

    let mut car = EntityType::new("Car");
    car.base_type = Some("Auto.Vehicle".to_string());
    first.entity_types.push(car);

    let mut second = Schema::new(ProtocolVersion::V3);
    second.namespace = "Auto".to_string();
    let mut car = EntityType::new("Car");
    car.base_type = Some("Auto.Vehicle".to_string());
    car.properties.push(Property::new("Doors", "Edm.Int32"));
    let mut owner = NavigationProperty::new(ProtocolVersion::V3);
    owner.name = "Owner".to_string();
    car.navigation_properties.push(owner);
    second.entity_types.push(car);

    let mut container = EntityContainer::new(ProtocolVersion::V3);
    container.name = "Garage".to_string();
    container.is_default_entity_container = true;
    let mut cars = EntitySet::new(ProtocolVersion::V3);
    cars.name = "Cars".to_string();
    cars.entity_type = "Auto.Car".to_string();
    container.entity_sets.push(cars);
    for set in ["Cars", "Vehicles"] {
        let mut import = FunctionImport::new(ProtocolVersion::V3);
        import.name = "Find".to_string();
        if let FunctionImportExt::V3(v3) = &mut import.ext {
            v3.entity_set = Some(set.to_string());
        }
        container.function_imports.push(import);
    }
    if let SchemaExt::V3(v3) = &mut second.ext {
        v3.entity_containers.push(container);
    }

    let mut doc = RootDocument::new(ProtocolVersion::V3);
    doc.version = "1.0".to_string();
    doc.data_services.schemas.push(first);
    doc.data_services.schemas.push(second);
    doc
}

#[test]
fn test_last_declaration_wins_across_partial_schemas() {
    let doc = partial_schemas_document();
    let car = doc.entity_type("Auto.Car").unwrap();
    assert_eq!(car.properties.len(), 1);
    assert_eq!(car.properties[0].name, "Doors");
}

#[test]
fn test_function_import_lookup_is_first_match() {
    let doc = partial_schemas_document();
    let container = doc.default_entity_container().unwrap();
    assert_eq!(container.name, "Garage");
    assert_eq!(
        container.function_import("Find").unwrap().entity_set(),
        Some("Cars")
    );
}

#[test]
fn test_effective_members_follow_the_chain() -> anyhow::Result<()> {
    let doc = partial_schemas_document();
    let chain = entity_type_chain(&doc, "Auto.Car")?;

    let names: Vec<_> = effective_properties(&chain)
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["VIN", "Doors"]);
    assert_eq!(effective_key(&chain).unwrap().property_names(), vec!["VIN"]);
    Ok(())
}

#[test]
fn test_resolve_type_respects_document_version() {
    let doc = partial_schemas_document();
    assert!(matches!(
        doc.resolve_type(&TypeRef::parse("Edm.DateTime")),
        Ok(ResolvedType::Primitive(EdmSimpleType::DateTime))
    ));
    assert!(matches!(
        doc.resolve_type(&TypeRef::parse("Edm.Date")),
        Err(Error::UnsupportedInVersion { .. })
    ));
    assert!(matches!(
        doc.resolve_type(&TypeRef::parse("Collection(Auto.Vehicle)")),
        Ok(ResolvedType::Entity(_))
    ));
}

#[test]
fn test_document_serializes_to_json() -> anyhow::Result<()> {
    let doc = partial_schemas_document();
    let json = serde_json::to_string(&doc)?;
    let back: RootDocument = serde_json::from_str(&json)?;
    assert_eq!(back, doc);
    Ok(())
}

#[test]
fn test_registry_builds_links_once_per_version() -> anyhow::Result<()> {
    let registry = MetadataRegistry::new();
    registry.register(partial_schemas_document());

    let index = registry.ensure_initialized(ProtocolVersion::V3)?;
    let cars = index.entity_set("Cars").unwrap();
    assert_eq!(cars.entity_type, "Auto.Car");
    assert_eq!(cars.links.len(), 1);
    // no association set binds the Owner role
    assert_eq!(index.target("Cars", "Owner"), None);

    assert!(registry.ensure_initialized(ProtocolVersion::V4).is_err());
    Ok(())
}

#[test]
fn test_v3_nodes_answer_v4_capabilities_empty() {
    let doc = partial_schemas_document();
    assert!(doc.references().is_empty());

    let schema = &doc.schemas()[1];
    assert!(schema.actions().is_empty());
    assert!(schema.type_definitions().is_empty());

    let container = &schema.entity_containers()[0];
    assert!(matches!(container.ext, EntityContainerExt::V3(_)));
    assert!(container.singletons().is_empty());

    let nav = &schema.entity_type("Car").unwrap().navigation_properties[0];
    assert!(matches!(nav.ext, NavigationPropertyExt::V3(_)));
    assert!(nav.target_type().is_none());
}
