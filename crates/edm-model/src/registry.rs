//! Version-keyed registry of parsed documents
//!
//! One document is registered per protocol version. The navigation-link
//! index for a version is built lazily by [`MetadataRegistry::ensure_initialized`]
//! and cached until a new document replaces the registered one.

use crate::container::{EntityContainer, NavigationPropertyBinding};
use crate::document::RootDocument;
use crate::inheritance::{effective_navigation_properties, entity_type_chain};
use crate::types::NavigationPropertyExt;
use crate::version::ProtocolVersion;
use crate::{Error, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One navigation link of an entity set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationLink {
    /// Navigation property name
    pub name: String,
    /// Entity set (or singleton) the link leads to, when the container says
    pub target: Option<String>,
}

/// Links reachable from a single entity set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySetLinks {
    pub entity_type: String,
    pub links: Vec<NavigationLink>,
}

impl EntitySetLinks {
    pub fn link(&self, name: &str) -> Option<&NavigationLink> {
        self.links.iter().find(|l| l.name == name)
    }
}

/// Navigation links of every entity set in a document, keyed by set name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkIndex {
    entity_sets: HashMap<String, EntitySetLinks>,
}

impl LinkIndex {
    /// Build the index for all containers of `doc`.
    /// When several containers declare a set with the same name, the first wins.
    /// A set whose entity type cannot be resolved in `doc` (declared in a
    /// referenced document, or with a broken base type) is kept without links.
    pub fn build(doc: &RootDocument) -> Result<Self> {
        let mut entity_sets = HashMap::new();

        for schema in doc.schemas() {
            for container in schema.entity_containers() {
                for set in &container.entity_sets {
                    if entity_sets.contains_key(&set.name) {
                        continue;
                    }
                    let chain = match entity_type_chain(doc, &set.entity_type) {
                        Ok(chain) => chain,
                        Err(err @ (Error::UnresolvedType(_) | Error::Inheritance(_))) => {
                            warn!("Entity set {} has no navigation links: {}", set.name, err);
                            Vec::new()
                        }
                        Err(err) => return Err(err),
                    };
                    let links = effective_navigation_properties(&chain)
                        .into_iter()
                        .map(|nav| NavigationLink {
                            name: nav.name.clone(),
                            target: link_target(
                                container,
                                set.navigation_property_bindings(),
                                &nav.name,
                                &nav.ext,
                            ),
                        })
                        .collect();

                    debug!("Indexed entity set {} ({})", set.name, set.entity_type);
                    entity_sets.insert(
                        set.name.clone(),
                        EntitySetLinks {
                            entity_type: set.entity_type.clone(),
                            links,
                        },
                    );
                }
            }
        }

        Ok(Self { entity_sets })
    }

    pub fn entity_set(&self, name: &str) -> Option<&EntitySetLinks> {
        self.entity_sets.get(name)
    }

    /// Target set of a navigation link, if the container binds one.
    pub fn target(&self, entity_set: &str, navigation_property: &str) -> Option<&str> {
        self.entity_set(entity_set)?
            .link(navigation_property)?
            .target
            .as_deref()
    }

    pub fn entity_set_names(&self) -> impl Iterator<Item = &str> {
        self.entity_sets.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entity_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_sets.is_empty()
    }
}

/// V3 resolves the target through the association set whose end plays the
/// link's `ToRole`; V4 through the set's navigation property bindings.
fn link_target(
    container: &EntityContainer,
    bindings: &[NavigationPropertyBinding],
    name: &str,
    ext: &NavigationPropertyExt,
) -> Option<String> {
    match ext {
        NavigationPropertyExt::V3(v3) => container
            .association_sets()
            .iter()
            .filter(|a| a.association == v3.relationship)
            .flat_map(|a| a.ends.iter())
            .find(|end| end.role == v3.to_role)
            .map(|end| end.entity_set.clone()),
        NavigationPropertyExt::V4(_) => bindings
            .iter()
            .find(|b| b.path == name)
            .map(|b| b.target.clone()),
    }
}

/// Concurrent registry of documents and link indexes, one per protocol version.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    documents: DashMap<ProtocolVersion, Arc<RootDocument>>,
    links: DashMap<ProtocolVersion, Arc<LinkIndex>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own protocol version, replacing any
    /// previous one and dropping its cached link index.
    pub fn register(&self, doc: RootDocument) -> Arc<RootDocument> {
        let version = doc.protocol_version();
        let doc = Arc::new(doc);
        self.documents.insert(version, Arc::clone(&doc));
        self.links.remove(&version);
        debug!("Registered {} document", version);
        doc
    }

    pub fn get(&self, version: ProtocolVersion) -> Option<Arc<RootDocument>> {
        self.documents.get(&version).map(|d| Arc::clone(d.value()))
    }

    pub fn contains(&self, version: ProtocolVersion) -> bool {
        self.documents.contains_key(&version)
    }

    pub fn is_initialized(&self, version: ProtocolVersion) -> bool {
        self.links.contains_key(&version)
    }

    /// Link index for `version`, building it on first use.
    /// Concurrent callers for the same version build it once.
    pub fn ensure_initialized(&self, version: ProtocolVersion) -> Result<Arc<LinkIndex>> {
        if let Some(existing) = self.links.get(&version) {
            return Ok(Arc::clone(existing.value()));
        }

        let doc = self.get(version).ok_or(Error::NotRegistered(version))?;
        let entry = self.links.entry(version).or_try_insert_with(|| {
            let index = LinkIndex::build(&doc)?;
            info!(
                "Initialized {} link index with {} entity sets",
                version,
                index.len()
            );
            Ok::<_, Error>(Arc::new(index))
        })?;

        Ok(Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{
        AssociationSet, AssociationSetEnd, EntityContainerExt, EntitySet, EntitySetExt,
    };
    use crate::schema::{Schema, SchemaExt};
    use crate::types::{EntityType, NavigationProperty};

    fn v3_doc() -> RootDocument {
        let mut schema = Schema::new(ProtocolVersion::V3);
        schema.namespace = "Auto".to_string();

        let mut car = EntityType::new("Car");
        let mut owner = NavigationProperty::new(ProtocolVersion::V3);
        owner.name = "Owner".to_string();
        if let NavigationPropertyExt::V3(v3) = &mut owner.ext {
            v3.relationship = "Auto.CarOwner".to_string();
            v3.from_role = "Car".to_string();
            v3.to_role = "Owner".to_string();
        }
        car.navigation_properties.push(owner);
        schema.entity_types.push(car);
        schema.entity_types.push(EntityType::new("Person"));

        let mut container = EntityContainer::new(ProtocolVersion::V3);
        container.name = "Garage".to_string();
        container.is_default_entity_container = true;
        for (name, ty) in [("Cars", "Auto.Car"), ("People", "Auto.Person")] {
            let mut set = EntitySet::new(ProtocolVersion::V3);
            set.name = name.to_string();
            set.entity_type = ty.to_string();
            container.entity_sets.push(set);
        }
        if let EntityContainerExt::V3(v3) = &mut container.ext {
            v3.association_sets.push(AssociationSet {
                name: "CarOwners".to_string(),
                association: "Auto.CarOwner".to_string(),
                ends: vec![
                    AssociationSetEnd {
                        role: "Car".to_string(),
                        entity_set: "Cars".to_string(),
                    },
                    AssociationSetEnd {
                        role: "Owner".to_string(),
                        entity_set: "People".to_string(),
                    },
                ],
            });
        }
        if let SchemaExt::V3(v3) = &mut schema.ext {
            v3.entity_containers.push(container);
        }

        let mut doc = RootDocument::new(ProtocolVersion::V3);
        doc.data_services.schemas.push(schema);
        doc
    }

    fn v4_doc() -> RootDocument {
        let mut schema = Schema::new(ProtocolVersion::V4);
        schema.namespace = "Trip".to_string();

        let mut person = EntityType::new("Person");
        let mut friends = NavigationProperty::new(ProtocolVersion::V4);
        friends.name = "Friends".to_string();
        person.navigation_properties.push(friends);
        schema.entity_types.push(person);

        let mut container = EntityContainer::new(ProtocolVersion::V4);
        container.name = "Container".to_string();
        let mut people = EntitySet::new(ProtocolVersion::V4);
        people.name = "People".to_string();
        people.entity_type = "Trip.Person".to_string();
        if let EntitySetExt::V4(v4) = &mut people.ext {
            v4.navigation_property_bindings.push(NavigationPropertyBinding {
                path: "Friends".to_string(),
                target: "People".to_string(),
            });
        }
        container.entity_sets.push(people);
        if let SchemaExt::V4(v4) = &mut schema.ext {
            v4.entity_container = Some(container);
        }

        let mut doc = RootDocument::new(ProtocolVersion::V4);
        doc.data_services.schemas.push(schema);
        doc
    }

    #[test]
    fn test_ensure_initialized_is_idempotent() {
        let registry = MetadataRegistry::new();
        registry.register(v3_doc());
        assert!(!registry.is_initialized(ProtocolVersion::V3));

        let first = registry.ensure_initialized(ProtocolVersion::V3).unwrap();
        let second = registry.ensure_initialized(ProtocolVersion::V3).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.target("Cars", "Owner"), Some("People"));
        assert!(first.entity_set("People").unwrap().links.is_empty());
    }

    #[test]
    fn test_unresolvable_entity_type_keeps_other_sets() {
        let mut doc = v3_doc();
        if let SchemaExt::V3(v3) = &mut doc.data_services.schemas[0].ext {
            let mut external = EntitySet::new(ProtocolVersion::V3);
            external.name = "Externals".to_string();
            external.entity_type = "Other.Thing".to_string();
            v3.entity_containers[0].entity_sets.push(external);
        }
        let mut truck = EntityType::new("Truck");
        truck.base_type = Some("Auto.Missing".to_string());
        doc.data_services.schemas[0].entity_types.push(truck);
        if let SchemaExt::V3(v3) = &mut doc.data_services.schemas[0].ext {
            let mut trucks = EntitySet::new(ProtocolVersion::V3);
            trucks.name = "Trucks".to_string();
            trucks.entity_type = "Auto.Truck".to_string();
            v3.entity_containers[0].entity_sets.push(trucks);
        }

        let index = LinkIndex::build(&doc).unwrap();
        assert_eq!(index.len(), 4);
        assert_eq!(index.target("Cars", "Owner"), Some("People"));
        let externals = index.entity_set("Externals").unwrap();
        assert_eq!(externals.entity_type, "Other.Thing");
        assert!(externals.links.is_empty());
        assert!(index.entity_set("Trucks").unwrap().links.is_empty());
    }

    #[test]
    fn test_versions_are_isolated() {
        let registry = MetadataRegistry::new();
        registry.register(v4_doc());

        assert!(matches!(
            registry.ensure_initialized(ProtocolVersion::V3),
            Err(Error::NotRegistered(ProtocolVersion::V3))
        ));

        let index = registry.ensure_initialized(ProtocolVersion::V4).unwrap();
        assert_eq!(index.target("People", "Friends"), Some("People"));
        assert!(!registry.is_initialized(ProtocolVersion::V3));
    }

    #[test]
    fn test_register_drops_cached_index() {
        let registry = MetadataRegistry::new();
        registry.register(v4_doc());
        let before = registry.ensure_initialized(ProtocolVersion::V4).unwrap();

        registry.register(v4_doc());
        assert!(!registry.is_initialized(ProtocolVersion::V4));
        let after = registry.ensure_initialized(ProtocolVersion::V4).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_concurrent_initialization() {
        let registry = Arc::new(MetadataRegistry::new());
        registry.register(v3_doc());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.ensure_initialized(ProtocolVersion::V3))
            })
            .collect();

        let indexes: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(indexes.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
