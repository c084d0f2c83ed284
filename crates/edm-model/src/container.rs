//! Entity containers and their members

use crate::annotation::Annotation;
use crate::schema::Parameter;
use crate::version::ProtocolVersion;
use serde::{Deserialize, Serialize};

/// Binds a navigation property path to the entity set or singleton it targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPropertyBinding {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4EntitySet {
    pub include_in_service_document: bool,
    pub navigation_property_bindings: Vec<NavigationPropertyBinding>,
    pub annotation: Option<Annotation>,
}

impl Default for V4EntitySet {
    fn default() -> Self {
        Self {
            include_in_service_document: true,
            navigation_property_bindings: Vec::new(),
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntitySetExt {
    V3,
    V4(V4EntitySet),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    pub name: String,
    /// Qualified entity type name
    pub entity_type: String,
    pub ext: EntitySetExt,
}

impl EntitySet {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => EntitySetExt::V3,
            ProtocolVersion::V4 => EntitySetExt::V4(V4EntitySet::default()),
        };
        Self {
            name: String::new(),
            entity_type: String::new(),
            ext,
        }
    }

    /// V3 entity sets are always listed in the service document.
    pub fn include_in_service_document(&self) -> bool {
        match &self.ext {
            EntitySetExt::V3 => true,
            EntitySetExt::V4(v4) => v4.include_in_service_document,
        }
    }

    pub fn navigation_property_bindings(&self) -> &[NavigationPropertyBinding] {
        match &self.ext {
            EntitySetExt::V3 => &[],
            EntitySetExt::V4(v4) => &v4.navigation_property_bindings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3FunctionImport {
    pub return_type: Option<String>,
    pub entity_set: Option<String>,
    pub entity_set_path: Option<String>,
    pub is_composable: bool,
    pub is_side_effecting: bool,
    pub is_bindable: bool,
    pub is_always_bindable: bool,
    pub http_method: Option<String>,
    pub parameters: Vec<Parameter>,
}

impl Default for V3FunctionImport {
    fn default() -> Self {
        Self {
            return_type: None,
            entity_set: None,
            entity_set_path: None,
            is_composable: false,
            is_side_effecting: true,
            is_bindable: false,
            is_always_bindable: false,
            http_method: None,
            parameters: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4FunctionImport {
    /// Qualified name of the imported function
    pub function: String,
    pub entity_set: Option<String>,
    pub include_in_service_document: bool,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FunctionImportExt {
    V3(V3FunctionImport),
    V4(V4FunctionImport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionImport {
    pub name: String,
    pub ext: FunctionImportExt,
}

impl FunctionImport {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => FunctionImportExt::V3(V3FunctionImport::default()),
            ProtocolVersion::V4 => FunctionImportExt::V4(V4FunctionImport::default()),
        };
        Self {
            name: String::new(),
            ext,
        }
    }

    pub fn entity_set(&self) -> Option<&str> {
        match &self.ext {
            FunctionImportExt::V3(v3) => v3.entity_set.as_deref(),
            FunctionImportExt::V4(v4) => v4.entity_set.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionImport {
    pub name: String,
    /// Qualified name of the imported action
    pub action: String,
    pub entity_set: Option<String>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Singleton {
    pub name: String,
    pub type_name: String,
    pub navigation_property_bindings: Vec<NavigationPropertyBinding>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSetEnd {
    pub role: String,
    pub entity_set: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationSet {
    pub name: String,
    /// Qualified association name
    pub association: String,
    pub ends: Vec<AssociationSetEnd>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3EntityContainer {
    pub association_sets: Vec<AssociationSet>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4EntityContainer {
    pub singletons: Vec<Singleton>,
    pub action_imports: Vec<ActionImport>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityContainerExt {
    V3(V3EntityContainer),
    V4(V4EntityContainer),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContainer {
    pub name: String,
    /// Qualified name of the container this one extends
    pub extends: Option<String>,
    pub lazy_loading_enabled: Option<bool>,
    pub is_default_entity_container: bool,
    pub entity_sets: Vec<EntitySet>,
    pub function_imports: Vec<FunctionImport>,
    pub ext: EntityContainerExt,
}

impl EntityContainer {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => EntityContainerExt::V3(V3EntityContainer::default()),
            ProtocolVersion::V4 => EntityContainerExt::V4(V4EntityContainer::default()),
        };
        Self {
            name: String::new(),
            extends: None,
            lazy_loading_enabled: None,
            is_default_entity_container: false,
            entity_sets: Vec::new(),
            function_imports: Vec::new(),
            ext,
        }
    }

    pub fn is_default_entity_container(&self) -> bool {
        self.is_default_entity_container
    }

    pub fn entity_set(&self, name: &str) -> Option<&EntitySet> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    /// First function import with the given name.
    pub fn function_import(&self, name: &str) -> Option<&FunctionImport> {
        self.function_imports.iter().find(|f| f.name == name)
    }

    /// All overloads sharing a name, in document order.
    pub fn function_imports_named(&self, name: &str) -> Vec<&FunctionImport> {
        self.function_imports
            .iter()
            .filter(|f| f.name == name)
            .collect()
    }

    pub fn association_sets(&self) -> &[AssociationSet] {
        match &self.ext {
            EntityContainerExt::V3(v3) => &v3.association_sets,
            EntityContainerExt::V4(_) => &[],
        }
    }

    pub fn singletons(&self) -> &[Singleton] {
        match &self.ext {
            EntityContainerExt::V3(_) => &[],
            EntityContainerExt::V4(v4) => &v4.singletons,
        }
    }

    pub fn singleton(&self, name: &str) -> Option<&Singleton> {
        self.singletons().iter().find(|s| s.name == name)
    }

    pub fn action_imports(&self) -> &[ActionImport] {
        match &self.ext {
            EntityContainerExt::V3(_) => &[],
            EntityContainerExt::V4(v4) => &v4.action_imports,
        }
    }

    pub fn action_import(&self, name: &str) -> Option<&ActionImport> {
        self.action_imports().iter().find(|a| a.name == name)
    }

    pub fn annotation(&self) -> Option<&Annotation> {
        match &self.ext {
            EntityContainerExt::V3(_) => None,
            EntityContainerExt::V4(v4) => v4.annotation.as_ref(),
        }
    }
}
