//! Structural types, properties, keys and enumerations

use crate::annotation::Annotation;
use crate::name::TypeRef;
use crate::primitive::EdmSimpleType;
use crate::version::ProtocolVersion;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `MaxLength` facet: a number or the literal `Max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxLength {
    Max,
    Length(u64),
}

impl FromStr for MaxLength {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("max") {
            return Ok(MaxLength::Max);
        }
        s.parse::<u64>()
            .map(MaxLength::Length)
            .map_err(|_| Error::invalid_facet("MaxLength", s))
    }
}

impl fmt::Display for MaxLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxLength::Max => write!(f, "Max"),
            MaxLength::Length(n) => write!(f, "{}", n),
        }
    }
}

/// `Scale` facet: a number, or `variable` / `floating` (V4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scale {
    Value(u32),
    Variable,
    Floating,
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("variable") {
            Ok(Scale::Variable)
        } else if s.eq_ignore_ascii_case("floating") {
            Ok(Scale::Floating)
        } else {
            s.parse::<u32>()
                .map(Scale::Value)
                .map_err(|_| Error::invalid_facet("Scale", s))
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scale::Value(n) => write!(f, "{}", n),
            Scale::Variable => write!(f, "variable"),
            Scale::Floating => write!(f, "floating"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    #[default]
    None,
    Fixed,
}

impl FromStr for ConcurrencyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "None" => Ok(ConcurrencyMode::None),
            "Fixed" => Ok(ConcurrencyMode::Fixed),
            other => Err(Error::invalid_facet("ConcurrencyMode", other)),
        }
    }
}

impl fmt::Display for ConcurrencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConcurrencyMode::None => write!(f, "None"),
            ConcurrencyMode::Fixed => write!(f, "Fixed"),
        }
    }
}

/// Content kind of a feed-customization mapping (`FC_ContentKind`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentKind {
    #[default]
    Text,
    Html,
    Xhtml,
}

impl FromStr for ContentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ContentKind::Text),
            "html" => Ok(ContentKind::Html),
            "xhtml" => Ok(ContentKind::Xhtml),
            _ => Err(Error::invalid_facet("FC_ContentKind", s)),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Text => write!(f, "text"),
            ContentKind::Html => write!(f, "html"),
            ContentKind::Xhtml => write!(f, "xhtml"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreGeneratedPattern {
    #[default]
    None,
    Identity,
    Computed,
}

impl FromStr for StoreGeneratedPattern {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "None" => Ok(StoreGeneratedPattern::None),
            "Identity" => Ok(StoreGeneratedPattern::Identity),
            "Computed" => Ok(StoreGeneratedPattern::Computed),
            other => Err(Error::invalid_facet("StoreGeneratedPattern", other)),
        }
    }
}

impl fmt::Display for StoreGeneratedPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreGeneratedPattern::None => write!(f, "None"),
            StoreGeneratedPattern::Identity => write!(f, "Identity"),
            StoreGeneratedPattern::Computed => write!(f, "Computed"),
        }
    }
}

/// A structural property of a complex or entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    /// Type reference, resolved by consumers
    pub type_name: String,
    pub nullable: bool,
    pub default_value: Option<String>,
    pub max_length: Option<MaxLength>,
    pub fixed_length: bool,
    pub precision: Option<u32>,
    pub scale: Option<Scale>,
    pub unicode: bool,
    pub collation: Option<String>,
    pub srid: Option<String>,
    pub concurrency_mode: Option<ConcurrencyMode>,
    pub fc_source_path: Option<String>,
    pub fc_target_path: Option<String>,
    pub fc_content_kind: ContentKind,
    pub fc_ns_prefix: Option<String>,
    pub fc_ns_uri: Option<String>,
    pub fc_keep_in_content: bool,
    pub store_generated_pattern: StoreGeneratedPattern,
    /// Only populated from V4 documents
    pub annotation: Option<Annotation>,
}

impl Default for Property {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_name: String::new(),
            nullable: true,
            default_value: None,
            max_length: None,
            fixed_length: false,
            precision: None,
            scale: None,
            unicode: true,
            collation: None,
            srid: None,
            concurrency_mode: None,
            fc_source_path: None,
            fc_target_path: None,
            fc_content_kind: ContentKind::Text,
            fc_ns_prefix: None,
            fc_ns_uri: None,
            fc_keep_in_content: true,
            store_generated_pattern: StoreGeneratedPattern::None,
            annotation: None,
        }
    }
}

impl Property {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        TypeRef::parse(&self.type_name)
    }

    pub fn is_collection(&self) -> bool {
        self.type_ref().is_collection
    }

    /// Resolve the (element) type against the primitive catalog.
    pub fn primitive_type(&self) -> Result<EdmSimpleType> {
        EdmSimpleType::resolve(&self.type_ref().element_type)
    }
}

/// V4 referential constraint on a navigation property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferentialConstraint {
    pub property: String,
    pub referenced_property: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDelete {
    pub action: String,
}

/// V3 navigation property: traverses an association between two roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V3NavigationProperty {
    pub relationship: String,
    pub from_role: String,
    pub to_role: String,
}

/// V4 navigation property: typed, with optional partner and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4NavigationProperty {
    pub type_name: String,
    pub nullable: bool,
    pub partner: Option<String>,
    pub contains_target: bool,
    pub referential_constraints: Vec<ReferentialConstraint>,
    pub on_delete: Option<OnDelete>,
    pub annotation: Option<Annotation>,
}

impl Default for V4NavigationProperty {
    fn default() -> Self {
        Self {
            type_name: String::new(),
            nullable: true,
            partner: None,
            contains_target: false,
            referential_constraints: Vec::new(),
            on_delete: None,
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationPropertyExt {
    V3(V3NavigationProperty),
    V4(V4NavigationProperty),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationProperty {
    pub name: String,
    pub ext: NavigationPropertyExt,
}

impl NavigationProperty {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => NavigationPropertyExt::V3(V3NavigationProperty::default()),
            ProtocolVersion::V4 => NavigationPropertyExt::V4(V4NavigationProperty::default()),
        };
        Self {
            name: String::new(),
            ext,
        }
    }

    /// Target type for V4 navigation properties. V3 targets go through the
    /// association and are not known without resolving it.
    pub fn target_type(&self) -> Option<TypeRef> {
        match &self.ext {
            NavigationPropertyExt::V3(_) => None,
            NavigationPropertyExt::V4(nav) => Some(TypeRef::parse(&nav.type_name)),
        }
    }
}

/// A key member. Order within the key is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRef {
    pub name: String,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKey {
    pub property_refs: Vec<PropertyRef>,
}

impl EntityKey {
    pub fn property_names(&self) -> Vec<&str> {
        self.property_refs.iter().map(|r| r.name.as_str()).collect()
    }
}

/// Capabilities shared by complex and entity types.
pub trait StructuredType {
    fn name(&self) -> &str;
    fn properties(&self) -> &[Property];
    fn navigation_properties(&self) -> &[NavigationProperty];
    fn base_type(&self) -> Option<&str>;
    fn is_abstract(&self) -> bool;
    fn is_open_type(&self) -> bool;
    fn annotation(&self) -> Option<&Annotation>;

    fn property(&self, name: &str) -> Option<&Property> {
        self.properties().iter().find(|p| p.name == name)
    }

    fn navigation_property(&self, name: &str) -> Option<&NavigationProperty> {
        self.navigation_properties().iter().find(|p| p.name == name)
    }
}

/// Members a complex type gains under V4.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V4ComplexType {
    pub is_abstract: bool,
    pub base_type: Option<String>,
    pub open_type: bool,
    pub navigation_properties: Vec<NavigationProperty>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplexTypeExt {
    V3,
    V4(V4ComplexType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexType {
    pub name: String,
    pub properties: Vec<Property>,
    pub ext: ComplexTypeExt,
}

impl ComplexType {
    pub fn new(version: ProtocolVersion) -> Self {
        let ext = match version {
            ProtocolVersion::V3 => ComplexTypeExt::V3,
            ProtocolVersion::V4 => ComplexTypeExt::V4(V4ComplexType::default()),
        };
        Self {
            name: String::new(),
            properties: Vec::new(),
            ext,
        }
    }
}

impl StructuredType for ComplexType {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }

    fn navigation_properties(&self) -> &[NavigationProperty] {
        match &self.ext {
            ComplexTypeExt::V3 => &[],
            ComplexTypeExt::V4(v4) => &v4.navigation_properties,
        }
    }

    fn base_type(&self) -> Option<&str> {
        match &self.ext {
            ComplexTypeExt::V3 => None,
            ComplexTypeExt::V4(v4) => v4.base_type.as_deref(),
        }
    }

    fn is_abstract(&self) -> bool {
        matches!(&self.ext, ComplexTypeExt::V4(v4) if v4.is_abstract)
    }

    fn is_open_type(&self) -> bool {
        matches!(&self.ext, ComplexTypeExt::V4(v4) if v4.open_type)
    }

    fn annotation(&self) -> Option<&Annotation> {
        match &self.ext {
            ComplexTypeExt::V3 => None,
            ComplexTypeExt::V4(v4) => v4.annotation.as_ref(),
        }
    }
}

/// An entity type. Unlike complex types, the abstract, base-type and
/// open-type flags exist under both revisions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityType {
    pub name: String,
    pub is_abstract: bool,
    pub base_type: Option<String>,
    pub open_type: bool,
    pub has_stream: bool,
    pub key: Option<EntityKey>,
    pub properties: Vec<Property>,
    pub navigation_properties: Vec<NavigationProperty>,
    /// Only populated from V4 documents
    pub annotation: Option<Annotation>,
}

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl StructuredType for EntityType {
    fn name(&self) -> &str {
        &self.name
    }

    fn properties(&self) -> &[Property] {
        &self.properties
    }

    fn navigation_properties(&self) -> &[NavigationProperty] {
        &self.navigation_properties
    }

    fn base_type(&self) -> Option<&str> {
        self.base_type.as_deref()
    }

    fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    fn is_open_type(&self) -> bool {
        self.open_type
    }

    fn annotation(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }
}

/// An enumeration member. Duplicate names or values are not rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<i64>,
    pub annotation: Option<Annotation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    /// Integral primitive type name; `Edm.Int32` when absent
    pub underlying_type: Option<String>,
    pub is_flags: bool,
    pub members: Vec<EnumMember>,
    pub annotation: Option<Annotation>,
}

impl EnumType {
    pub fn member(&self, name: &str) -> Option<&EnumMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The underlying integral type, defaulting to `Edm.Int32`.
    pub fn underlying_primitive(&self) -> Result<EdmSimpleType> {
        match &self.underlying_type {
            Some(name) => EdmSimpleType::resolve(name),
            None => Ok(EdmSimpleType::Int32),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_facet_defaults() {
        let p = Property::new("VIN", "Edm.String");
        assert!(p.nullable);
        assert!(p.unicode);
        assert!(!p.fixed_length);
        assert!(p.fc_keep_in_content);
        assert_eq!(p.fc_content_kind, ContentKind::Text);
        assert_eq!(p.store_generated_pattern, StoreGeneratedPattern::None);
        assert_eq!(p.primitive_type().unwrap(), EdmSimpleType::String);
    }

    #[test]
    fn test_facet_parsing() {
        assert_eq!("Max".parse::<MaxLength>().unwrap(), MaxLength::Max);
        assert_eq!("max".parse::<MaxLength>().unwrap(), MaxLength::Max);
        assert_eq!("40".parse::<MaxLength>().unwrap(), MaxLength::Length(40));
        assert!("forty".parse::<MaxLength>().is_err());

        assert_eq!("variable".parse::<Scale>().unwrap(), Scale::Variable);
        assert_eq!("4".parse::<Scale>().unwrap(), Scale::Value(4));

        assert_eq!("xhtml".parse::<ContentKind>().unwrap(), ContentKind::Xhtml);
        assert_eq!(
            "Identity".parse::<StoreGeneratedPattern>().unwrap(),
            StoreGeneratedPattern::Identity
        );
        assert!(matches!(
            "Optimistic".parse::<ConcurrencyMode>(),
            Err(Error::InvalidFacet { .. })
        ));
    }

    #[test]
    fn test_complex_type_v3_has_no_v4_capabilities() {
        let ct = ComplexType::new(ProtocolVersion::V3);
        assert!(ct.navigation_properties().is_empty());
        assert!(ct.base_type().is_none());
        assert!(!ct.is_abstract());
        assert!(!ct.is_open_type());
    }

    #[test]
    fn test_collection_property_resolves_element_type() {
        let p = Property::new("Tags", "Collection(Edm.String)");
        assert!(p.is_collection());
        assert_eq!(p.primitive_type().unwrap(), EdmSimpleType::String);

        let p = Property::new("Address", "NS.Address");
        assert!(matches!(
            p.primitive_type(),
            Err(Error::InvalidPrimitiveType(_))
        ));
    }
}
