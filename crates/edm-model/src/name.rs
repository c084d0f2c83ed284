//! Qualified names and type references
//!
//! Model nodes refer to each other by `Namespace.Name` strings. These are
//! kept verbatim on the nodes and only split when a consumer resolves them.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COLLECTION_PREFIX: &str = "Collection(";

/// A `Namespace.Name` pair. The namespace may itself contain dots; the
/// local name is everything after the last one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub namespace: String,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Split a qualified name at its last dot.
    pub fn parse(qualified: &str) -> Result<Self> {
        let qualified = qualified.trim();
        let (namespace, name) = qualified
            .rsplit_once('.')
            .ok_or_else(|| Error::invalid_name(qualified, "missing namespace qualifier"))?;

        if namespace.is_empty() || name.is_empty() {
            return Err(Error::invalid_name(
                qualified,
                "namespace and name must both be non-empty",
            ));
        }

        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl FromStr for QualifiedName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A type reference as written on properties, parameters and return types,
/// e.g. `Edm.String` or `Collection(NS.Address)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Element type name with any `Collection(...)` wrapper removed.
    pub element_type: String,
    pub is_collection: bool,
}

impl TypeRef {
    pub fn parse(type_name: &str) -> Self {
        let trimmed = type_name.trim();
        match trimmed
            .strip_prefix(COLLECTION_PREFIX)
            .and_then(|rest| rest.strip_suffix(')'))
        {
            Some(inner) => Self {
                element_type: inner.trim().to_string(),
                is_collection: true,
            },
            None => Self {
                element_type: trimmed.to_string(),
                is_collection: false,
            },
        }
    }

    /// Qualified name of the element type.
    pub fn qualified_name(&self) -> Result<QualifiedName> {
        QualifiedName::parse(&self.element_type)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_collection {
            write!(f, "{}{})", COLLECTION_PREFIX, self.element_type)
        } else {
            write!(f, "{}", self.element_type)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name_splits_at_last_dot() {
        let qn = QualifiedName::parse("Microsoft.Test.OData.Services.Customer").unwrap();
        assert_eq!(qn.namespace, "Microsoft.Test.OData.Services");
        assert_eq!(qn.name, "Customer");
        assert_eq!(qn.to_string(), "Microsoft.Test.OData.Services.Customer");
    }

    #[test]
    fn test_qualified_name_rejects_unqualified() {
        assert!(QualifiedName::parse("Customer").is_err());
        assert!(QualifiedName::parse("NS.").is_err());
        assert!(QualifiedName::parse(".Customer").is_err());
    }

    #[test]
    fn test_type_ref_collection() {
        let t = TypeRef::parse("Collection(NS.Address)");
        assert!(t.is_collection);
        assert_eq!(t.element_type, "NS.Address");
        assert_eq!(t.to_string(), "Collection(NS.Address)");

        let t = TypeRef::parse("Edm.String");
        assert!(!t.is_collection);
        assert_eq!(t.qualified_name().unwrap().name, "String");
    }
}
