//! Base-type chain resolution for structured types
//!
//! Entity and complex types name their base type by qualified name. The
//! chain is resolved through the document on demand; nothing is linked at
//! parse time.

use crate::document::RootDocument;
use crate::types::{ComplexType, EntityKey, EntityType, NavigationProperty, Property, StructuredType};
use crate::{Error, Result};
use tracing::trace;

/// Walk up the base types starting at `leaf`.
/// Returns types ordered from the root of the hierarchy down to `leaf`.
fn resolve_chain<'a, T, F>(leaf: &'a T, lookup: F) -> Result<Vec<&'a T>>
where
    T: StructuredType,
    F: Fn(&str) -> Option<&'a T>,
{
    let mut chain = vec![leaf];
    let mut current = leaf;

    while let Some(base_name) = current.base_type() {
        let base = lookup(base_name).ok_or_else(|| {
            Error::Inheritance(format!(
                "Base type {} of {} is not declared",
                base_name,
                current.name()
            ))
        })?;

        if chain.iter().any(|seen| std::ptr::eq(*seen, base)) {
            return Err(Error::Inheritance(format!(
                "Circular base type detected: {} -> {}",
                current.name(),
                base_name
            )));
        }

        chain.push(base);
        current = base;
    }

    // Base -> leaf order
    chain.reverse();

    trace!(
        "Resolved base type chain for {}: {:?}",
        leaf.name(),
        chain.iter().map(|t| t.name()).collect::<Vec<_>>()
    );

    Ok(chain)
}

/// Base type chain of an entity type, root first.
pub fn entity_type_chain<'a>(
    doc: &'a RootDocument,
    qualified_name: &str,
) -> Result<Vec<&'a EntityType>> {
    let leaf = doc.resolve_entity_type(qualified_name)?;
    resolve_chain(leaf, |name| doc.entity_type(name))
}

/// Base type chain of a complex type, root first. V3 complex types have no
/// base type, so their chain is just the type itself.
pub fn complex_type_chain<'a>(
    doc: &'a RootDocument,
    qualified_name: &str,
) -> Result<Vec<&'a ComplexType>> {
    let leaf = doc.resolve_complex_type(qualified_name)?;
    resolve_chain(leaf, |name| doc.complex_type(name))
}

/// Properties visible on the most derived type of `chain`.
/// Base declarations come first; a derived declaration with the same name
/// replaces the base one in place.
pub fn effective_properties<'a, T: StructuredType>(chain: &[&'a T]) -> Vec<&'a Property> {
    let mut result: Vec<&'a Property> = Vec::new();
    for structured in chain {
        for property in structured.properties() {
            match result.iter().position(|p| p.name == property.name) {
                Some(idx) => result[idx] = property,
                None => result.push(property),
            }
        }
    }
    result
}

pub fn effective_navigation_properties<'a, T: StructuredType>(
    chain: &[&'a T],
) -> Vec<&'a NavigationProperty> {
    let mut result: Vec<&'a NavigationProperty> = Vec::new();
    for structured in chain {
        for nav in structured.navigation_properties() {
            match result.iter().position(|n| n.name == nav.name) {
                Some(idx) => result[idx] = nav,
                None => result.push(nav),
            }
        }
    }
    result
}

/// The key of the most derived type that declares one.
pub fn effective_key<'a>(chain: &[&'a EntityType]) -> Option<&'a EntityKey> {
    chain.iter().rev().find_map(|t| t.key.as_ref())
}
