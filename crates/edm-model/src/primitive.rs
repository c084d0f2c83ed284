//! Built-in primitive type catalog
//!
//! Every `Edm.*` scalar type the protocol knows about, tagged with the
//! revisions it may appear under, an optional canonical format pattern
//! (chrono `strftime` syntax) and the host type that carries its values.
//! The table is static and read-only, so it can be consulted from any
//! number of concurrent parses.

use crate::version::ProtocolVersion;
use crate::{Error, Result};
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Namespace of the built-in primitive types.
pub const EDM_NAMESPACE: &str = "Edm";

const ALL_VERSIONS: &[ProtocolVersion] = &[ProtocolVersion::V3, ProtocolVersion::V4];
const V3_ONLY: &[ProtocolVersion] = &[ProtocolVersion::V3];
const V4_ONLY: &[ProtocolVersion] = &[ProtocolVersion::V4];

/// Host runtime representation a primitive type's values are carried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HostType {
    Bytes,
    Bool,
    UnsignedByte,
    SignedByte,
    /// Date and time, with or without a UTC offset
    Timestamp,
    Duration,
    Decimal,
    Single,
    Double,
    Int16,
    Int32,
    Int64,
    Text,
    Uuid,
    Geospatial,
    Stream,
}

/// Built-in primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdmSimpleType {
    Binary,
    Boolean,
    Byte,
    SByte,
    /// Wall-clock date and time (V3)
    DateTime,
    DateTimeOffset,
    /// Wall-clock date (V4)
    Date,
    /// Duration (V3 spelling)
    Time,
    /// Duration (V4 spelling)
    Duration,
    Decimal,
    Single,
    Double,
    Int16,
    Int32,
    Int64,
    String,
    Guid,
    Stream,
    Geography,
    GeographyPoint,
    GeographyLineString,
    GeographyPolygon,
    GeographyMultiPoint,
    GeographyMultiLineString,
    GeographyMultiPolygon,
    GeographyCollection,
    Geometry,
    GeometryPoint,
    GeometryLineString,
    GeometryPolygon,
    GeometryMultiPoint,
    GeometryMultiLineString,
    GeometryMultiPolygon,
    GeometryCollection,
}

struct TypeInfo {
    name: &'static str,
    versions: &'static [ProtocolVersion],
    format: Option<&'static str>,
    host: HostType,
}

const fn info(
    name: &'static str,
    versions: &'static [ProtocolVersion],
    format: Option<&'static str>,
    host: HostType,
) -> TypeInfo {
    TypeInfo {
        name,
        versions,
        format,
        host,
    }
}

/// Catalog order. Host-type resolution picks the first entry that matches.
static ALL_TYPES: [EdmSimpleType; 34] = [
    EdmSimpleType::Binary,
    EdmSimpleType::Boolean,
    EdmSimpleType::Byte,
    EdmSimpleType::SByte,
    EdmSimpleType::DateTime,
    EdmSimpleType::DateTimeOffset,
    EdmSimpleType::Date,
    EdmSimpleType::Time,
    EdmSimpleType::Duration,
    EdmSimpleType::Decimal,
    EdmSimpleType::Single,
    EdmSimpleType::Double,
    EdmSimpleType::Int16,
    EdmSimpleType::Int32,
    EdmSimpleType::Int64,
    EdmSimpleType::String,
    EdmSimpleType::Guid,
    EdmSimpleType::Stream,
    EdmSimpleType::Geography,
    EdmSimpleType::GeographyPoint,
    EdmSimpleType::GeographyLineString,
    EdmSimpleType::GeographyPolygon,
    EdmSimpleType::GeographyMultiPoint,
    EdmSimpleType::GeographyMultiLineString,
    EdmSimpleType::GeographyMultiPolygon,
    EdmSimpleType::GeographyCollection,
    EdmSimpleType::Geometry,
    EdmSimpleType::GeometryPoint,
    EdmSimpleType::GeometryLineString,
    EdmSimpleType::GeometryPolygon,
    EdmSimpleType::GeometryMultiPoint,
    EdmSimpleType::GeometryMultiLineString,
    EdmSimpleType::GeometryMultiPolygon,
    EdmSimpleType::GeometryCollection,
];

static BY_QUALIFIED_NAME: Lazy<HashMap<String, EdmSimpleType>> = Lazy::new(|| {
    ALL_TYPES
        .iter()
        .map(|t| (t.qualified_name(), *t))
        .collect()
});

impl EdmSimpleType {
    const fn info(self) -> TypeInfo {
        use EdmSimpleType::*;
        match self {
            Binary => info("Binary", ALL_VERSIONS, None, HostType::Bytes),
            Boolean => info("Boolean", ALL_VERSIONS, None, HostType::Bool),
            Byte => info("Byte", ALL_VERSIONS, None, HostType::UnsignedByte),
            SByte => info("SByte", ALL_VERSIONS, None, HostType::SignedByte),
            DateTime => info(
                "DateTime",
                V3_ONLY,
                Some("%Y-%m-%dT%H:%M:%S"),
                HostType::Timestamp,
            ),
            DateTimeOffset => info(
                "DateTimeOffset",
                ALL_VERSIONS,
                Some("%Y-%m-%dT%H:%M:%S%:z"),
                HostType::Timestamp,
            ),
            Date => info("Date", V4_ONLY, Some("%Y-%m-%d"), HostType::Timestamp),
            Time => info("Time", V3_ONLY, None, HostType::Duration),
            Duration => info("Duration", V4_ONLY, None, HostType::Duration),
            Decimal => info("Decimal", ALL_VERSIONS, None, HostType::Decimal),
            Single => info("Single", ALL_VERSIONS, None, HostType::Single),
            Double => info("Double", ALL_VERSIONS, None, HostType::Double),
            Int16 => info("Int16", ALL_VERSIONS, None, HostType::Int16),
            Int32 => info("Int32", ALL_VERSIONS, None, HostType::Int32),
            Int64 => info("Int64", ALL_VERSIONS, None, HostType::Int64),
            String => info("String", ALL_VERSIONS, None, HostType::Text),
            Guid => info("Guid", ALL_VERSIONS, None, HostType::Uuid),
            Stream => info("Stream", ALL_VERSIONS, None, HostType::Stream),
            Geography => info("Geography", ALL_VERSIONS, None, HostType::Geospatial),
            GeographyPoint => info("GeographyPoint", ALL_VERSIONS, None, HostType::Geospatial),
            GeographyLineString => {
                info("GeographyLineString", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeographyPolygon => info("GeographyPolygon", ALL_VERSIONS, None, HostType::Geospatial),
            GeographyMultiPoint => {
                info("GeographyMultiPoint", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeographyMultiLineString => info(
                "GeographyMultiLineString",
                ALL_VERSIONS,
                None,
                HostType::Geospatial,
            ),
            GeographyMultiPolygon => {
                info("GeographyMultiPolygon", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeographyCollection => {
                info("GeographyCollection", ALL_VERSIONS, None, HostType::Geospatial)
            }
            Geometry => info("Geometry", ALL_VERSIONS, None, HostType::Geospatial),
            GeometryPoint => info("GeometryPoint", ALL_VERSIONS, None, HostType::Geospatial),
            GeometryLineString => {
                info("GeometryLineString", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeometryPolygon => info("GeometryPolygon", ALL_VERSIONS, None, HostType::Geospatial),
            GeometryMultiPoint => {
                info("GeometryMultiPoint", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeometryMultiLineString => info(
                "GeometryMultiLineString",
                ALL_VERSIONS,
                None,
                HostType::Geospatial,
            ),
            GeometryMultiPolygon => {
                info("GeometryMultiPolygon", ALL_VERSIONS, None, HostType::Geospatial)
            }
            GeometryCollection => {
                info("GeometryCollection", ALL_VERSIONS, None, HostType::Geospatial)
            }
        }
    }

    /// Every catalog entry, in catalog order.
    pub fn all() -> &'static [EdmSimpleType] {
        &ALL_TYPES
    }

    /// Local name without the `Edm.` prefix.
    pub fn name(self) -> &'static str {
        self.info().name
    }

    /// Fully qualified name, e.g. `Edm.Int32`.
    pub fn qualified_name(self) -> String {
        format!("{}.{}", EDM_NAMESPACE, self.name())
    }

    /// Revisions under which this type may appear.
    pub fn versions(self) -> &'static [ProtocolVersion] {
        self.info().versions
    }

    pub fn supports(self, version: ProtocolVersion) -> bool {
        self.versions().contains(&version)
    }

    /// Canonical literal format used by value converters, if any.
    pub fn format(self) -> Option<&'static str> {
        self.info().format
    }

    pub fn host_type(self) -> HostType {
        self.info().host
    }

    pub fn is_geospatial(self) -> bool {
        self.host_type() == HostType::Geospatial
    }

    /// Resolve a qualified name such as `Edm.String`.
    pub fn resolve(qualified_name: &str) -> Result<Self> {
        BY_QUALIFIED_NAME
            .get(qualified_name.trim())
            .copied()
            .ok_or_else(|| Error::invalid_primitive(qualified_name))
    }

    /// Resolve a qualified name and reject types the revision does not know.
    pub fn resolve_for_version(qualified_name: &str, version: ProtocolVersion) -> Result<Self> {
        let resolved = Self::resolve(qualified_name)?;
        if !resolved.supports(version) {
            return Err(Error::UnsupportedInVersion {
                name: resolved.qualified_name(),
                version,
            });
        }
        Ok(resolved)
    }

    /// Pick the primitive type for a host type under the given revision.
    ///
    /// Timestamps resolve to the offset-less wall-clock type of the revision;
    /// use [`EdmSimpleType::from_value`] when the offset is known.
    pub fn from_host_type(host: HostType, version: ProtocolVersion) -> Result<Self> {
        if host == HostType::Timestamp {
            return Ok(Self::wall_clock(version));
        }

        ALL_TYPES
            .iter()
            .copied()
            .find(|t| t.host_type() == host && t.supports(version))
            .ok_or_else(|| Error::invalid_primitive(format!("{:?}", host)))
    }

    /// Pick the primitive type for a value under the given revision.
    pub fn from_value(value: &PrimitiveValue, version: ProtocolVersion) -> Result<Self> {
        match value {
            PrimitiveValue::TimestampWithOffset(_) => Ok(EdmSimpleType::DateTimeOffset),
            PrimitiveValue::Timestamp(_) => Ok(Self::wall_clock(version)),
            other => Self::from_host_type(other.host_type(), version),
        }
    }

    fn wall_clock(version: ProtocolVersion) -> Self {
        match version {
            ProtocolVersion::V3 => EdmSimpleType::DateTime,
            ProtocolVersion::V4 => EdmSimpleType::Date,
        }
    }
}

impl fmt::Display for EdmSimpleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", EDM_NAMESPACE, self.name())
    }
}

/// Resolve a qualified primitive type name.
pub fn resolve(qualified_name: &str) -> Result<EdmSimpleType> {
    EdmSimpleType::resolve(qualified_name)
}

/// Whether the name denotes one of the Geography/Geometry types.
/// Unknown names are simply not geospatial.
pub fn is_geospatial(qualified_name: &str) -> bool {
    EdmSimpleType::resolve(qualified_name)
        .map(EdmSimpleType::is_geospatial)
        .unwrap_or(false)
}

/// A typed primitive value in its host representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    Binary(Vec<u8>),
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    /// Date and time without a UTC offset
    Timestamp(NaiveDateTime),
    TimestampWithOffset(DateTime<FixedOffset>),
    Duration(TimeDelta),
    Decimal(f64),
    Single(f32),
    Double(f64),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    String(String),
    Guid(Uuid),
}

impl PrimitiveValue {
    pub fn host_type(&self) -> HostType {
        match self {
            PrimitiveValue::Binary(_) => HostType::Bytes,
            PrimitiveValue::Boolean(_) => HostType::Bool,
            PrimitiveValue::Byte(_) => HostType::UnsignedByte,
            PrimitiveValue::SByte(_) => HostType::SignedByte,
            PrimitiveValue::Timestamp(_) | PrimitiveValue::TimestampWithOffset(_) => {
                HostType::Timestamp
            }
            PrimitiveValue::Duration(_) => HostType::Duration,
            PrimitiveValue::Decimal(_) => HostType::Decimal,
            PrimitiveValue::Single(_) => HostType::Single,
            PrimitiveValue::Double(_) => HostType::Double,
            PrimitiveValue::Int16(_) => HostType::Int16,
            PrimitiveValue::Int32(_) => HostType::Int32,
            PrimitiveValue::Int64(_) => HostType::Int64,
            PrimitiveValue::String(_) => HostType::Text,
            PrimitiveValue::Guid(_) => HostType::Uuid,
        }
    }

    /// Format a timestamp value with the canonical pattern of its type.
    pub fn format_timestamp(&self, version: ProtocolVersion) -> Option<String> {
        let edm_type = EdmSimpleType::from_value(self, version).ok()?;
        let pattern = edm_type.format()?;
        match self {
            PrimitiveValue::Timestamp(ts) => Some(ts.format(pattern).to_string()),
            PrimitiveValue::TimestampWithOffset(ts) => Some(ts.format(pattern).to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_resolve_by_qualified_name() {
        assert_eq!(EdmSimpleType::resolve("Edm.Int32").unwrap(), EdmSimpleType::Int32);
        assert_eq!(
            EdmSimpleType::resolve("Edm.GeographyPoint").unwrap(),
            EdmSimpleType::GeographyPoint
        );
        assert!(matches!(
            EdmSimpleType::resolve("Edm.Banana"),
            Err(Error::InvalidPrimitiveType(_))
        ));
        // Unqualified names are not primitive type references
        assert!(EdmSimpleType::resolve("Int32").is_err());
    }

    #[test]
    fn test_version_exclusive_types() {
        assert!(EdmSimpleType::DateTime.supports(ProtocolVersion::V3));
        assert!(!EdmSimpleType::DateTime.supports(ProtocolVersion::V4));
        assert!(EdmSimpleType::Date.supports(ProtocolVersion::V4));
        assert!(!EdmSimpleType::Date.supports(ProtocolVersion::V3));
        assert!(EdmSimpleType::Time.supports(ProtocolVersion::V3));
        assert!(!EdmSimpleType::Duration.supports(ProtocolVersion::V3));

        let exclusive = EdmSimpleType::all()
            .iter()
            .filter(|t| t.versions().len() == 1)
            .count();
        assert_eq!(exclusive, 4);

        assert!(matches!(
            EdmSimpleType::resolve_for_version("Edm.DateTime", ProtocolVersion::V4),
            Err(Error::UnsupportedInVersion { .. })
        ));
    }

    #[test]
    fn test_timestamp_value_disambiguation() {
        let naive = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        let with_offset = DateTime::<FixedOffset>::parse_from_rfc3339("2024-03-01T12:30:00+02:00")
            .unwrap();

        let plain = PrimitiveValue::Timestamp(naive);
        let offset = PrimitiveValue::TimestampWithOffset(with_offset);

        assert_eq!(
            EdmSimpleType::from_value(&plain, ProtocolVersion::V3).unwrap(),
            EdmSimpleType::DateTime
        );
        assert_eq!(
            EdmSimpleType::from_value(&plain, ProtocolVersion::V4).unwrap(),
            EdmSimpleType::Date
        );
        for version in ProtocolVersion::ALL {
            assert_eq!(
                EdmSimpleType::from_value(&offset, version).unwrap(),
                EdmSimpleType::DateTimeOffset
            );
        }
        assert_eq!(
            plain.format_timestamp(ProtocolVersion::V3).unwrap(),
            "2024-03-01T12:30:00"
        );
        assert_eq!(plain.format_timestamp(ProtocolVersion::V4).unwrap(), "2024-03-01");
    }

    #[test]
    fn test_duration_resolves_per_version() {
        let value = PrimitiveValue::Duration(TimeDelta::seconds(90));
        assert_eq!(
            EdmSimpleType::from_value(&value, ProtocolVersion::V3).unwrap(),
            EdmSimpleType::Time
        );
        assert_eq!(
            EdmSimpleType::from_value(&value, ProtocolVersion::V4).unwrap(),
            EdmSimpleType::Duration
        );
    }

    #[test]
    fn test_host_values_round_trip_to_names() {
        let guid = PrimitiveValue::Guid(Uuid::nil());
        assert_eq!(
            EdmSimpleType::from_value(&guid, ProtocolVersion::V4)
                .unwrap()
                .qualified_name(),
            "Edm.Guid"
        );
        let text = PrimitiveValue::String("x".to_string());
        assert_eq!(
            EdmSimpleType::from_value(&text, ProtocolVersion::V3).unwrap(),
            EdmSimpleType::String
        );
    }

    #[test]
    fn test_is_geospatial() {
        assert!(is_geospatial("Edm.Geometry"));
        assert!(is_geospatial("Edm.GeographyMultiPolygon"));
        assert!(!is_geospatial("Edm.String"));
        assert!(!is_geospatial("Edm.Unknown"));
    }
}
