//! Protocol revision selector

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The two OData protocol revisions a CSDL document can follow.
///
/// The version is chosen by the caller once per parse and decides which
/// concrete node variants are built and which fields are recognized.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolVersion {
    #[serde(alias = "V3", alias = "3.0")]
    V3,
    #[default]
    #[serde(alias = "V4", alias = "4.0")]
    V4,
}

impl ProtocolVersion {
    /// All supported revisions, oldest first.
    pub const ALL: [ProtocolVersion; 2] = [ProtocolVersion::V3, ProtocolVersion::V4];

    /// Version number as written in the `DataServiceVersion` / `Version` attributes.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V3 => "3.0",
            ProtocolVersion::V4 => "4.0",
        }
    }

    pub fn is_v3(&self) -> bool {
        matches!(self, ProtocolVersion::V3)
    }

    pub fn is_v4(&self) -> bool {
        matches!(self, ProtocolVersion::V4)
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolVersion::V3 => write!(f, "V3"),
            ProtocolVersion::V4 => write!(f, "V4"),
        }
    }
}

impl FromStr for ProtocolVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v3" | "3" | "3.0" => Ok(ProtocolVersion::V3),
            "v4" | "4" | "4.0" | "4.01" => Ok(ProtocolVersion::V4),
            _ => Err(crate::Error::invalid_name(s, "expected a protocol version (v3 or v4)")),
        }
    }
}
