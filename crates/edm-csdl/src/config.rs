//! Parser configuration
//!
//! Configuration can be built in code or loaded from a YAML or JSON file:
//!
//! ```yaml
//! version: v3
//! format: xml
//! max_depth: 32
//! ```

use crate::de::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};
use edm_model::ProtocolVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::trace;

/// Serialization a metadata document arrives in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    #[default]
    Xml,
    Json,
}

impl InputFormat {
    /// Guess the format from a file extension, falling back to XML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Xml,
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Xml => write!(f, "xml"),
            InputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xml" | "edmx" => Ok(InputFormat::Xml),
            "json" => Ok(InputFormat::Json),
            other => Err(Error::Config(format!("Unknown input format: {}", other))),
        }
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Settings for one [`MetadataParser`](crate::MetadataParser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsdlConfig {
    /// Protocol revision every node is built for
    pub version: ProtocolVersion,
    pub format: InputFormat,
    /// Maximum object nesting accepted before the parse is aborted
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for CsdlConfig {
    fn default() -> Self {
        Self {
            version: ProtocolVersion::default(),
            format: InputFormat::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CsdlConfig {
    pub fn new(version: ProtocolVersion) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_format(mut self, format: InputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| Error::Config(format!("YAML parse error: {}", e)))?;
        config.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Config(format!("JSON parse error: {}", e)))?;
        config.validate()
    }

    /// Load from a `.yaml`/`.yml` or JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        trace!("Loading parser config from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        if path
            .extension()
            .map(|e| e == "yaml" || e == "yml")
            .unwrap_or(false)
        {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        }
    }

    fn validate(self) -> Result<Self> {
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        Ok(self)
    }
}
