//! Top-level parse entry points

use crate::config::{CsdlConfig, InputFormat};
use crate::de::Deserializer;
use crate::json::JsonTokenizer;
use crate::token::TokenSource;
use crate::xml::XmlTokenizer;
use crate::Result;
use edm_model::{ProtocolVersion, RootDocument};
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Parse an EDMX/CSDL XML document into a model of the given version.
pub fn parse_root_document<R: BufRead>(reader: R, version: ProtocolVersion) -> Result<RootDocument> {
    MetadataParser::new(CsdlConfig::new(version)).parse_xml(reader)
}

/// Metadata parser bound to one configuration
#[derive(Debug, Clone, Default)]
pub struct MetadataParser {
    config: CsdlConfig,
}

impl MetadataParser {
    pub fn new(config: CsdlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CsdlConfig {
        &self.config
    }

    pub fn version(&self) -> ProtocolVersion {
        self.config.version
    }

    /// Parse from a reader in the configured input format.
    pub fn parse<R: BufRead>(&self, reader: R) -> Result<RootDocument> {
        match self.config.format {
            InputFormat::Xml => self.parse_xml(reader),
            InputFormat::Json => self.parse_json(reader),
        }
    }

    pub fn parse_xml<R: BufRead>(&self, reader: R) -> Result<RootDocument> {
        let mut tokens = XmlTokenizer::new(reader);
        self.parse_tokens(&mut tokens)
    }

    pub fn parse_json<R: Read>(&self, reader: R) -> Result<RootDocument> {
        let mut tokens = JsonTokenizer::from_reader(reader)?;
        self.parse_tokens(&mut tokens)
    }

    pub fn parse_str(&self, input: &str) -> Result<RootDocument> {
        self.parse(input.as_bytes())
    }

    /// Parse a file. The configured format is used unless it is the default
    /// and the extension says `.json`.
    pub fn parse_file(&self, path: &Path) -> Result<RootDocument> {
        debug!("Parsing metadata file: {:?}", path);
        let reader = BufReader::new(File::open(path)?);
        match (self.config.format, InputFormat::from_path(path)) {
            (InputFormat::Xml, InputFormat::Json) => self.parse_json(reader),
            _ => self.parse(reader),
        }
    }

    /// Parse the root document from any token source.
    pub fn parse_tokens(&self, source: &mut dyn TokenSource) -> Result<RootDocument> {
        let version = self.config.version;
        debug!("Parsing metadata document as {}", version);

        let mut de = Deserializer::new(source, version).with_max_depth(self.config.max_depth);
        let root: RootDocument = de.parse()?;

        debug!(
            "Parsed {} document: {} schemas, {} entity types, {} references",
            version,
            root.schemas().len(),
            root.schemas()
                .iter()
                .map(|s| s.entity_types.len())
                .sum::<usize>(),
            root.references().len()
        );
        Ok(root)
    }
}
