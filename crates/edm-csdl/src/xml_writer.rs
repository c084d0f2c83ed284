//! Token to EDMX/CSDL XML emitter
//!
//! The inverse of the XML tokenizer. Scalar fields written before an
//! object's first child become attributes; later scalars become text-only
//! child elements and the field `""` becomes text content.

use crate::token::{TokenKind, TokenSource};
use crate::writer::to_tokens;
use crate::{Error, Result};
use edm_model::{ProtocolVersion, RootDocument};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

const EDMX_ELEMENTS: [&str; 4] = ["Reference", "DataServices", "Include", "IncludeAnnotations"];

fn edmx_namespace(version: ProtocolVersion) -> &'static str {
    match version {
        ProtocolVersion::V3 => "http://schemas.microsoft.com/ado/2007/06/edmx",
        ProtocolVersion::V4 => "http://docs.oasis-open.org/odata/ns/edmx",
    }
}

fn edm_namespace(version: ProtocolVersion) -> &'static str {
    match version {
        ProtocolVersion::V3 => "http://schemas.microsoft.com/ado/2009/11/edm",
        ProtocolVersion::V4 => "http://docs.oasis-open.org/odata/ns/edm",
    }
}

const METADATA_NAMESPACE: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// An element whose start tag has not been written yet, or is already open.
struct Frame {
    name: String,
    start: Option<BytesStart<'static>>,
}

/// Streams tokens out as an indented XML document.
pub struct XmlWriter {
    version: ProtocolVersion,
    indent: usize,
}

impl XmlWriter {
    pub fn new(version: ProtocolVersion) -> Self {
        Self { version, indent: 2 }
    }

    /// Spaces per nesting level; zero writes everything on one line.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Drain `source` into an XML string.
    pub fn write_tokens(&self, source: &mut dyn TokenSource) -> Result<String> {
        let mut writer = if self.indent > 0 {
            Writer::new_with_indent(Vec::new(), b' ', self.indent)
        } else {
            Writer::new(Vec::new())
        };
        let mut stack: Vec<Frame> = Vec::new();
        let mut field: Option<String> = None;
        let mut offset = 0;

        write_event(
            &mut writer,
            Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
            offset,
        )?;

        while let Some(token) = source.next_token()? {
            offset = token.offset;
            match token.kind {
                TokenKind::FieldName(name) => field = Some(name),
                TokenKind::StartObject => {
                    let name = match (field.take(), stack.is_empty()) {
                        (None, true) => "edmx:Edmx".to_string(),
                        (Some(name), false) => self.element_name(&name, &stack),
                        (_, _) => return Err(unexpected(offset, "field name", "start of object")),
                    };
                    open_pending(&mut writer, &mut stack, offset)?;
                    let start = self.start_tag(&name);
                    stack.push(Frame {
                        name,
                        start: Some(start),
                    });
                }
                TokenKind::Value(value) => {
                    let name = field
                        .take()
                        .ok_or_else(|| unexpected(offset, "field name", "value"))?;
                    let frame = stack
                        .last_mut()
                        .ok_or_else(|| unexpected(offset, "start of object", "value"))?;
                    if !name.is_empty() {
                        let key = self.attribute_name(&frame.name, &name);
                        if let Some(start) = frame.start.as_mut() {
                            start.push_attribute((key.as_str(), value.as_str()));
                            continue;
                        }
                    }

                    open_pending(&mut writer, &mut stack, offset)?;
                    if !name.is_empty() {
                        write_event(
                            &mut writer,
                            Event::Start(BytesStart::new(name.as_str())),
                            offset,
                        )?;
                    }
                    write_event(&mut writer, Event::Text(BytesText::new(&value)), offset)?;
                    if !name.is_empty() {
                        write_event(
                            &mut writer,
                            Event::End(BytesEnd::new(name.as_str())),
                            offset,
                        )?;
                    }
                }
                TokenKind::EndObject => {
                    let frame = stack
                        .pop()
                        .ok_or_else(|| unexpected(offset, "start of object", "end of object"))?;
                    match frame.start {
                        Some(start) => write_event(&mut writer, Event::Empty(start), offset)?,
                        None => write_event(
                            &mut writer,
                            Event::End(BytesEnd::new(frame.name)),
                            offset,
                        )?,
                    }
                    if stack.is_empty() {
                        break;
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::UnexpectedEnd {
                path: stack
                    .iter()
                    .map(|f| f.name.as_str())
                    .collect::<Vec<_>>()
                    .join("/"),
                offset,
            });
        }

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::Config(format!("Emitted XML is not UTF-8: {}", e)))
    }

    fn element_name(&self, field: &str, stack: &[Frame]) -> String {
        let under_edmx = stack
            .last()
            .map(|parent| parent.name.starts_with("edmx:"))
            .unwrap_or(false);
        if under_edmx && EDMX_ELEMENTS.contains(&field) {
            format!("edmx:{}", field)
        } else {
            field.to_string()
        }
    }

    fn attribute_name(&self, element: &str, field: &str) -> String {
        let versioned = matches!(field, "DataServiceVersion" | "MaxDataServiceVersion");
        if self.version.is_v3() && element == "edmx:DataServices" && versioned {
            format!("m:{}", field)
        } else {
            field.to_string()
        }
    }

    fn start_tag(&self, name: &str) -> BytesStart<'static> {
        let mut start = BytesStart::new(name.to_string());
        match name {
            "edmx:Edmx" => {
                start.push_attribute(("xmlns:edmx", edmx_namespace(self.version)));
            }
            "edmx:DataServices" if self.version.is_v3() => {
                start.push_attribute(("xmlns:m", METADATA_NAMESPACE));
            }
            "Schema" => {
                start.push_attribute(("xmlns", edm_namespace(self.version)));
            }
            _ => {}
        }
        start
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>, offset: usize) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::xml(offset, e))
}

/// Write the start tag of the innermost element if it is still pending.
fn open_pending(writer: &mut Writer<Vec<u8>>, stack: &mut [Frame], offset: usize) -> Result<()> {
    if let Some(start) = stack.last_mut().and_then(|frame| frame.start.take()) {
        write_event(writer, Event::Start(start), offset)?;
    }
    Ok(())
}

fn unexpected(offset: usize, expected: &str, found: &str) -> Error {
    Error::UnexpectedToken {
        path: "xml".to_string(),
        offset,
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// Serialize a model as an EDMX document.
pub fn to_xml_string(root: &RootDocument) -> Result<String> {
    let version = root.protocol_version();
    let mut tokens = to_tokens(root);
    let xml = XmlWriter::new(version).write_tokens(&mut tokens)?;
    debug!("Emitted {} document as {} bytes of XML", version, xml.len());
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_root_document;
    use crate::token::TokenBuffer;
    use edm_model::{EntityType, Property, Schema};

    fn sample(version: ProtocolVersion) -> RootDocument {
        let mut root = RootDocument::new(version);
        let mut schema = Schema::new(version);
        schema.namespace = "Motors".to_string();
        let mut car = EntityType::new("Car");
        car.properties.push(Property::new("VIN", "Edm.String"));
        schema.entity_types.push(car);
        root.data_services.data_service_version = Some("3.0".to_string());
        root.data_services.schemas.push(schema);
        root
    }

    #[test]
    fn test_scalars_become_attributes() {
        let xml = to_xml_string(&sample(ProtocolVersion::V3)).unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<edmx:Edmx"));
        assert!(xml.contains(r#"m:DataServiceVersion="3.0""#));
        assert!(xml.contains(r#"<Property Name="VIN" Type="Edm.String"/>"#));
    }

    #[test]
    fn test_xml_round_trip() {
        for version in ProtocolVersion::ALL {
            let root = sample(version);
            let xml = to_xml_string(&root).unwrap();
            let parsed = parse_root_document(xml.as_bytes(), version).unwrap();
            assert_eq!(parsed, root, "{}", version);
        }
    }

    #[test]
    fn test_late_scalar_and_text() {
        let mut tokens = TokenBuffer::new();
        tokens.start_object();
        tokens.field("Note");
        tokens.start_object();
        tokens.field("Child");
        tokens.start_object();
        tokens.end_object();
        tokens.scalar("Late", "x < y");
        tokens.scalar("", "body");
        tokens.end_object();
        tokens.end_object();

        let xml = XmlWriter::new(ProtocolVersion::V4)
            .with_indent(0)
            .write_tokens(&mut tokens)
            .unwrap();
        assert!(xml.contains("<Note><Child/><Late>x &lt; y</Late>body</Note>"));
    }

    #[test]
    fn test_unbalanced_tokens() {
        let mut tokens = TokenBuffer::new();
        tokens.start_object();
        tokens.field("DataServices");
        tokens.start_object();
        let result = XmlWriter::new(ProtocolVersion::V3).write_tokens(&mut tokens);
        assert!(matches!(result, Err(Error::UnexpectedEnd { .. })));
    }
}
