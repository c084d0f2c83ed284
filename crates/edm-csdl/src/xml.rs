//! XML tokenizer for CSDL/EDMX documents
//!
//! Mapping from XML to tokens:
//! - the document element is the root object and has no field name
//! - every other element is a field named after its local name
//! - attributes are scalar fields of the element's object
//! - an element without attributes or children whose only content is text
//!   is a scalar field; whitespace-only content counts as text unless it
//!   spans a line break, which is indentation and leaves an empty object
//! - text inside an object becomes the field `""`; whitespace between
//!   elements is dropped
//!
//! Namespace prefixes are dropped and `xmlns` declarations are ignored.

use crate::token::{Token, TokenKind, TokenSource};
use crate::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::VecDeque;
use std::io::BufRead;

/// Owned form of the XML events the tokenizer cares about.
#[derive(Debug)]
enum XmlEvent {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
    },
    Empty {
        name: String,
        attributes: Vec<(String, String)>,
    },
    /// Trimmed text or CDATA content
    Text(String),
    /// Text made of whitespace only, kept as written
    Space(String),
    End,
    Eof,
}

/// Pull tokenizer over any buffered reader.
pub struct XmlTokenizer<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    pending: VecDeque<Token>,
    lookahead: Option<(XmlEvent, usize)>,
    depth: usize,
    started: bool,
    finished: bool,
}

impl<R: BufRead> XmlTokenizer<R> {
    pub fn new(source: R) -> Self {
        let mut reader = Reader::from_reader(source);
                Self {
            reader,
            buf: Vec::new(),
            pending: VecDeque::new(),
            lookahead: None,
            depth: 0,
            started: false,
            finished: false,
        }
    }

    fn emit(&mut self, kind: TokenKind, offset: usize) {
        self.pending.push_back(Token::new(kind, offset));
    }

    fn emit_attributes(&mut self, attributes: Vec<(String, String)>, offset: usize) {
        for (name, value) in attributes {
            self.emit(TokenKind::FieldName(name), offset);
            self.emit(TokenKind::Value(value), offset);
        }
    }

    fn next_event(&mut self) -> Result<(XmlEvent, usize)> {
        if let Some(event) = self.lookahead.take() {
            return Ok(event);
        }

        loop {
            let offset = self.reader.buffer_position() as usize;
            self.buf.clear();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => XmlEvent::Start {
                    name: local_name(&e),
                    attributes: attributes(&e, offset)?,
                },
                Ok(Event::Empty(e)) => XmlEvent::Empty {
                    name: local_name(&e),
                    attributes: attributes(&e, offset)?,
                },
                Ok(Event::End(_)) => XmlEvent::End,
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| Error::xml(offset, err))?;
                    if text.is_empty() {
                        continue;
                    }
                    if text.trim().is_empty() {
                        XmlEvent::Space(text.into_owned())
                    } else {
                        XmlEvent::Text(text.trim().to_string())
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = self.reader.decoder().decode(&e).map_err(|err| Error::xml(offset, err))?;
                    XmlEvent::Text(text.into_owned())
                }
                Ok(Event::Eof) => XmlEvent::Eof,
                // Declarations, comments, processing instructions, doctype
                Ok(_) => continue,
                Err(err) => {
                    let position = self.reader.error_position() as usize;
                    return Err(Error::xml(position, err));
                }
            };
            return Ok((event, offset));
        }
    }

    /// Next event that is not whitespace between elements.
    fn next_significant(&mut self) -> Result<(XmlEvent, usize)> {
        loop {
            match self.next_event()? {
                (XmlEvent::Space(_), _) => continue,
                event => return Ok(event),
            }
        }
    }

    /// Translate the next significant XML event into one or more tokens.
    fn fill(&mut self) -> Result<()> {
        let (event, offset) = self.next_significant()?;

        match event {
            XmlEvent::Start { attributes, .. } if !self.started => {
                self.started = true;
                self.depth = 1;
                self.emit(TokenKind::StartObject, offset);
                self.emit_attributes(attributes, offset);
            }
            XmlEvent::Empty { attributes, .. } if !self.started => {
                self.started = true;
                self.finished = true;
                self.emit(TokenKind::StartObject, offset);
                self.emit_attributes(attributes, offset);
                self.emit(TokenKind::EndObject, offset);
            }
            XmlEvent::Start { name, attributes } if !attributes.is_empty() => {
                self.depth += 1;
                self.emit(TokenKind::FieldName(name), offset);
                self.emit(TokenKind::StartObject, offset);
                self.emit_attributes(attributes, offset);
            }
            XmlEvent::Start { name, .. } => self.start_bare_element(name, offset)?,
            XmlEvent::Empty { name, attributes } => {
                self.emit(TokenKind::FieldName(name), offset);
                self.emit(TokenKind::StartObject, offset);
                self.emit_attributes(attributes, offset);
                self.emit(TokenKind::EndObject, offset);
            }
            XmlEvent::Text(text) => {
                if self.started {
                    self.emit(TokenKind::FieldName(String::new()), offset);
                    self.emit(TokenKind::Value(text), offset);
                }
            }
            XmlEvent::End => {
                self.emit(TokenKind::EndObject, offset);
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.finished = true;
                }
            }
            XmlEvent::Eof => self.finished = true,
            XmlEvent::Space(_) => {}
        }

        Ok(())
    }

    /// An element without attributes is a scalar when it holds only text,
    /// otherwise an object. Needs up to two events of lookahead to decide.
    fn start_bare_element(&mut self, name: String, offset: usize) -> Result<()> {
        let (mut next, mut next_offset) = self.next_event()?;
        if let XmlEvent::Space(space) = next {
            let (after, after_offset) = self.next_significant()?;
            if matches!(after, XmlEvent::End) && !space.contains(['\n', '\r']) {
                self.emit(TokenKind::FieldName(name), offset);
                self.emit(TokenKind::Value(space), next_offset);
                return Ok(());
            }
            next = after;
            next_offset = after_offset;
        }

        match next {
            XmlEvent::End => {
                self.emit(TokenKind::FieldName(name), offset);
                self.emit(TokenKind::StartObject, offset);
                self.emit(TokenKind::EndObject, next_offset);
            }
            XmlEvent::Text(text) => {
                let (after, after_offset) = self.next_significant()?;
                self.emit(TokenKind::FieldName(name), offset);
                if let XmlEvent::End = after {
                    self.emit(TokenKind::Value(text), next_offset);
                } else {
                    self.depth += 1;
                    self.emit(TokenKind::StartObject, offset);
                    self.emit(TokenKind::FieldName(String::new()), next_offset);
                    self.emit(TokenKind::Value(text), next_offset);
                    self.lookahead = Some((after, after_offset));
                }
            }
            other => {
                self.depth += 1;
                self.emit(TokenKind::FieldName(name), offset);
                self.emit(TokenKind::StartObject, offset);
                self.lookahead = Some((other, next_offset));
            }
        }
        Ok(())
    }
}

impl<R: BufRead> TokenSource for XmlTokenizer<R> {
    fn next_token(&mut self) -> Result<Option<Token>> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            if self.finished {
                return Ok(None);
            }
            self.fill()?;
        }
    }
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attributes(e: &BytesStart<'_>, offset: usize) -> Result<Vec<(String, String)>> {
    let mut result = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| Error::xml(offset, err))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::xml(offset, err))?;
        result.push((key, value.into_owned()));
    }
    Ok(result)
}
