//! XML tree building on top of `quick-xml`.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use stix_model::{Document, Element, NodeId, SourcePosition};
use tracing::{debug, info, warn};

use crate::decode::decode_document;
use crate::error::{IngestError, Result};

/// Synthetic root used by the fragment-wrapping recovery pass.
pub const WRAPPER_TAG: &str = "__WRAPPER__";

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Retry a failed parse with the content wrapped in a synthetic root.
    pub wrap_fragments: bool,
}

/// Read, decode, and parse an upload file.
pub fn read_document(path: &Path, options: &ParseOptions) -> Result<Document> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;
    let decoded = decode_document(&bytes);
    info!(
        path = %path.display(),
        encoding = decoded.encoding.name(),
        bytes = bytes.len(),
        "decoded upload"
    );
    parse_document_with(&decoded.text, options)
}

/// Parse well-formed XML text into a [`Document`].
pub fn parse_document(text: &str) -> Result<Document> {
    TreeBuilder::new(text).build()
}

/// Parse with optional fragment-wrapping recovery.
pub fn parse_document_with(text: &str, options: &ParseOptions) -> Result<Document> {
    match parse_document(text) {
        Ok(document) => Ok(document),
        Err(error) if options.wrap_fragments && error.is_fragment_error() => {
            warn!(%error, "parse failed; retrying with content wrapped in <{WRAPPER_TAG}>");
            let body = strip_declaration(text);
            let wrapped = format!("<{WRAPPER_TAG}>\n{body}\n</{WRAPPER_TAG}>");
            let document = parse_document(&wrapped).inspect_err(|retry| {
                warn!(error = %retry, "fragment wrapping did not recover the document");
            })?;
            warn!("document recovered with a <{WRAPPER_TAG}> root; inspect the output");
            Ok(document)
        }
        Err(error) => Err(error),
    }
}

fn strip_declaration(text: &str) -> &str {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with("<?xml")
        && let Some(end) = trimmed.find("?>")
    {
        return &trimmed[end + 2..];
    }
    trimmed
}

struct OpenElement {
    id: NodeId,
    /// Namespace declarations made on this element: prefix ("" = default) to URI.
    namespaces: Vec<(String, String)>,
    text: String,
    /// Sibling counters by local name, for element paths.
    child_counts: HashMap<String, usize>,
}

struct TreeBuilder<'a> {
    input: &'a str,
    document: Document,
    stack: Vec<OpenElement>,
    line: usize,
    line_offset: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            document: Document::new(),
            stack: Vec::new(),
            line: 1,
            line_offset: 0,
        }
    }

    fn build(mut self) -> Result<Document> {
        let mut reader = Reader::from_str(self.input);
        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(error) => {
                    let line = self.line_of(reader.error_position() as usize);
                    return Err(IngestError::malformed(line, error.to_string()));
                }
            };
            let offset = reader.buffer_position() as usize;
            match event {
                Event::Start(start) => {
                    self.open(&start, offset)?;
                }
                Event::Empty(start) => {
                    self.open(&start, offset)?;
                    self.close();
                }
                Event::End(_) => self.close(),
                Event::Text(text) => {
                    let text = std::str::from_utf8(&text)
                        .map_err(|e| IngestError::malformed(self.line_of(offset), e.to_string()))?;
                    self.push_text(text, offset)?;
                }
                Event::CData(data) => {
                    let data = std::str::from_utf8(&data)
                        .map_err(|e| IngestError::malformed(self.line_of(offset), e.to_string()))?;
                    self.push_text(data, offset)?;
                }
                Event::GeneralRef(reference) => {
                    let name = std::str::from_utf8(&reference)
                        .map_err(|e| IngestError::malformed(self.line_of(offset), e.to_string()))?;
                    let resolved = resolve_reference(name).ok_or_else(|| {
                        IngestError::malformed(
                            self.line_of(offset),
                            format!("unknown entity reference &{name};"),
                        )
                    })?;
                    self.push_text(&resolved, offset)?;
                }
                Event::Eof => break,
                // Declaration, comments, processing instructions, doctype.
                _ => {}
            }
        }
        if let Some(open) = self.stack.last() {
            let element = self.document.element(open.id);
            return Err(IngestError::UnclosedElement {
                name: element.name.clone(),
                line: element.position.line,
            });
        }
        if self.document.is_empty() {
            return Err(IngestError::EmptyDocument);
        }
        debug!(elements = self.document.len(), "built document tree");
        Ok(self.document)
    }

    /// 1-based line containing byte `offset`. Offsets must not go backwards
    /// between calls except for error reporting, which recounts.
    fn line_of(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.input.len());
        if offset < self.line_offset {
            self.line = 1;
            self.line_offset = 0;
        }
        self.line += self.input.as_bytes()[self.line_offset..offset]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        self.line_offset = offset;
        self.line
    }

    fn open(&mut self, start: &BytesStart<'_>, end_offset: usize) -> Result<()> {
        let tag_start = self.input[..end_offset].rfind('<').unwrap_or(0);
        let line = self.line_of(tag_start);
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| IngestError::malformed(line, e.to_string()))?
            .to_string();

        let mut attributes = Vec::new();
        let mut namespaces = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| IngestError::malformed(line, e.to_string()))?;
            let key = std::str::from_utf8(attribute.key.as_ref())
                .map_err(|e| IngestError::malformed(line, e.to_string()))?
                .to_string();
            let value = attribute
                .unescape_value()
                .map_err(|e| IngestError::malformed(line, e.to_string()))?
                .into_owned();
            if key == "xmlns" {
                namespaces.push((String::new(), value.clone()));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                namespaces.push((prefix.to_string(), value.clone()));
            }
            attributes.push((key, value));
        }

        let prefix = name.rsplit_once(':').map_or("", |(prefix, _)| prefix);
        let namespace = namespaces
            .iter()
            .find(|(declared, _)| declared == prefix)
            .map(|(_, uri)| uri.clone())
            .or_else(|| self.resolve_prefix(prefix));
        if namespace.is_none() && !prefix.is_empty() {
            return Err(IngestError::malformed(
                line,
                format!("undeclared namespace prefix '{prefix}' on <{name}>"),
            ));
        }

        let local = name.rsplit_once(':').map_or(name.as_str(), |(_, local)| local);
        let path = match self.stack.last_mut() {
            Some(parent) => {
                let count = parent.child_counts.entry(local.to_string()).or_insert(0);
                *count += 1;
                let parent_path = &self.document.element(parent.id).position.path;
                if *count > 1 {
                    format!("{parent_path}/{local}[{count}]")
                } else {
                    format!("{parent_path}/{local}")
                }
            }
            None => format!("/{local}"),
        };

        let mut element = Element::new(name.clone(), SourcePosition::new(line, path));
        element.namespace = namespace;
        element.attributes = attributes;

        let id = match self.stack.last() {
            Some(parent) => self.document.append_child(parent.id, element),
            None => {
                if self.document.root().is_some() {
                    return Err(IngestError::MultipleRoots { name, line });
                }
                self.document.set_root(element)
            }
        };
        self.stack.push(OpenElement {
            id,
            namespaces,
            text: String::new(),
            child_counts: HashMap::new(),
        });
        Ok(())
    }

    fn resolve_prefix(&self, prefix: &str) -> Option<String> {
        self.stack.iter().rev().find_map(|open| {
            open.namespaces
                .iter()
                .find(|(declared, _)| declared == prefix)
                .map(|(_, uri)| uri.clone())
        })
    }

    fn push_text(&mut self, text: &str, offset: usize) -> Result<()> {
        match self.stack.last_mut() {
            Some(open) => {
                open.text.push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(IngestError::malformed(
                self.line_of(offset),
                "text outside the root element",
            )),
        }
    }

    fn close(&mut self) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        let has_children = !self.document.children(open.id).is_empty();
        let blank = open.text.trim().is_empty();
        // Indentation between or inside elements is formatting, not content.
        let keep = !open.text.is_empty() && !(blank && (has_children || open.text.contains('\n')));
        if keep {
            self.document.set_text(open.id, open.text);
        }
    }
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse::<u32>().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    let resolved = match name {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "apos" => "'",
        "quot" => "\"",
        _ => return None,
    };
    Some(resolved.to_string())
}
