//! Pretty-printed UTF-8 serialization of the document tree.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::Writer;
use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use stix_model::{Document, NodeId};
use tracing::{info, info_span};

/// Write `document` with an XML declaration, two-space indentation and one
/// element per line. Elements without text or children are written empty.
pub fn write_document<W: Write>(document: &Document, writer: W) -> Result<()> {
    let root = document
        .root()
        .context("document has no root element")?;
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    write_element(&mut xml, document, root)?;
    xml.get_mut().write_all(b"\n")?;
    Ok(())
}

pub fn serialize_document(document: &Document) -> Result<String> {
    let mut buffer = Vec::new();
    write_document(document, &mut buffer)?;
    String::from_utf8(buffer).context("serialized document is not UTF-8")
}

/// Serialize to `path`, creating parent directories as needed.
pub fn write_document_file(document: &Document, path: &Path) -> Result<()> {
    let _span = info_span!("serialize", path = %path.display()).entered();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_document(document, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("write {}", path.display()))?;
    info!(elements = document.len(), "wrote cleaned document");
    Ok(())
}

fn write_element<W: Write>(xml: &mut Writer<W>, document: &Document, id: NodeId) -> Result<()> {
    let element = document.element(id);
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    let text = element.text.as_deref().filter(|text| !text.is_empty());
    let children = element.children();
    if text.is_none() && children.is_empty() {
        xml.write_event(Event::Empty(start))?;
        return Ok(());
    }

    xml.write_event(Event::Start(start))?;
    if let Some(text) = text {
        xml.write_event(Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    }
    for child in children {
        write_element(xml, document, *child)?;
    }
    xml.write_event(Event::End(BytesEnd::new(element.name.as_str())))?;
    Ok(())
}
