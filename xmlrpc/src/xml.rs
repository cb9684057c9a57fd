//! Minimal owned XML element tree.
//!
//! XML-RPC documents are small, so the response is pulled through
//! `quick-xml` once and materialized as nested `Element`s that the decoder
//! can pattern-match on. Attributes, comments, processing instructions and
//! namespaces are dropped; CDATA sections are folded into the text.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DecodeError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub name: String,
    /// Concatenated character data directly inside this element.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// First child element called `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All child elements called `name`, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    pub fn first_child(&self) -> Option<&Element> {
        self.children.first()
    }
}

/// Parse `doc` into its root element.
pub fn parse(doc: &str) -> Result<Element, DecodeError> {
    let mut reader = Reader::from_str(doc);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(DecodeError::malformed(format!(
                    "invalid xml at byte {}: {e}",
                    reader.error_position()
                )))
            }
        };
        match event {
            Event::Start(tag) => stack.push(Element::new(tag_name(&tag))),
            Event::Empty(tag) => attach(&mut stack, &mut root, Element::new(tag_name(&tag)))?,
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DecodeError::malformed("closing tag without opening tag"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    let text = text
                        .unescape()
                        .map_err(|e| DecodeError::malformed(format!("bad character data: {e}")))?;
                    top.text.push_str(&text);
                }
            }
            Event::CData(data) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::malformed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }
    root.ok_or_else(|| DecodeError::malformed("document has no root element"))
}

fn tag_name(tag: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(tag.local_name().as_ref()).into_owned()
}

fn attach(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), DecodeError> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_some() => {
            return Err(DecodeError::malformed("more than one root element"));
        }
        None => *root = Some(element),
    }
    Ok(())
}
