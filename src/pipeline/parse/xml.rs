use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::MarkupError;
use crate::pipeline::parse::{Element, MarkupParser, Node};

/// Nesting bound for open elements. GPX needs about six levels.
pub const MAX_DEPTH: usize = 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlMarkupParser;

impl MarkupParser for XmlMarkupParser {
    fn parse(&self, text: &str) -> Result<Element, MarkupError> {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);

        let mut open: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if open.len() >= MAX_DEPTH {
                        return Err(MarkupError::TooDeep(MAX_DEPTH));
                    }
                    open.push(start_element(&e)?);
                }
                Ok(Event::Empty(e)) => {
                    let element = start_element(&e)?;
                    attach(&mut open, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = open.pop().ok_or_else(|| {
                        MarkupError::InvalidXml("closing tag without a matching start".to_string())
                    })?;
                    attach(&mut open, &mut root, element)?;
                }
                Ok(Event::Text(e)) => {
                    let text = e
                        .unescape()
                        .map_err(|e| MarkupError::InvalidXml(e.to_string()))?;
                    push_text(&mut open, text.into_owned())?;
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                    push_text(&mut open, text)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(MarkupError::InvalidXml(e.to_string())),
                _ => {}
            }
        }

        if let Some(unclosed) = open.pop() {
            return Err(MarkupError::Unclosed(unclosed.name));
        }

        root.ok_or(MarkupError::Empty)
    }
}

fn start_element(start: &BytesStart) -> Result<Element, MarkupError> {
    let mut element = Element::new(utf8(start.local_name().as_ref())?);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| MarkupError::InvalidXml(e.to_string()))?;
        // namespace declarations
        if attr.key.as_ref().starts_with(b"xmlns") {
            continue;
        }
        let key = utf8(attr.key.local_name().as_ref())?;
        let value = attr
            .unescape_value()
            .map_err(|e| MarkupError::InvalidXml(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }

    Ok(element)
}

fn attach(
    open: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> Result<(), MarkupError> {
    match open.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None if root.is_none() => *root = Some(element),
        None => return Err(MarkupError::MultipleRoots),
    }
    Ok(())
}

fn push_text(open: &mut [Element], text: String) -> Result<(), MarkupError> {
    let parent = open.last_mut().ok_or(MarkupError::StrayText)?;
    parent.children.push(Node::Text(text));
    Ok(())
}

fn utf8(bytes: &[u8]) -> Result<String, MarkupError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| MarkupError::InvalidXml(e.to_string()))
}
