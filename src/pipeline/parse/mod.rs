mod xml;

pub use xml::XmlMarkupParser;

use crate::error::MarkupError;

/// Turns structured text into an element tree. Implementations hold no
/// per-call state and can be shared across threads.
pub trait MarkupParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Element, MarkupError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// Element with namespace prefixes already stripped from its own name and
/// from attribute names.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Every element named `name` in document order, `self` included.
    pub fn descendants(&self, name: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            if element.name == name {
                found.push(element);
            }
            pending.extend(element.elements().rev());
        }
        found
    }

    /// First element named `name` below `self` in document order.
    pub fn find(&self, name: &str) -> Option<&Element> {
        let mut pending: Vec<&Element> = self.elements().rev().collect();
        while let Some(element) = pending.pop() {
            if element.name == name {
                return Some(element);
            }
            pending.extend(element.elements().rev());
        }
        None
    }

    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut pending: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = pending.pop() {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => pending.extend(element.children.iter().rev()),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Element {
        XmlMarkupParser
            .parse(
                r#"<gpx><trk><trkseg>
                    <trkpt lat="1" lon="2"><time>a</time></trkpt>
                    <trkpt lat="3" lon="4"><extensions><time>b</time></extensions></trkpt>
                </trkseg></trk><trkpt lat="5" lon="6"/></gpx>"#,
            )
            .expect("well-formed")
    }

    #[test]
    fn descendants_follow_document_order() {
        let root = tree();
        let lats: Vec<_> = root
            .descendants("trkpt")
            .iter()
            .filter_map(|el| el.attr("lat"))
            .collect();
        assert_eq!(lats, vec!["1", "3", "5"]);
    }

    #[test]
    fn descendants_include_self() {
        let root = tree();
        assert_eq!(root.descendants("gpx").len(), 1);
    }

    #[test]
    fn find_searches_nested_elements_only() {
        let root = tree();
        let points = root.descendants("trkpt");
        assert_eq!(points[0].find("time").map(Element::text).as_deref(), Some("a"));
        assert_eq!(points[1].find("time").map(Element::text).as_deref(), Some("b"));
        assert!(points[2].find("time").is_none());
        assert!(points[0].find("trkpt").is_none());
    }

    #[test]
    fn text_concatenates_nested_content() {
        let root = XmlMarkupParser
            .parse("<a>one<b>two</b><c><d>three</d></c></a>")
            .expect("well-formed");
        assert_eq!(root.text(), "onetwothree");
    }
}
