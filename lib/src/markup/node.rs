use std::fmt;
use std::borrow::Cow;

use quick_xml::escape::{escape, unescape};

/// Elements that never have content and are written without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta",
    "source", "track", "wbr",
];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(name))
}

/// A node in a markup tree. Text and attribute values are held in their
/// escaped form so parsed documents serialize back byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    /// Markup written verbatim: comments, CDATA sections, inline styles.
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    /// Written as `<name/>` when there are no children.
    pub self_closing: bool,
}

impl Node {
    /// A text node from unescaped `text`.
    pub fn text<S: AsRef<str>>(text: S) -> Node {
        Node::Text(escape(text.as_ref()).into_owned())
    }

    pub fn raw<S: Into<String>>(markup: S) -> Node {
        Node::Raw(markup.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Element {
        Element { name: name.into(), ..Element::default() }
    }

    /// Sets `name` to the unescaped `value`, replacing an existing value.
    pub fn set_attr<V: AsRef<str>>(&mut self, name: &str, value: V) {
        let value = escape(value.as_ref()).into_owned();
        match self.attrs.iter_mut().find(|a| a.name == name) {
            Some(attr) => attr.value = value,
            None => self.attrs.push(Attr { name: name.into(), value }),
        }
    }

    /// The escaped value of the attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|a| a.name == name).map(|a| a.value.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class").map_or(false, |v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn retain_attrs<F: FnMut(&Attr) -> bool>(&mut self, f: F) {
        self.attrs.retain(f);
    }

    pub fn attr_with<V: AsRef<str>>(mut self, name: &str, value: V) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn class<V: AsRef<str>>(self, class: V) -> Self {
        self.attr_with("class", class)
    }

    pub fn child<N: Into<Node>>(mut self, node: N) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn maybe_child<N: Into<Node>>(self, node: Option<N>) -> Self {
        match node {
            Some(node) => self.child(node),
            None => self,
        }
    }

    pub fn children<I>(mut self, nodes: I) -> Self
        where I: IntoIterator, I::Item: Into<Node>
    {
        self.children.extend(nodes.into_iter().map(Into::into));
        self
    }

    pub fn text<S: AsRef<str>>(self, text: S) -> Self {
        self.child(Node::text(text))
    }

    /// The first child element named `name`.
    pub fn find(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// The concatenated, unescaped text of every descendant text node.
    pub fn text_content(&self) -> String {
        fn collect(element: &Element, out: &mut String) {
            for child in &element.children {
                match child {
                    Node::Text(t) => out.push_str(&unescape(t).unwrap_or(Cow::Borrowed(t.as_str()))),
                    Node::Element(e) => collect(e, out),
                    Node::Raw(_) => {}
                }
            }
        }

        let mut out = String::new();
        collect(self, &mut out);
        out
    }

    /// Visits `self` and every descendant element, parents first.
    pub fn walk_mut<F: FnMut(&mut Element)>(&mut self, f: &mut F) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(e) = child {
                e.walk_mut(f);
            }
        }
    }

    /// Offers every descendant element to `f`, parents first. When `f`
    /// returns replacement nodes they take the element's place and are not
    /// visited themselves; otherwise the element's children are visited.
    pub fn splice<F>(&mut self, f: &mut F)
        where F: FnMut(&mut Element) -> Option<Vec<Node>>
    {
        let children = std::mem::take(&mut self.children);
        self.children.reserve(children.len());
        for child in children {
            match child {
                Node::Element(mut e) => match f(&mut e) {
                    Some(replacement) => self.children.extend(replacement),
                    None => {
                        e.splice(f);
                        self.children.push(Node::Element(e));
                    }
                },
                other => self.children.push(other),
            }
        }
    }

    /// Serializes as a standalone XML document.
    pub fn to_xml_document(&self) -> String {
        format!("<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?>\n{self}")
    }

    /// Serializes as an HTML5 document.
    pub fn to_html_document(&self) -> String {
        format!("<!DOCTYPE html>\n{self}")
    }
}

impl From<Element> for Node {
    fn from(value: Element) -> Self {
        Node::Element(value)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Element(e) => e.fmt(f),
            Node::Text(s) | Node::Raw(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for attr in &self.attrs {
            write!(f, " {}=\"{}\"", attr.name, attr.value)?;
        }

        if self.children.is_empty() && (self.self_closing || is_void(&self.name)) {
            return f.write_str("/>");
        }

        f.write_str(">")?;
        for child in &self.children {
            child.fmt(f)?;
        }

        write!(f, "</{}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_and_escapes() {
        let link = Element::new("a")
            .attr_with("href", "/x?a=1&b=2")
            .text("Tom & Jerry <3");

        assert_eq!(link.to_string(), r#"<a href="/x?a=1&amp;b=2">Tom &amp; Jerry &lt;3</a>"#);
        assert_eq!(link.text_content(), "Tom & Jerry <3");
        assert_eq!(link.attr("href"), Some("/x?a=1&amp;b=2"));
    }

    #[test]
    fn void_and_blank_elements() {
        let meta = Element::new("meta").attr_with("charset", "utf-8");
        assert_eq!(meta.to_string(), r#"<meta charset="utf-8"/>"#);

        let mut path = Element::new("path");
        path.self_closing = true;
        assert_eq!(path.to_string(), "<path/>");

        path.self_closing = false;
        assert_eq!(path.to_string(), "<path></path>");
    }

    #[test]
    fn splice_replaces_without_revisiting() {
        let mut root = Element::new("div")
            .child(Element::new("b").text("x"))
            .child(Element::new("i").child(Element::new("b").text("y")));

        let mut visits = 0;
        root.splice(&mut |e| {
            visits += 1;
            (e.name == "b").then(|| vec![Element::new("b").child(Element::new("b")).into()])
        });

        assert_eq!(visits, 3);
        assert_eq!(root.to_string(), "<div><b><b></b></b><i><b><b></b></b></i></div>");
    }
}
